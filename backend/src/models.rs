use serde::{Deserialize, Serialize};

pub use shared::*;

use crate::energy::VehicleProfile;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyRequest {
    /// Meters.
    pub distance: f64,
    #[serde(default)]
    pub elevation_gain: f64,
    #[serde(default)]
    pub elevation_loss: f64,
    #[serde(default)]
    pub profile: Option<VehicleProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingBatteryRequest {
    pub current_battery: f64,
    pub energy_consumed: f64,
    #[serde(default)]
    pub capacity: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingBatteryResponse {
    pub remaining_battery: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingTimeRequest {
    pub current_battery: f64,
    pub target_battery: f64,
    #[serde(default)]
    pub charger_power: Option<f64>,
    #[serde(default)]
    pub capacity: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingIntervalsRequest {
    /// kWh per trip, in driving order.
    pub trips: Vec<f64>,
    pub initial_battery: f64,
    #[serde(default)]
    pub charger_power: Option<f64>,
    #[serde(default)]
    pub capacity: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub routes: Vec<Route>,
    #[serde(default)]
    pub existing_stations: Vec<Coordinate>,
    #[serde(default)]
    pub include_midpoints: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiOptimizeRequest {
    pub routes: Vec<Route>,
    pub num_stations: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub include_midpoints: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRequest {
    pub location: Coordinate,
    pub routes: Vec<Route>,
    #[serde(default)]
    pub existing_stations: Vec<Coordinate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub scenarios: Vec<PlacementScenario>,
    pub routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    pub existing: Location,
    pub routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpxExportRequest {
    pub path: Vec<Coordinate>,
    #[serde(default)]
    pub stations: Vec<OptimalLocationResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpxExportResponse {
    pub gpx_base64: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
