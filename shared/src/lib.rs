use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }
}

/// A campus point of interest or a charging station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub elevation: f64,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Location {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// A recurring trip between two locations; `frequency` is trips per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub start: Location,
    pub end: Location,
    #[serde(default = "default_frequency")]
    pub frequency: f64,
    #[serde(default)]
    pub name: String,
}

impl Route {
    /// Demand weight of the route. Missing or non-positive frequencies count as one trip.
    pub fn weight(&self) -> f64 {
        if self.frequency > 0.0 {
            self.frequency
        } else {
            default_frequency()
        }
    }

    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("{} to {}", self.start.name, self.end.name)
        } else {
            self.name.clone()
        }
    }
}

pub fn default_frequency() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Start,
    End,
    Midpoint,
}

/// Demand sample derived from a route, weighted by trip frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedPoint {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
    #[serde(rename = "type")]
    pub kind: PointKind,
    pub route_id: String,
}

impl WeightedPoint {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Energy use of one trip. Energies are kWh, `estimated_time` is minutes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyBreakdown {
    pub total_energy: f64,
    pub rolling_resistance: f64,
    pub air_resistance: f64,
    pub uphill_energy: f64,
    pub regenerated_energy: f64,
    pub distance_km: f64,
    pub estimated_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingPlan {
    pub hours: u32,
    pub minutes: u32,
    pub total_minutes: u32,
    pub energy_needed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingInterval {
    pub before_trip: usize,
    pub current_battery: f64,
    pub charge_to: f64,
    pub charging_time: ChargingPlan,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSchedule {
    pub intervals: Vec<ChargingInterval>,
    pub final_battery: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRating {
    pub rating: String,
    pub color: String,
    pub efficiency: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetric {
    pub route_id: String,
    pub route_name: String,
    pub distance_to_station: f64,
    pub frequency: f64,
    pub weighted_distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMetrics {
    pub route_metrics: Vec<RouteMetric>,
    pub average_distance: f64,
    pub max_distance: f64,
    pub coverage_percentage: f64,
    pub total_daily_trips: f64,
    pub improvement_vs_existing: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimalLocationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub original_lat: f64,
    pub original_lng: f64,
    pub snapped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_name: Option<String>,
    pub metrics: LocationMetrics,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_routes: Option<Vec<String>>,
}

impl OptimalLocationResult {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Outcome of moving a free coordinate onto the road network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    pub lat: f64,
    pub lng: f64,
    pub snapped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SnapResult {
    pub fn unsnapped(at: Coordinate) -> Self {
        Self {
            lat: at.lat,
            lng: at.lng,
            snapped: false,
            distance: None,
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationSample {
    pub lat: f64,
    pub lng: f64,
    pub elevation: f64,
    #[serde(default)]
    pub estimated: bool,
}

/// Chart-ready elevation point; `distance` is km along the route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationPoint {
    pub distance: f64,
    pub elevation: f64,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLookup {
    pub coordinates: Vec<Coordinate>,
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementScenario {
    pub name: String,
    pub location: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedScenario {
    pub name: String,
    pub location: Coordinate,
    pub metrics: LocationMetrics,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationImprovement {
    pub current_metrics: LocationMetrics,
    pub optimal_location: OptimalLocationResult,
    pub improvement_distance: f64,
    pub should_relocate: bool,
    pub average_distance_improvement: f64,
    pub coverage_improvement: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Road,
    Straight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingAdvice {
    pub current_battery: f64,
    pub target_battery: f64,
    pub time: ChargingPlan,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripReport {
    /// Meters.
    pub distance: f64,
    pub energy: EnergyBreakdown,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
    pub efficiency: EfficiencyRating,
    pub battery_before: f64,
    pub battery_after: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging: Option<ChargingAdvice>,
    pub route_type: RouteType,
    pub path: Vec<ElevationSample>,
    pub elevation_profile: Vec<ElevationPoint>,
    pub gpx_base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
