use serde::Deserialize;

use crate::{
    battery::{CHARGE_TARGET, MIN_BATTERY_THRESHOLD, charging_time, remaining_battery},
    energy::{VehicleProfile, consumption, efficiency_rating, elevation_changes},
    error::PlanningError,
    geo::{cumulative_distances_m, distance_m},
    gpx_export::encode_trip_as_gpx,
    models::{
        ChargingAdvice, Coordinate, ElevationPoint, ElevationSample, RouteType, TripReport,
    },
    providers::{ElevationProvider, RouteProvider, simplify_path},
};

/// Route polylines are thinned with a stride of `len / MAX_ELEVATION_POINTS` before elevation lookup.
pub const MAX_ELEVATION_POINTS: usize = 50;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    #[serde(default = "default_battery")]
    pub battery_level: f64,
}

fn default_battery() -> f64 {
    80.0
}

/// Energy, battery and charging report for one trip.
pub async fn plan_trip(
    request: &TripRequest,
    routes: &dyn RouteProvider,
    elevation: &dyn ElevationProvider,
    profile: &VehicleProfile,
    charger_power_kw: f64,
) -> Result<TripReport, PlanningError> {
    if !(0.0..=100.0).contains(&request.battery_level) {
        return Err(PlanningError::InvalidParameter(format!(
            "battery level must be within 0-100%, got {}",
            request.battery_level
        )));
    }

    let lookup = routes.route(request.start, request.end).await;
    if !lookup.success {
        tracing::warn!(
            "routing unavailable, using straight line: {}",
            lookup.error.as_deref().unwrap_or("unknown error")
        );
    }

    let simplified = simplify_path(&lookup.coordinates, MAX_ELEVATION_POINTS);
    let samples = elevation.elevations(simplified).await;
    let elevation_profile = chart_profile(&samples);
    let (gain, loss) = elevation_changes(&elevation_profile);

    let distance = lookup
        .distance
        .unwrap_or_else(|| distance_m(request.start, request.end));

    let energy = consumption(distance, gain, loss, profile);
    let battery_after = remaining_battery(
        request.battery_level,
        energy.total_energy,
        profile.battery_capacity_kwh,
    );
    let efficiency = efficiency_rating(gain, distance);

    let charging = if battery_after < MIN_BATTERY_THRESHOLD && request.battery_level < CHARGE_TARGET
    {
        let time = charging_time(
            request.battery_level,
            CHARGE_TARGET,
            charger_power_kw,
            profile.battery_capacity_kwh,
        )?;
        Some(ChargingAdvice {
            current_battery: request.battery_level,
            target_battery: CHARGE_TARGET,
            time,
            reason: format!(
                "Battery will drop to {battery_after:.1}% after this trip (below {MIN_BATTERY_THRESHOLD:.0}% threshold)"
            ),
        })
    } else {
        None
    };

    let gpx_base64 = encode_trip_as_gpx(&samples).unwrap_or_else(|err| {
        tracing::warn!("GPX export failed: {err}");
        String::new()
    });

    tracing::info!(
        "trip {:.0} m, +{:.0}/-{:.0} m, {:.3} kWh, battery {:.1}% -> {:.1}%",
        distance,
        gain,
        loss,
        energy.total_energy,
        request.battery_level,
        battery_after
    );

    Ok(TripReport {
        distance,
        energy,
        elevation_gain: gain,
        elevation_loss: loss,
        efficiency,
        battery_before: request.battery_level,
        battery_after,
        charging,
        route_type: if lookup.success {
            RouteType::Road
        } else {
            RouteType::Straight
        },
        path: samples,
        elevation_profile,
        gpx_base64,
        warning: lookup.error,
    })
}

/// Elevation samples laid out by distance (km) along the route.
pub fn chart_profile(samples: &[ElevationSample]) -> Vec<ElevationPoint> {
    let coords: Vec<Coordinate> = samples.iter().map(|s| Coordinate::new(s.lat, s.lng)).collect();
    cumulative_distances_m(&coords)
        .into_iter()
        .zip(samples)
        .map(|(d, s)| ElevationPoint {
            distance: d / 1000.0,
            elevation: s.elevation,
            lat: s.lat,
            lng: s.lng,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RouteLookup;
    use crate::providers::{BoxFuture, FlatTerrain, StraightLine};

    /// Road of three points with a known length and a 20 m climb then 10 m drop.
    struct FixedRoad;

    impl RouteProvider for FixedRoad {
        fn route(&self, start: Coordinate, end: Coordinate) -> BoxFuture<'_, RouteLookup> {
            Box::pin(async move {
                RouteLookup {
                    coordinates: vec![start, start.interpolate(end, 0.5), end],
                    distance: Some(2000.0),
                    duration: Some(180.0),
                    success: true,
                    error: None,
                }
            })
        }
    }

    struct Hill;

    impl ElevationProvider for Hill {
        fn elevations(&self, coords: Vec<Coordinate>) -> BoxFuture<'_, Vec<ElevationSample>> {
            let heights = [100.0, 120.0, 110.0];
            let samples = coords
                .iter()
                .zip(heights.iter().cycle())
                .map(|(c, &h)| ElevationSample {
                    lat: c.lat,
                    lng: c.lng,
                    elevation: h,
                    estimated: false,
                })
                .collect();
            Box::pin(async move { samples })
        }
    }

    fn request(battery_level: f64) -> TripRequest {
        TripRequest {
            start: Coordinate::new(15.387352, 73.875786),
            end: Coordinate::new(15.392803, 73.884299),
            battery_level,
        }
    }

    #[tokio::test]
    async fn road_trip_uses_provider_distance_and_elevation() {
        let report = plan_trip(&request(80.0), &FixedRoad, &Hill, &VehicleProfile::default(), 7.4)
            .await
            .unwrap();

        assert_eq!(report.route_type, RouteType::Road);
        assert_eq!(report.distance, 2000.0);
        assert_eq!(report.elevation_gain, 20.0);
        assert_eq!(report.elevation_loss, 10.0);
        assert!((report.energy.uphill_energy - 0.0981).abs() < 1e-4);
        assert!(report.battery_after < 80.0);
        assert!(report.charging.is_none());
        assert_eq!(report.elevation_profile.len(), 3);
        assert!(!report.gpx_base64.is_empty());
        assert!(report.warning.is_none());
    }

    #[tokio::test]
    async fn low_battery_trip_recommends_charging() {
        let report = plan_trip(&request(20.0), &FixedRoad, &Hill, &VehicleProfile::default(), 7.4)
            .await
            .unwrap();

        let advice = report.charging.expect("charging advice");
        assert_eq!(advice.target_battery, 80.0);
        assert!((advice.time.energy_needed - 36.0).abs() < 1e-9);
        assert!(advice.reason.contains("below 20% threshold"));
    }

    #[tokio::test]
    async fn offline_trip_falls_back_to_straight_line() {
        let req = request(60.0);
        let report = plan_trip(&req, &StraightLine, &FlatTerrain, &VehicleProfile::default(), 7.4)
            .await
            .unwrap();

        assert_eq!(report.route_type, RouteType::Straight);
        assert!((report.distance - distance_m(req.start, req.end)).abs() < 1e-9);
        assert_eq!(report.elevation_gain, 0.0);
        assert!(report.path.iter().all(|s| s.estimated));
        assert!(report.warning.is_some());
    }

    #[tokio::test]
    async fn rejects_out_of_range_battery() {
        let err = plan_trip(&request(140.0), &StraightLine, &FlatTerrain, &VehicleProfile::default(), 7.4)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanningError::InvalidParameter(_)));
    }

    #[test]
    fn chart_profile_accumulates_kilometres() {
        let samples = vec![
            ElevationSample { lat: 0.0, lng: 0.0, elevation: 10.0, estimated: false },
            ElevationSample { lat: 0.01, lng: 0.0, elevation: 12.0, estimated: false },
        ];
        let profile = chart_profile(&samples);
        assert_eq!(profile[0].distance, 0.0);
        assert!((profile[1].distance - 1.112).abs() < 0.01);
        assert_eq!(profile[1].elevation, 12.0);
    }
}
