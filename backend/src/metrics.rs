use crate::geo::distance_m;
use crate::models::{Coordinate, LocationMetrics, Route, RouteMetric};

/// A route is covered when one of its endpoints is within this distance of the station.
pub const ACCEPTABLE_DISTANCE_M: f64 = 500.0;

/// Access metrics of a (candidate or existing) station against a set of routes.
///
/// Each route is served from whichever endpoint is closer to the station.
/// With `existing_stations`, the result also reports the relative reduction
/// of average distance against the best existing station.
pub fn evaluate(
    location: Coordinate,
    routes: &[Route],
    existing_stations: &[Coordinate],
) -> LocationMetrics {
    evaluate_with_threshold(location, routes, existing_stations, ACCEPTABLE_DISTANCE_M)
}

pub fn evaluate_with_threshold(
    location: Coordinate,
    routes: &[Route],
    existing_stations: &[Coordinate],
    acceptable_distance_m: f64,
) -> LocationMetrics {
    let route_metrics: Vec<RouteMetric> = routes.iter().map(|r| route_metric(location, r)).collect();

    let total_frequency: f64 = route_metrics.iter().map(|m| m.frequency).sum();
    let total_weighted: f64 = route_metrics.iter().map(|m| m.weighted_distance).sum();
    let average_distance = if total_frequency > 0.0 {
        total_weighted / total_frequency
    } else {
        0.0
    };
    let max_distance = route_metrics
        .iter()
        .map(|m| m.distance_to_station)
        .fold(0.0, f64::max);
    let covered = route_metrics
        .iter()
        .filter(|m| m.distance_to_station <= acceptable_distance_m)
        .count();
    let coverage_percentage = if route_metrics.is_empty() {
        0.0
    } else {
        covered as f64 / route_metrics.len() as f64 * 100.0
    };

    let improvement_vs_existing = if existing_stations.is_empty() {
        None
    } else {
        let best_existing = existing_stations
            .iter()
            .map(|s| evaluate_with_threshold(*s, routes, &[], acceptable_distance_m).average_distance)
            .fold(f64::INFINITY, f64::min);
        if best_existing > 0.0 && best_existing.is_finite() {
            Some((best_existing - average_distance) / best_existing * 100.0)
        } else {
            None
        }
    };

    LocationMetrics {
        route_metrics,
        average_distance,
        max_distance,
        coverage_percentage,
        total_daily_trips: total_frequency,
        improvement_vs_existing,
    }
}

fn route_metric(location: Coordinate, route: &Route) -> RouteMetric {
    let frequency = route.weight();
    let from_start = distance_m(route.start.coordinate(), location);
    let from_end = distance_m(route.end.coordinate(), location);
    let distance = from_start.min(from_end);

    RouteMetric {
        route_id: route.id.clone(),
        route_name: route.display_name(),
        distance_to_station: distance,
        frequency,
        weighted_distance: distance * frequency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::midpoint;
    use crate::models::Location;

    fn location(id: &str, lat: f64, lng: f64) -> Location {
        Location {
            id: id.into(),
            name: id.into(),
            lat,
            lng,
            elevation: 0.0,
            kind: None,
        }
    }

    fn route(id: &str, a: Coordinate, b: Coordinate, frequency: f64) -> Route {
        Route {
            id: id.into(),
            start: location("a", a.lat, a.lng),
            end: location("b", b.lat, b.lng),
            frequency,
            name: String::new(),
        }
    }

    #[test]
    fn station_at_midpoint_of_short_route() {
        let a = Coordinate::new(15.3900, 73.8790);
        let b = Coordinate::new(15.3920, 73.8800);
        let routes = vec![route("r1", a, b, 10.0)];
        let mid = midpoint(a, b);

        let metrics = evaluate(mid, &routes, &[]);
        let half = distance_m(a, b) / 2.0;
        assert!((metrics.average_distance - half).abs() < 0.5, "{metrics:?}");
        assert!(half <= ACCEPTABLE_DISTANCE_M);
        assert_eq!(metrics.coverage_percentage, 100.0);
        assert_eq!(metrics.total_daily_trips, 10.0);
        assert_eq!(metrics.improvement_vs_existing, None);
    }

    #[test]
    fn station_at_midpoint_of_long_route_is_uncovered() {
        let a = Coordinate::new(15.380, 73.870);
        let b = Coordinate::new(15.400, 73.890);
        let routes = vec![route("r1", a, b, 10.0)];

        let metrics = evaluate(midpoint(a, b), &routes, &[]);
        assert!(distance_m(a, b) / 2.0 > ACCEPTABLE_DISTANCE_M);
        assert_eq!(metrics.coverage_percentage, 0.0);
    }

    #[test]
    fn average_is_frequency_weighted_and_max_is_not() {
        let station = Coordinate::new(15.39, 73.88);
        let near = Coordinate::new(15.3901, 73.88);
        let far = Coordinate::new(15.40, 73.88);
        let routes = vec![
            route("near", near, near, 9.0),
            route("far", far, far, 1.0),
        ];

        let metrics = evaluate(station, &routes, &[]);
        let d_near = distance_m(near, station);
        let d_far = distance_m(far, station);
        let expected = (9.0 * d_near + d_far) / 10.0;
        assert!((metrics.average_distance - expected).abs() < 1e-6);
        assert!((metrics.max_distance - d_far).abs() < 1e-9);
        assert_eq!(metrics.coverage_percentage, 50.0);
        assert_eq!(metrics.route_metrics[0].route_name, "a to b");
    }

    #[test]
    fn improvement_against_existing_station() {
        let a = Coordinate::new(15.3900, 73.8790);
        let b = Coordinate::new(15.3920, 73.8800);
        let routes = vec![route("r1", a, b, 2.0)];
        let existing = Coordinate::new(15.3950, 73.8850);

        let metrics = evaluate(a, &routes, &[existing]);
        assert_eq!(metrics.average_distance, 0.0);
        assert_eq!(metrics.improvement_vs_existing, Some(100.0));
    }

    #[test]
    fn empty_routes_do_not_divide_by_zero() {
        let metrics = evaluate(Coordinate::new(15.39, 73.88), &[], &[Coordinate::new(15.0, 73.0)]);
        assert_eq!(metrics.average_distance, 0.0);
        assert_eq!(metrics.max_distance, 0.0);
        assert_eq!(metrics.coverage_percentage, 0.0);
        assert_eq!(metrics.improvement_vs_existing, None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn campus_coord() -> impl Strategy<Value = Coordinate> {
            (15.38..15.40f64, 73.87..73.89f64).prop_map(|(lat, lng)| Coordinate { lat, lng })
        }

        proptest! {
            #[test]
            fn prop_coverage_within_bounds(
                station in campus_coord(),
                ends in prop::collection::vec((campus_coord(), campus_coord(), 0.0..20.0f64), 0..12),
            ) {
                let routes: Vec<Route> = ends
                    .into_iter()
                    .enumerate()
                    .map(|(i, (a, b, f))| route(&format!("r{i}"), a, b, f))
                    .collect();
                let metrics = evaluate(station, &routes, &[]);
                prop_assert!(metrics.coverage_percentage >= 0.0);
                prop_assert!(metrics.coverage_percentage <= 100.0);
                prop_assert!(metrics.average_distance >= 0.0);
                prop_assert!(metrics.average_distance <= metrics.max_distance + 1e-9);
            }
        }
    }
}
