use crate::geo::midpoint;
use crate::models::{Coordinate, PointKind, Route, WeightedPoint};

/// Weight of a route midpoint relative to its endpoints.
pub const MIDPOINT_WEIGHT_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemandOptions {
    /// Add a half-weight sample at each route's midpoint.
    pub include_midpoints: bool,
}

impl DemandOptions {
    /// Single-station siting samples start, end and midpoint.
    pub const SINGLE_STATION: Self = Self {
        include_midpoints: true,
    };
    /// Multi-station clustering samples endpoints only.
    pub const MULTI_STATION: Self = Self {
        include_midpoints: false,
    };
}

impl Default for DemandOptions {
    fn default() -> Self {
        Self::SINGLE_STATION
    }
}

pub fn demand_points(routes: &[Route], options: DemandOptions) -> Vec<WeightedPoint> {
    let per_route = if options.include_midpoints { 3 } else { 2 };
    let mut points = Vec::with_capacity(routes.len() * per_route);

    for route in routes {
        let weight = route.weight();
        let start = route.start.coordinate();
        let end = route.end.coordinate();

        points.push(point(start, weight, PointKind::Start, &route.id));
        points.push(point(end, weight, PointKind::End, &route.id));
        if options.include_midpoints {
            points.push(point(
                midpoint(start, end),
                weight * MIDPOINT_WEIGHT_FACTOR,
                PointKind::Midpoint,
                &route.id,
            ));
        }
    }

    points
}

/// Frequency-weighted mean of the points, or `None` when the total weight is zero.
pub fn weighted_centroid<'a, I>(points: I) -> Option<Coordinate>
where
    I: IntoIterator<Item = &'a WeightedPoint>,
{
    let (lat_sum, lng_sum, total) = points.into_iter().fold(
        (0.0, 0.0, 0.0),
        |(lat_sum, lng_sum, total), p| {
            (
                lat_sum + p.lat * p.weight,
                lng_sum + p.lng * p.weight,
                total + p.weight,
            )
        },
    );

    if total > 0.0 {
        Some(Coordinate::new(lat_sum / total, lng_sum / total))
    } else {
        None
    }
}

fn point(at: Coordinate, weight: f64, kind: PointKind, route_id: &str) -> WeightedPoint {
    WeightedPoint {
        lat: at.lat,
        lng: at.lng,
        weight,
        kind,
        route_id: route_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;

    fn route(id: &str, start: (f64, f64), end: (f64, f64), frequency: f64) -> Route {
        let loc = |suffix: &str, (lat, lng): (f64, f64)| Location {
            id: format!("{id}-{suffix}"),
            name: suffix.to_string(),
            lat,
            lng,
            elevation: 0.0,
            kind: None,
        };
        Route {
            id: id.into(),
            start: loc("start", start),
            end: loc("end", end),
            frequency,
            name: String::new(),
        }
    }

    #[test]
    fn midpoints_are_half_weight() {
        let routes = vec![route("r1", (0.0, 0.0), (2.0, 4.0), 10.0)];
        let points = demand_points(&routes, DemandOptions::SINGLE_STATION);

        assert_eq!(points.len(), 3);
        assert_eq!(points[2].kind, PointKind::Midpoint);
        assert_eq!(points[2].weight, 5.0);
        assert_eq!((points[2].lat, points[2].lng), (1.0, 2.0));
        assert!(points.iter().all(|p| p.route_id == "r1"));
    }

    #[test]
    fn endpoints_only_for_multi_station() {
        let routes = vec![
            route("r1", (0.0, 0.0), (1.0, 1.0), 1.0),
            route("r2", (2.0, 2.0), (3.0, 3.0), 4.0),
        ];
        let points = demand_points(&routes, DemandOptions::MULTI_STATION);
        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|p| p.kind != PointKind::Midpoint));
    }

    #[test]
    fn equal_weights_give_arithmetic_mean() {
        let routes = vec![
            route("r1", (15.387, 73.875), (15.391, 73.879), 3.0),
            route("r2", (15.392, 73.884), (15.390, 73.880), 3.0),
        ];
        let points = demand_points(&routes, DemandOptions::MULTI_STATION);
        let centroid = weighted_centroid(&points).unwrap();

        let n = points.len() as f64;
        let mean_lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
        let mean_lng = points.iter().map(|p| p.lng).sum::<f64>() / n;
        assert!((centroid.lat - mean_lat).abs() < 1e-12);
        assert!((centroid.lng - mean_lng).abs() < 1e-12);
    }

    #[test]
    fn heavier_route_pulls_centroid() {
        let routes = vec![
            route("busy", (0.0, 0.0), (0.0, 0.0), 9.0),
            route("quiet", (1.0, 1.0), (1.0, 1.0), 1.0),
        ];
        let centroid = weighted_centroid(&demand_points(&routes, DemandOptions::default())).unwrap();
        assert!((centroid.lat - 0.1).abs() < 1e-12);
    }

    #[test]
    fn centroid_of_nothing_is_none() {
        assert_eq!(weighted_centroid(&Vec::<WeightedPoint>::new()), None);
    }
}
