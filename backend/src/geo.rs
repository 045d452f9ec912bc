use crate::models::Coordinate;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters (Haversine).
pub fn distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlng = (dlng / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

pub fn path_length_m(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| distance_m(w[0], w[1])).sum()
}

/// Running distance from the first point, one entry per point.
pub fn cumulative_distances_m(path: &[Coordinate]) -> Vec<f64> {
    let mut total = 0.0;
    let mut out = Vec::with_capacity(path.len());
    for (idx, point) in path.iter().enumerate() {
        if idx > 0 {
            total += distance_m(path[idx - 1], *point);
        }
        out.push(total);
    }
    out
}

pub fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
    a.interpolate(b, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_same_point() {
        let point = Coordinate::new(15.39, 73.88);
        assert_eq!(distance_m(point, point), 0.0);
    }

    #[test]
    fn test_distance_known_value() {
        // One degree of latitude is ~111.2 km.
        let d = distance_m(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((d - 111_194.9).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_path_length_empty_and_single() {
        assert_eq!(path_length_m(&[]), 0.0);
        assert_eq!(path_length_m(&[Coordinate::new(15.0, 73.0)]), 0.0);
    }

    #[test]
    fn test_cumulative_matches_path_length() {
        let path = vec![
            Coordinate::new(15.387352, 73.875786),
            Coordinate::new(15.3918, 73.8792),
            Coordinate::new(15.392803, 73.884299),
        ];
        let cumulative = cumulative_distances_m(&path);
        assert_eq!(cumulative.len(), 3);
        assert_eq!(cumulative[0], 0.0);
        assert!((cumulative[2] - path_length_m(&path)).abs() < 1e-9);
    }

    #[test]
    fn test_midpoint_is_equidistant() {
        let a = Coordinate::new(15.387352, 73.875786);
        let b = Coordinate::new(15.392803, 73.884299);
        let mid = midpoint(a, b);
        assert!((distance_m(a, mid) - distance_m(mid, b)).abs() < 0.01);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn valid_coord() -> impl Strategy<Value = Coordinate> {
            (-90.0..=90.0, -180.0..=180.0).prop_map(|(lat, lng)| Coordinate { lat, lng })
        }

        proptest! {
            #[test]
            fn prop_distance_symmetric(a in valid_coord(), b in valid_coord()) {
                prop_assert!((distance_m(a, b) - distance_m(b, a)).abs() < 1e-6);
            }

            #[test]
            fn prop_distance_same_point_is_zero(coord in valid_coord()) {
                prop_assert_eq!(distance_m(coord, coord), 0.0);
            }

            #[test]
            fn prop_distance_bounded_by_half_circumference(a in valid_coord(), b in valid_coord()) {
                let max_distance = std::f64::consts::PI * EARTH_RADIUS_M;
                prop_assert!(distance_m(a, b) <= max_distance + 1.0);
            }

            #[test]
            fn prop_triangle_inequality(a in valid_coord(), b in valid_coord(), c in valid_coord()) {
                prop_assert!(distance_m(a, c) <= distance_m(a, b) + distance_m(b, c) + 1e-3);
            }
        }
    }
}
