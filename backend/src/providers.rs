//! Route and elevation lookups consumed by the trip planner.
//!
//! Both traits follow the same contract as [`crate::snapping::RoadSnapper`]:
//! lookups never fail. A routing failure degrades to a straight line with
//! `success: false`; an elevation failure degrades to
//! [`DEFAULT_ELEVATION_M`] with `estimated: true`.

use std::{future::Future, pin::Pin};

use serde::Deserialize;

use crate::{
    error::ProviderError,
    models::{Coordinate, ElevationSample, RouteLookup},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Campus ground level used when no elevation lookup succeeds.
pub const DEFAULT_ELEVATION_M: f64 = 185.0;
/// Open-Elevation accepts at most this many locations per request.
const ELEVATION_BATCH_SIZE: usize = 100;

pub trait RouteProvider: Send + Sync {
    fn route(&self, start: Coordinate, end: Coordinate) -> BoxFuture<'_, RouteLookup>;
}

pub trait ElevationProvider: Send + Sync {
    fn elevations(&self, coords: Vec<Coordinate>) -> BoxFuture<'_, Vec<ElevationSample>>;
}

pub fn straight_line(start: Coordinate, end: Coordinate) -> RouteLookup {
    RouteLookup {
        coordinates: vec![start, end],
        distance: None,
        duration: None,
        success: false,
        error: Some("Failed to fetch route. Using straight line.".to_string()),
    }
}

fn estimated(coords: &[Coordinate]) -> Vec<ElevationSample> {
    coords
        .iter()
        .map(|c| ElevationSample {
            lat: c.lat,
            lng: c.lng,
            elevation: DEFAULT_ELEVATION_M,
            estimated: true,
        })
        .collect()
}

/// Keeps every `len / max_points`-th point, always ending on the last one.
///
/// The stride is floored, so paths shorter than `2 * max_points` come back whole.
pub fn simplify_path(coords: &[Coordinate], max_points: usize) -> Vec<Coordinate> {
    if coords.len() <= max_points || max_points == 0 {
        return coords.to_vec();
    }

    let step = coords.len() / max_points;
    let mut simplified: Vec<Coordinate> = coords.iter().step_by(step).copied().collect();
    if let Some(&last) = coords.last() {
        if simplified.last() != Some(&last) {
            simplified.push(last);
        }
    }
    simplified
}

/// Route provider that never reaches a road service.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLine;

impl RouteProvider for StraightLine {
    fn route(&self, start: Coordinate, end: Coordinate) -> BoxFuture<'_, RouteLookup> {
        Box::pin(async move { straight_line(start, end) })
    }
}

/// Elevation provider that reports every point at a fixed estimated height.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain;

impl ElevationProvider for FlatTerrain {
    fn elevations(&self, coords: Vec<Coordinate>) -> BoxFuture<'_, Vec<ElevationSample>> {
        Box::pin(async move { estimated(&coords) })
    }
}

/// OSRM `route` service client.
#[derive(Clone)]
pub struct OsrmRouter {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON `[lng, lat]` pairs.
    coordinates: Vec<[f64; 2]>,
}

impl OsrmRouter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, start: Coordinate, end: Coordinate) -> Result<RouteLookup, ProviderError> {
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, start.lng, start.lat, end.lng, end.lat
        );
        let response: OsrmRouteResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let route = response
            .routes
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        Ok(RouteLookup {
            coordinates: route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lng, lat]| Coordinate::new(lat, lng))
                .collect(),
            distance: Some(route.distance),
            duration: Some(route.duration),
            success: true,
            error: None,
        })
    }
}

impl RouteProvider for OsrmRouter {
    fn route(&self, start: Coordinate, end: Coordinate) -> BoxFuture<'_, RouteLookup> {
        Box::pin(async move {
            match self.fetch(start, end).await {
                Ok(lookup) => lookup,
                Err(err) => {
                    tracing::warn!("route lookup failed: {err}");
                    straight_line(start, end)
                }
            }
        })
    }
}

/// Open-Elevation `lookup` client.
#[derive(Clone)]
pub struct OpenElevation {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    results: Vec<ElevationResult>,
}

#[derive(Debug, Deserialize)]
struct ElevationResult {
    elevation: f64,
}

impl OpenElevation {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn fetch_batch(&self, batch: &[Coordinate]) -> Result<Vec<ElevationSample>, ProviderError> {
        let locations = batch
            .iter()
            .map(|c| format!("{},{}", c.lat, c.lng))
            .collect::<Vec<_>>()
            .join("|");
        let response: ElevationResponse = self
            .client
            .get(&self.url)
            .query(&[("locations", locations)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.results.len() != batch.len() {
            return Err(ProviderError::CountMismatch {
                expected: batch.len(),
                actual: response.results.len(),
            });
        }

        Ok(batch
            .iter()
            .zip(response.results)
            .map(|(c, r)| ElevationSample {
                lat: c.lat,
                lng: c.lng,
                elevation: r.elevation,
                estimated: false,
            })
            .collect())
    }
}

impl ElevationProvider for OpenElevation {
    fn elevations(&self, coords: Vec<Coordinate>) -> BoxFuture<'_, Vec<ElevationSample>> {
        Box::pin(async move {
            let mut samples = Vec::with_capacity(coords.len());
            for batch in coords.chunks(ELEVATION_BATCH_SIZE) {
                match self.fetch_batch(batch).await {
                    Ok(found) => samples.extend(found),
                    Err(err) => {
                        tracing::warn!("elevation batch of {} failed: {err}", batch.len());
                        samples.extend(estimated(batch));
                    }
                }
            }
            samples
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<Coordinate> {
        (0..n)
            .map(|i| Coordinate::new(15.38 + i as f64 * 1e-4, 73.87))
            .collect()
    }

    #[test]
    fn simplify_keeps_short_paths() {
        let path = line(10);
        assert_eq!(simplify_path(&path, 50), path);
    }

    #[test]
    fn simplify_strides_and_keeps_last() {
        let path = line(230);
        let simplified = simplify_path(&path, 50);
        // stride 4 -> 58 points, plus the final point
        assert_eq!(simplified[0], path[0]);
        assert_eq!(simplified.last(), path.last());
        assert!(simplified.len() < path.len());
        assert_eq!(simplified.len(), 59);
    }

    #[test]
    fn simplify_stride_floors_below_twice_the_target() {
        let path = line(99);
        assert_eq!(simplify_path(&path, 50), path);

        let simplified = simplify_path(&line(100), 50);
        assert_eq!(simplified.len(), 51);
    }

    #[test]
    fn straight_line_reports_failure() {
        let a = Coordinate::new(15.38, 73.87);
        let b = Coordinate::new(15.39, 73.88);
        let lookup = straight_line(a, b);
        assert!(!lookup.success);
        assert_eq!(lookup.coordinates, vec![a, b]);
        assert!(lookup.distance.is_none());
    }

    #[tokio::test]
    async fn unreachable_services_fall_back() {
        let client = reqwest::Client::new();
        let router = OsrmRouter::new(client.clone(), "http://127.0.0.1:9");
        let a = Coordinate::new(15.38, 73.87);
        let b = Coordinate::new(15.39, 73.88);
        assert!(!router.route(a, b).await.success);

        let elevation = OpenElevation::new(client, "http://127.0.0.1:9/api/v1/lookup");
        let samples = elevation.elevations(line(150)).await;
        assert_eq!(samples.len(), 150);
        assert!(samples.iter().all(|s| s.estimated && s.elevation == DEFAULT_ELEVATION_M));
    }

    #[test]
    fn parses_osrm_route_payload() {
        let body = r#"{"code":"Ok","routes":[{"geometry":{"type":"LineString","coordinates":[[73.87,15.38],[73.88,15.39]]},"distance":1520.4,"duration":180.2}]}"#;
        let parsed: OsrmRouteResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.routes[0].geometry.coordinates.len(), 2);
        assert_eq!(parsed.routes[0].distance, 1520.4);
    }
}
