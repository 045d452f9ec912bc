use serde::Deserialize;

use crate::{
    error::ProviderError,
    models::{Coordinate, SnapResult},
    providers::BoxFuture,
};

pub const DEFAULT_SNAP_RADIUS_M: f64 = 1_000.0;
const UNNAMED_ROAD: &str = "Unnamed road";

/// Moves a free coordinate onto the nearest drivable point.
///
/// # Contract
/// Implementations never fail: network errors, empty answers and candidates
/// further than `max_radius_m` all yield `snapped: false` at the original
/// coordinate. `distance` and `name` are only set when `snapped` is true.
pub trait RoadSnapper: Send + Sync {
    fn snap(&self, target: Coordinate, max_radius_m: f64) -> BoxFuture<'_, SnapResult>;
}

/// Snapper for callers that want raw solver output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSnapping;

impl RoadSnapper for NoSnapping {
    fn snap(&self, target: Coordinate, _max_radius_m: f64) -> BoxFuture<'_, SnapResult> {
        Box::pin(async move { SnapResult::unsnapped(target) })
    }
}

/// Applies the radius rule to a candidate road point.
pub fn accept_within_radius(
    target: Coordinate,
    candidate: Coordinate,
    distance: f64,
    name: Option<String>,
    max_radius_m: f64,
) -> SnapResult {
    if !(distance <= max_radius_m) {
        tracing::warn!("snapped location too far ({distance:.0} m), using original");
        return SnapResult::unsnapped(target);
    }

    SnapResult {
        lat: candidate.lat,
        lng: candidate.lng,
        snapped: true,
        distance: Some(distance),
        name: Some(
            name.filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNNAMED_ROAD.to_string()),
        ),
    }
}

/// OSRM `nearest` service client.
#[derive(Clone)]
pub struct OsrmSnapper {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NearestResponse {
    #[serde(default)]
    waypoints: Vec<NearestWaypoint>,
}

#[derive(Debug, Deserialize)]
struct NearestWaypoint {
    /// `[lng, lat]`
    location: [f64; 2],
    distance: f64,
    #[serde(default)]
    name: Option<String>,
}

impl OsrmSnapper {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn nearest(&self, target: Coordinate) -> Result<Option<NearestWaypoint>, ProviderError> {
        let url = format!(
            "{}/nearest/v1/driving/{},{}?number=1",
            self.base_url, target.lng, target.lat
        );
        let response: NearestResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.waypoints.into_iter().next())
    }
}

impl RoadSnapper for OsrmSnapper {
    fn snap(&self, target: Coordinate, max_radius_m: f64) -> BoxFuture<'_, SnapResult> {
        Box::pin(async move {
            match self.nearest(target).await {
                Ok(Some(waypoint)) => accept_within_radius(
                    target,
                    Coordinate::new(waypoint.location[1], waypoint.location[0]),
                    waypoint.distance,
                    waypoint.name,
                    max_radius_m,
                ),
                Ok(None) => SnapResult::unsnapped(target),
                Err(err) => {
                    tracing::warn!("road snapping failed: {err}");
                    SnapResult::unsnapped(target)
                }
            }
        })
    }
}
