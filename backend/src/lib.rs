pub mod battery;
pub mod campus;
pub mod config;
pub mod demand;
pub mod energy;
pub mod error;
pub mod geo;
pub mod gpx_export;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod network;
pub mod optimizer;
pub mod providers;
pub mod scoring;
pub mod snapping;
pub mod trip;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::campus::Campus;
use crate::config::Config;
use crate::energy::VehicleProfile;
use crate::error::StartupError;
use crate::network::RoadNetwork;
use crate::providers::{ElevationProvider, FlatTerrain, OpenElevation, OsrmRouter, RouteProvider, StraightLine};
use crate::snapping::{NoSnapping, OsrmSnapper, RoadSnapper};

#[derive(Clone)]
pub struct AppState {
    pub snapper: Arc<dyn RoadSnapper>,
    pub routes: Arc<dyn RouteProvider>,
    pub elevation: Arc<dyn ElevationProvider>,
    pub profile: VehicleProfile,
    pub config: Arc<Config>,
    pub campus: Arc<Campus>,
}

impl AppState {
    /// State that never leaves the process: no snapping, straight-line
    /// routes and flat terrain.
    pub fn offline(config: Config, campus: Campus) -> Self {
        Self {
            snapper: Arc::new(NoSnapping),
            routes: Arc::new(StraightLine),
            elevation: Arc::new(FlatTerrain),
            profile: VehicleProfile::default(),
            config: Arc::new(config),
            campus: Arc::new(campus),
        }
    }

    /// Every lookup answered by one local road network.
    pub fn with_network(config: Config, campus: Campus, network: RoadNetwork) -> Self {
        let network = Arc::new(network);
        Self {
            snapper: network.clone(),
            routes: network.clone(),
            elevation: network,
            profile: VehicleProfile::default(),
            config: Arc::new(config),
            campus: Arc::new(campus),
        }
    }

    /// Picks adapters from the configuration: the local road network when
    /// one is configured, the public OSRM and Open-Elevation services otherwise.
    pub fn from_config(config: Config) -> Result<Self, StartupError> {
        let campus = Campus::bundled()?;

        if let Some(path) = &config.road_network {
            let network = RoadNetwork::from_file(path)?;
            tracing::info!(
                "loaded road network with {} nodes from {}",
                network.node_count(),
                path.display()
            );
            return Ok(Self::with_network(config, campus, network));
        }

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(StartupError::Client)?;
        tracing::info!("using OSRM at {} and elevation service at {}", config.osrm_url, config.elevation_url);

        Ok(Self {
            snapper: Arc::new(OsrmSnapper::new(client.clone(), config.osrm_url.as_str())),
            routes: Arc::new(OsrmRouter::new(client.clone(), config.osrm_url.as_str())),
            elevation: Arc::new(OpenElevation::new(client, config.elevation_url.as_str())),
            profile: VehicleProfile::default(),
            config: Arc::new(config),
            campus: Arc::new(campus),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/campus", get(handlers::campus))
        .route("/api/energy", post(handlers::energy))
        .route("/api/battery/remaining", post(handlers::remaining_battery))
        .route("/api/battery/charging-time", post(handlers::charging_time))
        .route("/api/battery/intervals", post(handlers::charging_intervals))
        .route("/api/trip", post(handlers::trip))
        .route("/api/optimize/single", post(handlers::optimize_single))
        .route("/api/optimize/multi", post(handlers::optimize_multi))
        .route("/api/metrics", post(handlers::metrics))
        .route("/api/compare", post(handlers::compare))
        .route("/api/suggest", post(handlers::suggest))
        .route("/api/export/gpx", post(handlers::export_gpx))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
