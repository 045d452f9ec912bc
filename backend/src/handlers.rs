use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    battery,
    campus::Campus,
    demand::DemandOptions,
    energy::consumption,
    error::{ExportError, PlanningError},
    gpx_export::encode_route_as_gpx,
    metrics::evaluate,
    models::{
        ApiError, ChargingIntervalsRequest, ChargingPlan, ChargingSchedule, ChargingTimeRequest,
        CompareRequest, EnergyBreakdown, EnergyRequest, GpxExportRequest, GpxExportResponse,
        HealthResponse, LocationMetrics, MetricsRequest, MultiOptimizeRequest, OptimalLocationResult,
        OptimizeRequest, RankedScenario, RemainingBatteryRequest, RemainingBatteryResponse,
        StationImprovement, SuggestRequest, TripReport,
    },
    optimizer::{ClusterOptions, LocatorOptions, find_multiple_optimal_locations, find_optimal_location},
    scoring,
    trip::{TripRequest, plan_trip},
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn campus(State(state): State<AppState>) -> Json<Campus> {
    Json(state.campus.as_ref().clone())
}

pub async fn energy(
    State(state): State<AppState>,
    Json(req): Json<EnergyRequest>,
) -> ApiResult<EnergyBreakdown> {
    if !(req.distance >= 0.0) || req.elevation_gain < 0.0 || req.elevation_loss < 0.0 {
        return Err(bad_request(PlanningError::InvalidParameter(
            "distance and elevation changes must be non-negative".into(),
        )));
    }

    let profile = req.profile.unwrap_or(state.profile);
    profile.validate().map_err(bad_request)?;
    Ok(Json(consumption(
        req.distance,
        req.elevation_gain,
        req.elevation_loss,
        &profile,
    )))
}

pub async fn remaining_battery(
    State(state): State<AppState>,
    Json(req): Json<RemainingBatteryRequest>,
) -> ApiResult<RemainingBatteryResponse> {
    let capacity = capacity_or_default(&state, req.capacity).map_err(bad_request)?;
    Ok(Json(RemainingBatteryResponse {
        remaining_battery: battery::remaining_battery(
            req.current_battery,
            req.energy_consumed,
            capacity,
        ),
    }))
}

pub async fn charging_time(
    State(state): State<AppState>,
    Json(req): Json<ChargingTimeRequest>,
) -> ApiResult<ChargingPlan> {
    let capacity = capacity_or_default(&state, req.capacity).map_err(bad_request)?;
    let power = req.charger_power.unwrap_or(state.config.charger_power_kw);

    battery::charging_time(req.current_battery, req.target_battery, power, capacity)
        .map(Json)
        .map_err(bad_request)
}

pub async fn charging_intervals(
    State(state): State<AppState>,
    Json(req): Json<ChargingIntervalsRequest>,
) -> ApiResult<ChargingSchedule> {
    let capacity = capacity_or_default(&state, req.capacity).map_err(bad_request)?;
    let power = req.charger_power.unwrap_or(state.config.charger_power_kw);

    battery::charging_intervals(&req.trips, req.initial_battery, power, capacity)
        .map(Json)
        .map_err(bad_request)
}

pub async fn trip(
    State(state): State<AppState>,
    Json(req): Json<TripRequest>,
) -> ApiResult<TripReport> {
    plan_trip(
        &req,
        state.routes.as_ref(),
        state.elevation.as_ref(),
        &state.profile,
        state.config.charger_power_kw,
    )
    .await
    .map(Json)
    .map_err(bad_request)
}

pub async fn optimize_single(
    State(state): State<AppState>,
    Json(req): Json<OptimizeRequest>,
) -> ApiResult<OptimalLocationResult> {
    let options = LocatorOptions {
        demand: DemandOptions {
            include_midpoints: req
                .include_midpoints
                .unwrap_or(DemandOptions::SINGLE_STATION.include_midpoints),
        },
        snap_radius_m: state.config.snap_radius_m,
    };

    let result = find_optimal_location(
        &req.routes,
        &req.existing_stations,
        state.snapper.as_ref(),
        options,
    )
    .await
    .ok_or_else(|| bad_request(PlanningError::NoRoutes))?;

    tracing::info!(
        "optimal site ({:.6}, {:.6}) for {} routes, snapped: {}",
        result.lat,
        result.lng,
        req.routes.len(),
        result.snapped
    );
    Ok(Json(result))
}

pub async fn optimize_multi(
    State(state): State<AppState>,
    Json(req): Json<MultiOptimizeRequest>,
) -> ApiResult<Vec<OptimalLocationResult>> {
    if req.routes.is_empty() {
        return Err(bad_request(PlanningError::NoRoutes));
    }
    if req.num_stations == 0 {
        return Err(bad_request(PlanningError::NoStations));
    }

    let options = ClusterOptions {
        demand: DemandOptions {
            include_midpoints: req
                .include_midpoints
                .unwrap_or(DemandOptions::MULTI_STATION.include_midpoints),
        },
        snap_radius_m: state.config.snap_radius_m,
        seed: req.seed.unwrap_or(state.config.cluster_seed),
        ..ClusterOptions::default()
    };

    let sites =
        find_multiple_optimal_locations(&req.routes, req.num_stations, state.snapper.clone(), options)
            .await;
    tracing::info!("{} of {} stations placed", sites.len(), req.num_stations);
    Ok(Json(sites))
}

pub async fn metrics(Json(req): Json<MetricsRequest>) -> Json<LocationMetrics> {
    Json(evaluate(req.location, &req.routes, &req.existing_stations))
}

pub async fn compare(Json(req): Json<CompareRequest>) -> ApiResult<Vec<RankedScenario>> {
    if req.routes.is_empty() {
        return Err(bad_request(PlanningError::NoRoutes));
    }
    Ok(Json(scoring::compare(&req.scenarios, &req.routes)))
}

pub async fn suggest(
    State(state): State<AppState>,
    Json(req): Json<SuggestRequest>,
) -> ApiResult<StationImprovement> {
    let options = LocatorOptions {
        snap_radius_m: state.config.snap_radius_m,
        ..LocatorOptions::default()
    };

    scoring::suggest_improvement(&req.existing, &req.routes, state.snapper.as_ref(), options)
        .await
        .map(Json)
        .ok_or_else(|| bad_request(PlanningError::NoRoutes))
}

pub async fn export_gpx(Json(req): Json<GpxExportRequest>) -> ApiResult<GpxExportResponse> {
    let gpx_base64 = encode_route_as_gpx(&req.path, &req.stations).map_err(internal_error)?;
    Ok(Json(GpxExportResponse { gpx_base64 }))
}

fn capacity_or_default(state: &AppState, capacity: Option<f64>) -> Result<f64, PlanningError> {
    let capacity = capacity.unwrap_or(state.profile.battery_capacity_kwh);
    if capacity > 0.0 && capacity.is_finite() {
        Ok(capacity)
    } else {
        Err(PlanningError::InvalidParameter(format!(
            "battery capacity must be positive, got {capacity} kWh"
        )))
    }
}

fn bad_request(err: PlanningError) -> (StatusCode, Json<ApiError>) {
    tracing::debug!("rejected request: {err}");
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}

fn internal_error(err: ExportError) -> (StatusCode, Json<ApiError>) {
    tracing::error!("{err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
