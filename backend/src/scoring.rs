use rayon::prelude::*;

use crate::{
    geo::distance_m,
    metrics::evaluate,
    models::{LocationMetrics, PlacementScenario, RankedScenario, Route, StationImprovement},
    optimizer::{LocatorOptions, find_optimal_location},
    snapping::RoadSnapper,
};

const AVERAGE_DISTANCE_WEIGHT: f64 = 0.4;
const COVERAGE_WEIGHT: f64 = 0.3;
const MAX_DISTANCE_WEIGHT: f64 = 0.3;
/// A suggested site closer than this to the existing station is not worth a move.
pub const RELOCATION_THRESHOLD_M: f64 = 100.0;

/// Composite placement score; higher is better.
///
/// ```text
/// 0.4 * max(0, 100 - avg/10) + 0.3 * coverage + 0.3 * max(0, 100 - max/15)
/// ```
pub fn score(metrics: &LocationMetrics) -> f64 {
    let average_score = (100.0 - metrics.average_distance / 10.0).max(0.0);
    let max_score = (100.0 - metrics.max_distance / 15.0).max(0.0);

    average_score * AVERAGE_DISTANCE_WEIGHT
        + metrics.coverage_percentage * COVERAGE_WEIGHT
        + max_score * MAX_DISTANCE_WEIGHT
}

/// Scores each scenario against the routes and ranks them, best first.
/// Ties keep their input order.
pub fn compare(scenarios: &[PlacementScenario], routes: &[Route]) -> Vec<RankedScenario> {
    let mut ranked: Vec<RankedScenario> = scenarios
        .par_iter()
        .map(|scenario| {
            let metrics = evaluate(scenario.location, routes, &[]);
            RankedScenario {
                name: scenario.name.clone(),
                location: scenario.location,
                score: score(&metrics),
                metrics,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Compares an existing station with the single-station optimum for the same routes.
pub async fn suggest_improvement(
    existing: &crate::models::Location,
    routes: &[Route],
    snapper: &dyn RoadSnapper,
    options: LocatorOptions,
) -> Option<StationImprovement> {
    let station = existing.coordinate();
    let current_metrics = evaluate(station, routes, &[]);
    let optimal_location = find_optimal_location(routes, &[station], snapper, options).await?;

    let improvement_distance = distance_m(station, optimal_location.coordinate());
    tracing::info!(
        "existing station {} is {:.0} m from the suggested site",
        existing.id,
        improvement_distance
    );

    Some(StationImprovement {
        average_distance_improvement: current_metrics.average_distance
            - optimal_location.metrics.average_distance,
        coverage_improvement: optimal_location.metrics.coverage_percentage
            - current_metrics.coverage_percentage,
        should_relocate: improvement_distance > RELOCATION_THRESHOLD_M,
        improvement_distance,
        current_metrics,
        optimal_location,
    })
}
