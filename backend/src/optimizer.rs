//! Charging-station siting.
//!
//! # Single station: weighted centroid
//! Every route contributes demand points (start, end, and a half-weight
//! midpoint). The site is the frequency-weighted mean of those points, moved
//! onto the road network when a drivable point lies within the snap radius.
//!
//! # Several stations: weighted k-means
//! Route endpoints are clustered by iterative relocation:
//!
//! ```text
//! seed k centers from distinct demand locations (seeded RNG)
//! repeat up to max_iterations:
//!     assign each point to its nearest center (haversine)
//!     move each non-empty center to the weighted centroid of its points
//!     stop once no center moved more than convergence_epsilon_m
//! drop empty clusters, snap the survivors concurrently
//! ```
//!
//! This is a local search: results depend on the seed and are not globally optimal.

use std::{collections::HashSet, sync::Arc};

use rand::{SeedableRng, rngs::SmallRng, seq::index::sample};

use crate::{
    demand::{DemandOptions, demand_points, weighted_centroid},
    geo::distance_m,
    metrics::evaluate,
    models::{Coordinate, LocationMetrics, OptimalLocationResult, Route, SnapResult, WeightedPoint},
    snapping::{DEFAULT_SNAP_RADIUS_M, RoadSnapper},
};

pub const METHOD_WEIGHTED_CENTROID: &str = "weighted_centroid";
pub const METHOD_K_MEANS: &str = "k_means_clustering";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatorOptions {
    pub demand: DemandOptions,
    pub snap_radius_m: f64,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            demand: DemandOptions::SINGLE_STATION,
            snap_radius_m: DEFAULT_SNAP_RADIUS_M,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterOptions {
    pub demand: DemandOptions,
    pub snap_radius_m: f64,
    pub seed: u64,
    pub max_iterations: usize,
    pub convergence_epsilon_m: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            demand: DemandOptions::MULTI_STATION,
            snap_radius_m: DEFAULT_SNAP_RADIUS_M,
            seed: 42,
            max_iterations: 10,
            convergence_epsilon_m: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Cluster {
    center: Coordinate,
    points: Vec<usize>,
}

/// Best single station for the given routes, or `None` when there are no routes.
pub async fn find_optimal_location(
    routes: &[Route],
    existing_stations: &[Coordinate],
    snapper: &dyn RoadSnapper,
    options: LocatorOptions,
) -> Option<OptimalLocationResult> {
    if routes.is_empty() {
        return None;
    }

    let points = demand_points(routes, options.demand);
    let centroid = weighted_centroid(&points)?;
    tracing::debug!(
        "weighted centroid of {} demand points: ({:.6}, {:.6})",
        points.len(),
        centroid.lat,
        centroid.lng
    );

    let snap = snapper.snap(centroid, options.snap_radius_m).await;
    let site = final_site(centroid, &snap);
    let metrics = evaluate(site, routes, existing_stations);

    Some(build_result(
        None,
        centroid,
        snap,
        metrics,
        METHOD_WEIGHTED_CENTROID,
        None,
    ))
}

/// Up to `num_stations` sites, one per non-empty demand cluster, in cluster order.
pub async fn find_multiple_optimal_locations(
    routes: &[Route],
    num_stations: usize,
    snapper: Arc<dyn RoadSnapper>,
    options: ClusterOptions,
) -> Vec<OptimalLocationResult> {
    if routes.is_empty() || num_stations == 0 {
        return Vec::new();
    }

    let points = demand_points(routes, options.demand);
    let clusters = cluster_demand(&points, num_stations, &options);
    tracing::info!(
        "{} of {} requested clusters are non-empty",
        clusters.len(),
        num_stations
    );

    let handles: Vec<_> = clusters
        .iter()
        .map(|cluster| {
            let snapper = Arc::clone(&snapper);
            let center = cluster.center;
            let radius = options.snap_radius_m;
            tokio::spawn(async move { snapper.snap(center, radius).await })
        })
        .collect();

    let mut results = Vec::with_capacity(clusters.len());
    for (index, (cluster, handle)) in clusters.iter().zip(handles).enumerate() {
        let snap = handle.await.unwrap_or_else(|err| {
            tracing::warn!("snap task for cluster {} failed: {err}", index + 1);
            SnapResult::unsnapped(cluster.center)
        });
        let site = final_site(cluster.center, &snap);
        let metrics = evaluate(site, routes, &[]);
        let assigned = assigned_routes(&points, &cluster.points);

        results.push(build_result(
            Some(format!("optimal-station-{}", index + 1)),
            cluster.center,
            snap,
            metrics,
            METHOD_K_MEANS,
            Some(assigned),
        ));
    }

    results
}

/// Runs weighted k-means and returns the non-empty clusters.
fn cluster_demand(points: &[WeightedPoint], k: usize, options: &ClusterOptions) -> Vec<Cluster> {
    if points.is_empty() {
        return Vec::new();
    }

    let candidates = distinct_locations(points);
    let mut rng = SmallRng::seed_from_u64(options.seed);
    let seeds = sample(&mut rng, candidates.len(), k.min(candidates.len()));
    let mut clusters: Vec<Cluster> = seeds
        .iter()
        .map(|idx| Cluster {
            center: points[candidates[idx]].coordinate(),
            points: Vec::new(),
        })
        .collect();

    for iteration in 0..options.max_iterations.max(1) {
        let assignment = assign(points, &clusters);
        let mut max_shift: f64 = 0.0;

        clusters = clusters
            .into_iter()
            .enumerate()
            .map(|(ci, cluster)| {
                let members: Vec<usize> = assignment
                    .iter()
                    .enumerate()
                    .filter(|&(_, &c)| c == ci)
                    .map(|(pi, _)| pi)
                    .collect();
                let center = weighted_centroid(members.iter().map(|&pi| &points[pi]))
                    .unwrap_or(cluster.center);
                max_shift = max_shift.max(distance_m(cluster.center, center));
                Cluster {
                    center,
                    points: members,
                }
            })
            .collect();

        tracing::debug!("iteration {}: max center shift {:.3} m", iteration + 1, max_shift);
        if max_shift < options.convergence_epsilon_m {
            break;
        }
    }

    clusters.retain(|c| !c.points.is_empty());
    clusters
}

/// Index of the first point at each distinct location, in input order.
fn distinct_locations(points: &[WeightedPoint]) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(points.len());
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| seen.insert((p.lat.to_bits(), p.lng.to_bits())))
        .map(|(i, _)| i)
        .collect()
}

/// Index of the nearest center for every point; ties go to the lowest index.
fn assign(points: &[WeightedPoint], clusters: &[Cluster]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            let at = p.coordinate();
            clusters
                .iter()
                .enumerate()
                .fold((0, f64::INFINITY), |(best, best_dist), (ci, c)| {
                    let d = distance_m(at, c.center);
                    if d < best_dist { (ci, d) } else { (best, best_dist) }
                })
                .0
        })
        .collect()
}

fn assigned_routes(points: &[WeightedPoint], members: &[usize]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for &pi in members {
        let id = &points[pi].route_id;
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    ids
}

fn final_site(original: Coordinate, snap: &SnapResult) -> Coordinate {
    if snap.snapped {
        Coordinate::new(snap.lat, snap.lng)
    } else {
        original
    }
}

fn build_result(
    id: Option<String>,
    original: Coordinate,
    snap: SnapResult,
    metrics: LocationMetrics,
    method: &str,
    assigned_routes: Option<Vec<String>>,
) -> OptimalLocationResult {
    let site = final_site(original, &snap);
    OptimalLocationResult {
        id,
        lat: site.lat,
        lng: site.lng,
        original_lat: original.lat,
        original_lng: original.lng,
        snapped: snap.snapped,
        snap_distance: snap.distance.filter(|_| snap.snapped),
        road_name: snap.name.filter(|_| snap.snapped),
        metrics,
        method: method.to_string(),
        assigned_routes,
    }
}
