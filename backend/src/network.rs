use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use kdtree::KdTree;
use kdtree::distance::squared_euclidean;
use petgraph::{
    algo::astar,
    graph::{NodeIndex, UnGraph},
    visit::EdgeRef,
};
use serde::{Deserialize, Serialize};

use crate::{
    geo::{distance_m, path_length_m},
    models::{Coordinate, ElevationSample, RouteLookup, SnapResult},
    providers::{BoxFuture, DEFAULT_ELEVATION_M, ElevationProvider, RouteProvider},
    snapping::{RoadSnapper, accept_within_radius},
};

/// Endpoints further than this from any network node are not routed.
const MAX_ROUTING_NODE_DISTANCE_M: f64 = 2_000.0;
/// Candidates pulled from the kd-tree before ranking by true distance.
const NEAREST_CANDIDATES: usize = 4;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkFile {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: u64,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub elevation: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: u64,
    pub to: u64,
    #[serde(default)]
    pub name: Option<String>,
    /// Computed from the geometry when absent.
    #[serde(default)]
    pub length_m: Option<f64>,
    #[serde(default)]
    pub waypoints: Vec<Coordinate>,
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("failed to read road network file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid road network definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("road network is empty")]
    EmptyGraph,
    #[error("edge references unknown node {0}")]
    MissingNode(u64),
}

#[derive(Clone, Debug)]
struct NodeData {
    coord: Coordinate,
    elevation: Option<f64>,
    road_name: Option<String>,
}

#[derive(Clone, Debug)]
struct EdgeData {
    length_m: f64,
    /// Intermediate geometry, ordered from the lower to the higher node index.
    waypoints: Vec<Coordinate>,
}

/// Drivable campus road network used for offline snapping, routing and
/// elevation lookup.
#[derive(Clone)]
pub struct RoadNetwork {
    graph: UnGraph<NodeData, EdgeData>,
    spatial_index: KdTree<f64, usize, [f64; 2]>,
}

impl RoadNetwork {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NetworkError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, NetworkError> {
        let file: NetworkFile = serde_json::from_reader(reader)?;
        Self::from_network_file(file)
    }

    pub fn from_network_file(file: NetworkFile) -> Result<Self, NetworkError> {
        if file.nodes.is_empty() {
            return Err(NetworkError::EmptyGraph);
        }

        let mut graph = UnGraph::new_undirected();
        let mut id_to_index = HashMap::with_capacity(file.nodes.len());

        for node in file.nodes {
            let idx = graph.add_node(NodeData {
                coord: Coordinate::new(node.lat, node.lng),
                elevation: node.elevation,
                road_name: None,
            });
            id_to_index.insert(node.id, idx);
        }

        for edge in file.edges {
            let from = *id_to_index
                .get(&edge.from)
                .ok_or(NetworkError::MissingNode(edge.from))?;
            let to = *id_to_index
                .get(&edge.to)
                .ok_or(NetworkError::MissingNode(edge.to))?;

            let mut geometry = Vec::with_capacity(edge.waypoints.len() + 2);
            geometry.push(graph[from].coord);
            geometry.extend_from_slice(&edge.waypoints);
            geometry.push(graph[to].coord);
            let length_m = edge.length_m.unwrap_or_else(|| path_length_m(&geometry));

            let mut waypoints = edge.waypoints;
            if from > to {
                waypoints.reverse();
            }

            if let Some(name) = edge.name {
                for idx in [from, to] {
                    graph[idx].road_name.get_or_insert_with(|| name.clone());
                }
            }

            graph.update_edge(from, to, EdgeData { length_m, waypoints });
        }

        let spatial_index = Self::build_spatial_index(&graph);
        tracing::debug!(
            "road network ready: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            graph,
            spatial_index,
        })
    }

    fn build_spatial_index(graph: &UnGraph<NodeData, EdgeData>) -> KdTree<f64, usize, [f64; 2]> {
        let mut tree = KdTree::new(2);
        for idx in graph.node_indices() {
            let coord = graph[idx].coord;
            let _ = tree.add([coord.lng, coord.lat], idx.index());
        }
        tree
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Nearest network node and its great-circle distance in meters.
    pub fn nearest_node(&self, target: Coordinate) -> Option<(NodeIndex, f64)> {
        let candidates = self
            .spatial_index
            .nearest(&[target.lng, target.lat], NEAREST_CANDIDATES, &squared_euclidean)
            .ok()?;

        candidates
            .into_iter()
            .map(|(_, &idx)| {
                let node = NodeIndex::new(idx);
                (node, distance_m(target, self.graph[node].coord))
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Shortest drivable path between the nodes closest to `start` and `end`.
    pub fn shortest_path(&self, start: Coordinate, end: Coordinate) -> Option<Vec<Coordinate>> {
        let (from, from_dist) = self.nearest_node(start)?;
        let (to, to_dist) = self.nearest_node(end)?;
        if from_dist > MAX_ROUTING_NODE_DISTANCE_M || to_dist > MAX_ROUTING_NODE_DISTANCE_M {
            tracing::debug!(
                "endpoints too far from network ({:.0} m, {:.0} m)",
                from_dist,
                to_dist
            );
            return None;
        }

        let goal = self.graph[to].coord;
        let (_cost, route) = astar(
            &self.graph,
            from,
            |finish| finish == to,
            |edge| edge.weight().length_m,
            |idx| distance_m(self.graph[idx].coord, goal),
        )?;

        Some(self.expand_path(&route))
    }

    fn expand_path(&self, route: &[NodeIndex]) -> Vec<Coordinate> {
        let mut result = Vec::with_capacity(route.len() * 2);
        if let Some(first) = route.first() {
            result.push(self.graph[*first].coord);
        }

        for window in route.windows(2) {
            let (from, to) = (window[0], window[1]);
            if let Some(edge) = self.graph.find_edge(from, to) {
                let waypoints = &self.graph[edge].waypoints;
                if from < to {
                    result.extend(waypoints.iter().copied());
                } else {
                    result.extend(waypoints.iter().rev().copied());
                }
            }
            result.push(self.graph[to].coord);
        }

        result
    }

    /// Elevation of the nearest node carrying one; `None` when none is in range.
    pub fn elevation_near(&self, target: Coordinate, max_distance_m: f64) -> Option<f64> {
        let (node, dist) = self.nearest_node(target)?;
        if dist > max_distance_m {
            return None;
        }
        self.graph[node].elevation.or_else(|| {
            self.graph
                .neighbors(node)
                .find_map(|n| self.graph[n].elevation)
        })
    }

    fn connected_edges(&self, node: NodeIndex) -> usize {
        self.graph.edges(node).count()
    }
}

impl RoadSnapper for RoadNetwork {
    fn snap(&self, target: Coordinate, max_radius_m: f64) -> BoxFuture<'_, SnapResult> {
        let result = match self.nearest_node(target) {
            Some((node, dist)) if self.connected_edges(node) > 0 => accept_within_radius(
                target,
                self.graph[node].coord,
                dist,
                self.graph[node].road_name.clone(),
                max_radius_m,
            ),
            _ => SnapResult::unsnapped(target),
        };
        Box::pin(async move { result })
    }
}

impl RouteProvider for RoadNetwork {
    fn route(&self, start: Coordinate, end: Coordinate) -> BoxFuture<'_, RouteLookup> {
        let lookup = match self.shortest_path(start, end) {
            Some(path) => RouteLookup {
                distance: Some(path_length_m(&path)),
                duration: None,
                coordinates: path,
                success: true,
                error: None,
            },
            None => crate::providers::straight_line(start, end),
        };
        Box::pin(async move { lookup })
    }
}

/// Nodes within this distance lend their elevation to a query point.
const ELEVATION_LOOKUP_RADIUS_M: f64 = 250.0;

impl ElevationProvider for RoadNetwork {
    fn elevations(&self, coords: Vec<Coordinate>) -> BoxFuture<'_, Vec<ElevationSample>> {
        let samples = coords
            .into_iter()
            .map(|c| match self.elevation_near(c, ELEVATION_LOOKUP_RADIUS_M) {
                Some(elevation) => ElevationSample {
                    lat: c.lat,
                    lng: c.lng,
                    elevation,
                    estimated: false,
                },
                None => ElevationSample {
                    lat: c.lat,
                    lng: c.lng,
                    elevation: DEFAULT_ELEVATION_M,
                    estimated: true,
                },
            })
            .collect();
        Box::pin(async move { samples })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMPUS: &str = include_str!("../data/campus_roads.json");

    fn network() -> RoadNetwork {
        RoadNetwork::from_reader(CAMPUS.as_bytes()).expect("campus network")
    }

    #[test]
    fn loads_campus_network() {
        assert!(network().node_count() >= 8);
    }

    #[test]
    fn loads_network_from_disk() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CAMPUS.as_bytes()).unwrap();

        let net = RoadNetwork::from_file(file.path()).unwrap();
        assert_eq!(net.node_count(), network().node_count());

        let missing = RoadNetwork::from_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(NetworkError::Io(_))));
    }

    #[test]
    fn rejects_empty_and_dangling_graphs() {
        let empty = NetworkFile {
            nodes: vec![],
            edges: vec![],
        };
        assert!(matches!(
            RoadNetwork::from_network_file(empty),
            Err(NetworkError::EmptyGraph)
        ));

        let dangling = NetworkFile {
            nodes: vec![NodeRecord {
                id: 1,
                lat: 15.39,
                lng: 73.88,
                elevation: None,
            }],
            edges: vec![EdgeRecord {
                from: 1,
                to: 99,
                name: None,
                length_m: None,
                waypoints: vec![],
            }],
        };
        assert!(matches!(
            RoadNetwork::from_network_file(dangling),
            Err(NetworkError::MissingNode(99))
        ));
    }

    #[test]
    fn nearest_node_is_close_to_known_junction() {
        let net = network();
        let gate = Coordinate::new(15.387352, 73.875786);
        let (_, dist) = net.nearest_node(gate).expect("node");
        assert!(dist < 100.0, "nearest node {dist} m away");
    }

    #[test]
    fn routes_between_gate_and_cafeteria() {
        let net = network();
        let gate = Coordinate::new(15.387352, 73.875786);
        let cafeteria = Coordinate::new(15.392803, 73.884299);
        let path = net.shortest_path(gate, cafeteria).expect("path");
        assert!(path.len() >= 3);
        assert!(path_length_m(&path) >= distance_m(gate, cafeteria) * 0.8);
    }

    #[test]
    fn far_endpoints_are_not_routed() {
        let net = network();
        let paris = Coordinate::new(48.8566, 2.3522);
        let gate = Coordinate::new(15.387352, 73.875786);
        assert!(net.shortest_path(paris, gate).is_none());
    }

    #[tokio::test]
    async fn snaps_to_named_road_within_radius() {
        let net = network();
        let near_library = Coordinate::new(15.3916, 73.8803);
        let snapped = net.snap(near_library, 1000.0).await;
        assert!(snapped.snapped);
        assert!(snapped.distance.unwrap() <= 1000.0);
        assert!(snapped.name.is_some());
    }

    #[tokio::test]
    async fn snap_outside_radius_keeps_original() {
        let net = network();
        let offshore = Coordinate::new(15.45, 73.80);
        let snapped = net.snap(offshore, 1000.0).await;
        assert!(!snapped.snapped);
        assert_eq!((snapped.lat, snapped.lng), (offshore.lat, offshore.lng));
        assert!(snapped.distance.is_none());
    }

    #[tokio::test]
    async fn elevation_falls_back_when_out_of_range() {
        let net = network();
        let samples = net
            .elevations(vec![
                Coordinate::new(15.387352, 73.875786),
                Coordinate::new(15.45, 73.80),
            ])
            .await;
        assert!(!samples[0].estimated);
        assert!(samples[1].estimated);
        assert_eq!(samples[1].elevation, DEFAULT_ELEVATION_M);
    }
}
