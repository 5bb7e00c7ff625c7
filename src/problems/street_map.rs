//! In-memory street map.
//!
//! Nodes carry a (longitude, latitude) position and an optional name, ways
//! connect them with undirected edges weighted by great-circle distance.
//! Once built, the map answers closest-node, place-name and routing queries.
use std::time::Duration;

use derive_more::Display;
use rand::Rng;
use rustc_hash::FxHashMap;
use thiserror::Error;
use thousands::Separable;

use crate::algorithms::astar::AStarSolver;
use crate::data_structures::kd_tree::NearestNeighborTree;
use crate::data_structures::kd_tree::Point;
use crate::data_structures::trie::PrefixTrie;
use crate::space::AStarGraph;
use crate::space::WeightedEdge;

pub type NodeId = u64;

/// Mean earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance in metres between two (longitude, latitude) positions.
pub fn great_circle_distance(lon_a: f64, lat_a: f64, lon_b: f64, lat_b: f64) -> f64 {
    let phi_a = lat_a.to_radians();
    let phi_b = lat_b.to_radians();
    let d_phi = (lat_b - lat_a).to_radians();
    let d_lambda = (lon_b - lon_a).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Canonical form of place names: ASCII letters and spaces, lower-cased.
pub fn clean_string(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreetMapError {
    #[error("Node {0} already exists.")]
    DuplicateNode(NodeId),
    #[error("Unknown node {0}.")]
    UnknownNode(NodeId),
}

/// A named place on the map.
#[derive(Clone, Debug, Display, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[display("{name}#{id}@({lon},{lat})")]
pub struct Location {
    pub id: NodeId,
    pub lon: f64,
    pub lat: f64,
    pub name: String,
}

#[derive(Clone, Debug)]
struct MapNode {
    id: NodeId,
    lon: f64,
    lat: f64,
    name: Option<String>,
}

/// Collects nodes and ways before indexing them.
#[derive(Debug, Default)]
pub struct StreetMapBuilder {
    /// Nodes in insertion order.
    nodes: Vec<MapNode>,
    node_index: FxHashMap<NodeId, usize>,
    adjacency: FxHashMap<NodeId, Vec<WeightedEdge<NodeId>>>,
    num_edges: usize,
}

impl StreetMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        id: NodeId,
        lon: f64,
        lat: f64,
        name: Option<String>,
    ) -> Result<(), StreetMapError> {
        if self.node_index.contains_key(&id) {
            return Err(StreetMapError::DuplicateNode(id));
        }
        self.node_index.insert(id, self.nodes.len());
        self.nodes.push(MapNode { id, lon, lat, name });
        Ok(())
    }

    /// Connects consecutive nodes of `way` in both directions.
    ///
    /// Nothing is added unless every node exists.
    pub fn add_way(&mut self, way: &[NodeId]) -> Result<(), StreetMapError> {
        if let Some(&unknown) = way.iter().find(|&&id| !self.node_index.contains_key(&id)) {
            return Err(StreetMapError::UnknownNode(unknown));
        }

        for pair in way.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b {
                continue;
            }
            let na = &self.nodes[self.node_index[&a]];
            let nb = &self.nodes[self.node_index[&b]];
            let weight = great_circle_distance(na.lon, na.lat, nb.lon, nb.lat);

            self.adjacency
                .entry(a)
                .or_default()
                .push(WeightedEdge::new(a, b, weight));
            self.adjacency
                .entry(b)
                .or_default()
                .push(WeightedEdge::new(b, a, weight));
            self.num_edges += 2;
        }
        Ok(())
    }

    /// Indexes names and routable positions.
    pub fn build(self) -> StreetMap {
        let mut names = PrefixTrie::new();
        let mut clean_to_nodes = FxHashMap::<String, Vec<NodeId>>::default();
        let mut tree = NearestNeighborTree::default();
        let mut point_to_node = FxHashMap::<(u64, u64), NodeId>::default();

        for node in &self.nodes {
            if let Some(name) = &node.name {
                let cleaned = clean_string(name);
                names.add(&cleaned);
                clean_to_nodes.entry(cleaned).or_default().push(node.id);
            }
            // Only nodes on some way can start or end a route.
            if self.adjacency.get(&node.id).is_some_and(|edges| !edges.is_empty()) {
                let key = (node.lon.to_bits(), node.lat.to_bits());
                if !point_to_node.contains_key(&key) {
                    point_to_node.insert(key, node.id);
                    tree.insert(Point::new(node.lon, node.lat));
                }
            }
        }

        let map = StreetMap {
            nodes: self.nodes,
            node_index: self.node_index,
            adjacency: self.adjacency,
            num_edges: self.num_edges,
            tree,
            point_to_node,
            names,
            clean_to_nodes,
        };
        log::info!("Built {map}");
        map
    }
}

/// A queryable street map.
#[derive(Clone, Debug, Display)]
#[display("StreetMap({} nodes; {} edges; {} routable; {} names)",
nodes.len().separate_with_commas(), num_edges.separate_with_commas(),
tree.len().separate_with_commas(), names.len().separate_with_commas())]
pub struct StreetMap {
    nodes: Vec<MapNode>,
    node_index: FxHashMap<NodeId, usize>,
    adjacency: FxHashMap<NodeId, Vec<WeightedEdge<NodeId>>>,
    num_edges: usize,

    /// Positions of routable nodes.
    tree: NearestNeighborTree,
    point_to_node: FxHashMap<(u64, u64), NodeId>,

    /// Cleaned names.
    names: PrefixTrie,
    clean_to_nodes: FxHashMap<String, Vec<NodeId>>,
}

impl StreetMap {
    pub fn builder() -> StreetMapBuilder {
        StreetMapBuilder::new()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }
    pub fn num_routable_nodes(&self) -> usize {
        self.tree.len()
    }

    fn node(&self, id: NodeId) -> Option<&MapNode> {
        self.node_index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    /// (longitude, latitude) of a node.
    pub fn position(&self, id: NodeId) -> Option<(f64, f64)> {
        self.node(id).map(|n| (n.lon, n.lat))
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(|n| n.name.as_deref())
    }

    /// The routable node closest to the given position.
    pub fn closest(&self, lon: f64, lat: f64) -> Option<NodeId> {
        let p = self.tree.nearest(lon, lat)?;
        self.point_to_node.get(&(p.x.to_bits(), p.y.to_bits())).copied()
    }

    /// Full names of every place whose cleaned name starts with the cleaned
    /// `prefix`.
    pub fn locations_by_prefix(&self, prefix: &str) -> Vec<String> {
        let cleaned = clean_string(prefix);
        self.names
            .keys_with_prefix(&cleaned)
            .iter()
            .filter_map(|key| self.clean_to_nodes.get(key))
            .flatten()
            .filter_map(|&id| self.name(id))
            .map(str::to_string)
            .collect()
    }

    /// Every place whose cleaned name equals the cleaned `location_name`.
    pub fn locations(&self, location_name: &str) -> Vec<Location> {
        let cleaned = clean_string(location_name);
        let Some(ids) = self.clean_to_nodes.get(&cleaned) else {
            return vec![];
        };
        ids.iter()
            .filter_map(|&id| self.node(id))
            .filter_map(|n| {
                Some(Location {
                    id: n.id,
                    lon: n.lon,
                    lat: n.lat,
                    name: n.name.clone()?,
                })
            })
            .collect()
    }

    /// Routes between two nodes.
    pub fn shortest_path(
        &self,
        start: NodeId,
        end: NodeId,
        timeout: Duration,
    ) -> Result<AStarSolver<NodeId>, StreetMapError> {
        for id in [start, end] {
            if self.node(id).is_none() {
                return Err(StreetMapError::UnknownNode(id));
            }
        }
        Ok(AStarSolver::new(self, start, end, timeout))
    }

    /// Routes between the nodes closest to two positions.
    ///
    /// `None` if the map has no routable nodes.
    pub fn route(
        &self,
        start: (f64, f64),
        end: (f64, f64),
        timeout: Duration,
    ) -> Option<AStarSolver<NodeId>> {
        let start = self.closest(start.0, start.1)?;
        let end = self.closest(end.0, end.1)?;
        Some(AStarSolver::new(self, start, end, timeout))
    }

    /// A `width`x`height` grid of streets around Berkeley.
    ///
    /// Positions are jittered, some blocks are missing, and some nodes get a
    /// name out of a short list so names repeat.
    pub fn random_grid<R: Rng>(r: &mut R, width: u32, height: u32) -> StreetMap {
        const ORIGIN: (f64, f64) = (-122.2900, 37.8500);
        const SPACING: f64 = 0.0008;
        const STREET_PROBABILITY: f64 = 0.85;
        const NAME_PROBABILITY: f64 = 0.05;
        const NAMES: [&str; 12] = [
            "Top Dog",
            "Peet's Coffee & Tea",
            "Cheese Board Collective",
            "Berkeley Bowl",
            "Moe's Books",
            "Blue Bottle Coffee",
            "Berkeley Public Library",
            "Pizzeria Bettola",
            "Peet's Coffee",
            "La Note",
            "Top-Dog",
            "Ippuku",
        ];

        let mut builder = StreetMapBuilder::new();
        let id = |x: u32, y: u32| NodeId::from(y) * NodeId::from(width) + NodeId::from(x);
        for y in 0..height {
            for x in 0..width {
                let lon = ORIGIN.0 + f64::from(x) * SPACING + r.random_range(-0.2..0.2) * SPACING;
                let lat = ORIGIN.1 + f64::from(y) * SPACING + r.random_range(-0.2..0.2) * SPACING;
                let name = r
                    .random_bool(NAME_PROBABILITY)
                    .then(|| NAMES[r.random_range(0..NAMES.len())].to_string());
                if let Err(e) = builder.add_node(id(x, y), lon, lat, name) {
                    log::warn!("Skipping grid node: {e}");
                }
            }
        }
        for y in 0..height {
            for x in 0..width {
                let mut ways = vec![];
                if x + 1 < width && r.random_bool(STREET_PROBABILITY) {
                    ways.push([id(x, y), id(x + 1, y)]);
                }
                if y + 1 < height && r.random_bool(STREET_PROBABILITY) {
                    ways.push([id(x, y), id(x, y + 1)]);
                }
                for way in ways {
                    if let Err(e) = builder.add_way(&way) {
                        log::warn!("Skipping grid way: {e}");
                    }
                }
            }
        }
        builder.build()
    }
}

impl AStarGraph<NodeId> for StreetMap {
    fn neighbors(&self, v: &NodeId) -> Vec<WeightedEdge<NodeId>> {
        self.adjacency.get(v).cloned().unwrap_or_default()
    }

    fn estimated_distance_to_goal(&self, v: &NodeId, goal: &NodeId) -> f64 {
        match (self.node(*v), self.node(*goal)) {
            (Some(a), Some(b)) => great_circle_distance(a.lon, a.lat, b.lon, b.lat),
            _ => 0.0,
        }
    }
}
