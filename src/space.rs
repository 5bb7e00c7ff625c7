use std::fmt::Debug;
use std::hash::Hash;

use derive_more::Display;

/// Identity of a vertex in a searchable graph.
///
/// Anything that can be compared and hashed works, map node ids being the
/// usual case.
pub trait Vertex: Clone + Debug + PartialEq + Eq + Hash {}
impl<T> Vertex for T where T: Clone + Debug + PartialEq + Eq + Hash {}

/// A directed edge carrying a non-negative weight.
#[derive(Clone, Debug, Display, PartialEq)]
#[display("{from:?}->{to:?}[{weight}]")]
pub struct WeightedEdge<V: Vertex> {
    pub from: V,
    pub to: V,
    pub weight: f64,
}

impl<V> WeightedEdge<V>
where
    V: Vertex,
{
    #[inline(always)]
    pub fn new(from: V, to: V, weight: f64) -> Self {
        debug_assert!(weight >= 0.0, "Edge weights must be non-negative");
        Self { from, to, weight }
    }
}

/// A graph that A* can search.
///
/// The heuristic must be admissible and consistent for the solutions to be
/// optimal. This is not checked.
pub trait AStarGraph<V: Vertex> {
    /// Outgoing edges of `v`.
    fn neighbors(&self, v: &V) -> Vec<WeightedEdge<V>>;

    /// Estimated remaining cost from `v` to `goal`.
    fn estimated_distance_to_goal(&self, v: &V, goal: &V) -> f64;
}
