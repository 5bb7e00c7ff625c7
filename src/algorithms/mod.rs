//! Implementation of search algorithms.
//!
//! These algorithms do path-finding on any graph implementing
//! [`crate::space::AStarGraph`].

pub mod astar;
