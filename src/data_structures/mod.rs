//! Search and indexing data structures.
//!
//! All of them are built once and then queried, none of them lock.

pub mod indexed_heap;
pub mod kd_tree;
pub mod trie;
