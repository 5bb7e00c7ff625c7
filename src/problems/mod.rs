//! Implementation of searchable maps.
//!
//! These glue the data structures and algorithms together behind a
//! geocoding-style API.

pub mod street_map;
