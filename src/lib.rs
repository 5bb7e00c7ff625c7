use shadow_rs::shadow;

shadow!(build);

// Internals
// ---------
pub mod float_cost;

// Search space
// ------------
pub mod space;

// Data structures
// ---------------
pub mod data_structures;

// Algorithms
// ----------
pub mod algorithms;

// Maps
// ----
pub mod problems;
