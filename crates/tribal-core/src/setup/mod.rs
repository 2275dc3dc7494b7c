//! Season Setup
//!
//! Cast generation, tribe split, and the first round of relationships.

pub mod cast;

pub use cast::*;
