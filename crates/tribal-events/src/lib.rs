//! Shared event types and serialization for the tribal council simulation.
//!
//! This crate contains pure data structures with no game logic.
//! It is a dependency for all other crates in the workspace.

pub mod event;
pub mod ids;
pub mod summary;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

// Re-export identifier types
pub use ids::{AgentId, AllianceId};

// Re-export event types
pub use event::*;

// Re-export summary types
pub use summary::{EliminationRecord, RevealEntry, SeasonSummary};
