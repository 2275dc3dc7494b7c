//! Identifier Types
//!
//! Stable integer identifiers shared by the engine and everything reading its output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, stable identifier for a survivor.
///
/// Ids are assigned once at cast creation and never reused, so they stay valid
/// across tribe swaps, the merge, and elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent_{:03}", self.0)
    }
}

impl From<u32> for AgentId {
    fn from(value: u32) -> Self {
        AgentId(value)
    }
}

/// Unique identifier for an alliance. Never reused after dissolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllianceId(pub u32);

impl fmt::Display for AllianceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alliance_{:03}", self.0)
    }
}
