//! Summary Types
//!
//! The vote reveal ledger and end-of-season summary output.

use serde::{Deserialize, Serialize};

use crate::AgentId;

/// One parchment in the vote reveal.
///
/// Votes cancelled by an idol still appear here, flagged `negated`, so the
/// reveal can announce "does not count".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealEntry {
    pub voter: AgentId,
    pub target: AgentId,
    #[serde(default)]
    pub negated: bool,
}

/// A single elimination in the season record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EliminationRecord {
    pub day: u32,
    pub council: u32,
    pub agent: AgentId,
    pub name: String,
    pub tribe: String,
    /// Counted votes against the agent in the deciding tally
    pub votes_against: u32,
    #[serde(default)]
    pub by_rocks: bool,
    #[serde(default)]
    pub joins_jury: bool,
}

/// Summary written at the end of a season run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub seed: u64,
    pub days_played: u32,
    pub councils_held: u32,
    pub eliminations: Vec<EliminationRecord>,
    pub jury: Vec<AgentId>,
    /// Survivors still in the game when the run stopped
    pub remaining: Vec<AgentId>,
    /// True when the human player was voted out
    pub player_eliminated: bool,
}

impl SeasonSummary {
    /// Number of eliminations decided by drawing rocks.
    pub fn rock_draws(&self) -> usize {
        self.eliminations.iter().filter(|e| e.by_rocks).count()
    }

    /// Finds the record for a specific agent, if they were eliminated.
    pub fn elimination_of(&self, agent: AgentId) -> Option<&EliminationRecord> {
        self.eliminations.iter().find(|e| e.agent == agent)
    }
}
