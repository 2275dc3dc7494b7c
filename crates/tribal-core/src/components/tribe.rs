//! Tribe Components
//!
//! Tribes are ordered membership lists. Agents outlive tribe swaps and the
//! merge, so a tribe never owns its survivors.

use serde::{Deserialize, Serialize};
use tribal_events::AgentId;

/// Where the season stands relative to the merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Tribes compete as groups
    #[default]
    PreMerge,
    /// One tribe, individual immunity, eliminated survivors join the jury
    PostMerge,
}

impl GamePhase {
    pub fn is_post_merge(&self) -> bool {
        matches!(self, GamePhase::PostMerge)
    }
}

/// A voting unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tribe {
    pub name: String,
    /// Members in seating order; council iteration follows this order
    members: Vec<AgentId>,
    /// Won the immunity challenge and skips tribal council
    pub is_immune: bool,
}

impl Tribe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            is_immune: false,
        }
    }

    pub fn with_members(mut self, members: Vec<AgentId>) -> Self {
        self.members = members;
        self
    }

    pub fn members(&self) -> &[AgentId] {
        &self.members
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.members.contains(&agent)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add a member at the end of the seating order (no-op if present)
    pub fn add_member(&mut self, agent: AgentId) {
        if !self.contains(agent) {
            self.members.push(agent);
        }
    }

    /// Remove a member, returning whether they were present
    pub fn remove_member(&mut self, agent: AgentId) -> bool {
        let initial_len = self.members.len();
        self.members.retain(|m| *m != agent);
        self.members.len() < initial_len
    }
}
