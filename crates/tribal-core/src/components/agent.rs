//! Agent Components
//!
//! Individual survivors: identity, personality, and the flags the council reads.

use serde::{Deserialize, Serialize};
use tribal_events::AgentId;

/// Personality traits - fixed at creation
/// All values are 0.0 to 100.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    /// Plays the long game vs. plays it by ear
    pub strategy: f32,
    /// Need for company and conversation
    pub sociability: f32,
    /// How firmly they stick to commitments
    pub loyalty: f32,
    /// Willingness to make big, risky moves
    pub boldness: f32,
}

impl Default for Personality {
    fn default() -> Self {
        Self::uniform(50.0)
    }
}

impl Personality {
    pub fn new(strategy: f32, sociability: f32, loyalty: f32, boldness: f32) -> Self {
        Self {
            strategy: strategy.clamp(0.0, 100.0),
            sociability: sociability.clamp(0.0, 100.0),
            loyalty: loyalty.clamp(0.0, 100.0),
            boldness: boldness.clamp(0.0, 100.0),
        }
    }

    /// Every trait set to the same value
    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Mean absolute trait difference, 0.0 (identical) to 100.0 (opposites)
    pub fn distance(&self, other: &Personality) -> f32 {
        let diffs = [
            (self.strategy - other.strategy).abs(),
            (self.sociability - other.sociability).abs(),
            (self.loyalty - other.loyalty).abs(),
            (self.boldness - other.boldness).abs(),
        ];
        diffs.iter().sum::<f32>() / diffs.len() as f32
    }
}

/// A survivor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub is_human: bool,
    /// Holding a hidden immunity idol
    pub has_idol: bool,
    /// Won (or shares) challenge immunity for the next council
    pub has_immunity: bool,
    pub personality: Personality,
}

impl Agent {
    pub fn new(id: AgentId, name: impl Into<String>, personality: Personality) -> Self {
        Self {
            id,
            name: name.into(),
            is_human: false,
            has_idol: false,
            has_immunity: false,
            personality,
        }
    }

    pub fn human(mut self) -> Self {
        self.is_human = true;
        self
    }

    pub fn with_idol(mut self) -> Self {
        self.has_idol = true;
        self
    }

    pub fn with_immunity(mut self) -> Self {
        self.has_immunity = true;
        self
    }
}
