//! Tribal Council Engine Library
//!
//! Relationship graph, alliance registry and the vote resolution engine for a
//! survivor-style elimination game, plus a seeded season runner around them.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

pub mod components;
pub mod config;
pub mod events;
pub mod host;
pub mod output;
pub mod season;
pub mod setup;
pub mod systems;

pub use components::*;
pub use config::Config;
pub use host::{Elimination, GameHost};
pub use season::Season;
pub use systems::council::{
    CouncilError, CouncilPhase, TieVoteOutcome, TribalCouncil, VoteRecord, VoteTally,
};

// Re-export the shared identifier types
pub use tribal_events::{AgentId, AllianceId};

/// Seeded random number generator resource.
///
/// Every random draw in the game goes through this one source, so a seed
/// replays a season exactly.
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }
}
