//! Game Host Interface
//!
//! The council engine never reaches for global game state. Whatever runs the
//! season implements [`GameHost`] and is handed to the engine per call.

use serde::{Deserialize, Serialize};
use tribal_events::AgentId;

use crate::components::agent::Agent;
use crate::components::tribe::{GamePhase, Tribe};

/// The outcome of `process_elimination`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Elimination {
    pub agent: AgentId,
    pub name: String,
    pub tribe: String,
    /// Counted votes against the agent in the deciding tally (0 for rocks)
    pub votes_against: u32,
    pub by_rocks: bool,
    /// The human player is out: the game is over for them
    pub game_over: bool,
    pub joins_jury: bool,
}

/// The surrounding game, as seen by the council engine
pub trait GameHost {
    /// All current tribes
    fn tribes(&self) -> &[Tribe];

    /// The tribe the human player belongs to
    fn player_tribe(&self) -> Option<&Tribe> {
        let player = self.player_agent()?.id;
        self.tribes().iter().find(|t| t.contains(player))
    }

    /// The human player, while still in the game
    fn player_agent(&self) -> Option<&Agent>;

    fn agent(&self, id: AgentId) -> Option<&Agent>;

    fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent>;

    fn tribe_mut(&mut self, name: &str) -> Option<&mut Tribe>;

    fn phase(&self) -> GamePhase;

    /// Seat an eliminated survivor on the jury
    fn add_juror(&mut self, agent: AgentId);

    /// Notified once per elimination, after membership has been updated
    fn on_eliminated(&mut self, elimination: &Elimination);
}
