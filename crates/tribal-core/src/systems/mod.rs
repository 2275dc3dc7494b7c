//! Game Systems
//!
//! Camp life, alliance re-evaluation, voting decisions and the tribal council
//! engine.

pub mod alliance;
pub mod camp;
pub mod council;
pub mod voting;

pub use alliance::reevaluate_alliances;
pub use camp::{camp_day_system, simulate_camp_day};
pub use council::{run_council_system, run_tribal_council, CouncilReport, TribalCouncil};
pub use voting::{compute_bloc_votes, fallback_target, Ballot, BlocVote};
