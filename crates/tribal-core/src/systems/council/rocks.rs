//! Rock draw eligibility and the draw itself.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use tribal_events::AgentId;

/// Members who must draw a rock, in seating order.
///
/// Tied survivors never draw. An idol played this round protects. Challenge
/// immunity only protects after the merge; tribal immunity earned before the
/// merge does not.
pub fn rock_drawers(
    members: &[AgentId],
    tied: &[AgentId],
    challenge_immune: &BTreeSet<AgentId>,
    idol_protected: &BTreeSet<AgentId>,
    post_merge: bool,
) -> Vec<AgentId> {
    members
        .iter()
        .copied()
        .filter(|m| !tied.contains(m))
        .filter(|m| !idol_protected.contains(m))
        .filter(|m| !(post_merge && challenge_immune.contains(m)))
        .collect()
}

/// Result of a rock draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RockDraw {
    pub eliminated: AgentId,
    /// Nobody could draw, so a tied survivor was picked instead
    pub fallback: bool,
}

/// Draw rocks among `drawers`; with nobody to draw, pick among `tied`.
///
/// Returns `None` only when both lists are empty.
pub fn draw_rock(drawers: &[AgentId], tied: &[AgentId], rng: &mut impl Rng) -> Option<RockDraw> {
    match drawers {
        [] => tied.choose(rng).map(|&eliminated| RockDraw {
            eliminated,
            fallback: true,
        }),
        [only] => Some(RockDraw {
            eliminated: *only,
            fallback: false,
        }),
        _ => drawers.choose(rng).map(|&eliminated| RockDraw {
            eliminated,
            fallback: false,
        }),
    }
}
