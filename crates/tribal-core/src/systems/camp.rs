//! Camp Life
//!
//! Between councils survivors talk, bond and fall out. Each interaction moves
//! affinity between a random pair of tribemates, nudged by how alike their
//! personalities are, and alliances are re-evaluated for every touched pair.

use bevy_ecs::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use tribal_events::AgentId;

use crate::components::alliance::{AllianceChange, AllianceRegistry};
use crate::components::social::{RelationshipGraph, SocialError};
use crate::config::{Config, SeasonTuning};
use crate::events::EventLogger;
use crate::host::GameHost;
use crate::season::Season;
use crate::systems::alliance::reevaluate_alliances;
use crate::SimRng;

/// Simulate one day at camp. Returns the alliance changes it caused.
pub fn simulate_camp_day(
    season: &mut Season,
    graph: &mut RelationshipGraph,
    registry: &mut AllianceRegistry,
    rng: &mut impl Rng,
    tuning: &SeasonTuning,
) -> Result<Vec<AllianceChange>, SocialError> {
    let mut changes = Vec::new();
    let tribes: Vec<Vec<AgentId>> = season.tribes().iter().map(|t| t.members().to_vec()).collect();

    for members in &tribes {
        if members.len() < 2 {
            continue;
        }
        for _ in 0..tuning.interactions_per_day {
            let pair: Vec<AgentId> = members.choose_multiple(rng, 2).copied().collect();
            let (a, b) = (pair[0], pair[1]);
            let delta = interaction_delta(season, a, b, tuning.affinity_swing, rng);
            graph.change_affinity(a, b, delta, rng)?;
            changes.extend(reevaluate_alliances(registry, graph, rng, a, b)?);
        }
    }

    registry.refresh_strengths(graph, rng)?;
    find_idol(season, rng, tuning.idol_find_chance);
    Ok(changes)
}

/// Affinity change from one conversation: random, tilted toward liking
/// people who think alike
fn interaction_delta(season: &Season, a: AgentId, b: AgentId, swing: f32, rng: &mut impl Rng) -> f32 {
    let compatibility = match (season.agent(a), season.agent(b)) {
        (Some(a), Some(b)) => 1.0 - a.personality.distance(&b.personality) / 100.0,
        _ => 0.5,
    };
    let noise = if swing > 0.0 { rng.gen_range(-swing..swing) } else { 0.0 };
    noise + (compatibility - 0.5) * swing
}

/// Somebody without an idol may stumble on one
fn find_idol(season: &mut Season, rng: &mut impl Rng, chance: f32) {
    if rng.gen::<f32>() >= chance {
        return;
    }
    let searchers: Vec<AgentId> = season
        .remaining()
        .into_iter()
        .filter(|id| season.agent(*id).is_some_and(|a| !a.has_idol))
        .collect();
    let Some(&finder) = searchers.choose(rng) else {
        return;
    };
    if let Some(agent) = season.agent_mut(finder) {
        agent.has_idol = true;
        tracing::info!("{} found a hidden immunity idol", agent.name);
    }
}

/// System: advance the day and simulate camp life
pub fn camp_day_system(
    config: Res<Config>,
    mut season: ResMut<Season>,
    mut graph: ResMut<RelationshipGraph>,
    mut registry: ResMut<AllianceRegistry>,
    mut rng: ResMut<SimRng>,
    mut logger: ResMut<EventLogger>,
) {
    if season.is_finished(config.season.final_size) {
        return;
    }
    season.day += 1;
    let (day, council) = (season.day, season.councils_held);

    let result = simulate_camp_day(&mut season, &mut graph, &mut registry, &mut rng.0, &config.season);
    match result {
        Ok(changes) => {
            for change in changes {
                if let Err(e) = logger.log(day, council, change.to_event_kind()) {
                    tracing::warn!("Failed to log alliance change: {}", e);
                }
            }
        }
        Err(e) => tracing::error!("Camp day {} failed: {}", day, e),
    }
}
