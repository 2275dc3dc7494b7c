//! Council Runner
//!
//! Drives one tribal council from start to finish the way the season loop
//! needs it: the human is put on autopilot, NPCs decide through alliances and
//! relationships, idols are played, ties go to a revote and then to rocks.

use bevy_ecs::prelude::*;
use tribal_events::{AgentId, CouncilEventKind, RevealEntry};

use super::{CouncilError, TribalCouncil};
use crate::components::alliance::AllianceRegistry;
use crate::components::social::RelationshipGraph;
use crate::config::Config;
use crate::events::EventLogger;
use crate::host::{Elimination, GameHost};
use crate::season::Season;
use crate::SimRng;

/// What happened at one council
#[derive(Debug, Clone)]
pub struct CouncilReport {
    pub tribe: String,
    /// `None` when every counted vote was cancelled
    pub elimination: Option<Elimination>,
    /// Ledger of the deciding pass
    pub reveal: Vec<RevealEntry>,
    pub revotes: u32,
    pub events: Vec<CouncilEventKind>,
}

/// Run a full council for `tribe`.
///
/// At most `max_revotes` revote passes are held before the remaining tie is
/// settled by drawing rocks.
pub fn run_tribal_council<H: GameHost>(
    council: &mut TribalCouncil<'_>,
    host: &mut H,
    tribe: &str,
    max_revotes: u32,
) -> Result<CouncilReport, CouncilError> {
    council.prepare(host, tribe)?;
    autopilot_humans(council)?;
    council.collect_npc_votes()?;
    play_idols(council, host)?;

    let mut reveal = council.reveal();
    let mut tally = council.count_votes()?;
    let mut revotes = 0;

    let eliminated = loop {
        if !tally.is_tied {
            break tally.candidate;
        }
        if revotes >= max_revotes {
            break Some(council.draw_rocks(&tally.tied)?);
        }
        council.begin_revote(&tally.tied)?;
        autopilot_humans(council)?;
        let outcome = council.handle_tie_vote(&tally.tied)?;
        revotes = outcome.revote_count;
        reveal = council.reveal();
        tally = outcome.tally;
    };

    let elimination = match eliminated {
        Some(agent) => Some(council.process_elimination(host, agent)?),
        None => {
            council.adjourn()?;
            None
        }
    };

    Ok(CouncilReport {
        tribe: tribe.to_string(),
        elimination,
        reveal,
        revotes,
        events: council.drain_events(),
    })
}

/// Cast the engine's suggested vote for every human at council
fn autopilot_humans(council: &mut TribalCouncil<'_>) -> Result<(), CouncilError> {
    let humans: Vec<AgentId> = council
        .round()
        .map(|r| r.humans.iter().copied().collect())
        .unwrap_or_default();
    for human in humans {
        if let Some(target) = council.suggest_vote(human)? {
            council.cast_vote(human, target)?;
        }
    }
    Ok(())
}

/// Idol holders play their idol when they would otherwise be going home
fn play_idols<H: GameHost>(council: &mut TribalCouncil<'_>, host: &mut H) -> Result<(), CouncilError> {
    let Some(round) = council.round() else {
        return Err(CouncilError::NoActiveRound);
    };

    let mut against: Vec<(AgentId, u32)> = Vec::new();
    for vote in round.votes.votes() {
        match against.iter_mut().find(|(a, _)| *a == vote.target) {
            Some((_, n)) => *n += 1,
            None => against.push((vote.target, 1)),
        }
    }
    let most = against.iter().map(|(_, n)| *n).max().unwrap_or(0);

    let holders: Vec<AgentId> = round
        .members
        .iter()
        .copied()
        .filter(|m| host.agent(*m).is_some_and(|a| a.has_idol))
        .filter(|m| most > 0 && against.contains(&(*m, most)))
        .collect();

    for holder in holders {
        council.play_idol(host, holder)?;
    }
    Ok(())
}

/// System: hold tribal council on council days
///
/// Immunity is awarded first, then the losing tribe (or everyone but the
/// immunity winner after the merge) votes someone out. The merge happens as
/// soon as few enough survivors remain.
pub fn run_council_system(
    config: Res<Config>,
    mut season: ResMut<Season>,
    mut graph: ResMut<RelationshipGraph>,
    mut registry: ResMut<AllianceRegistry>,
    mut rng: ResMut<SimRng>,
    mut logger: ResMut<EventLogger>,
) {
    let tuning = &config.season;
    if season.is_finished(tuning.final_size) || !season.is_council_day(tuning.days_between_councils) {
        return;
    }

    let Some(tribe) = season.award_immunity(&mut rng.0) else {
        tracing::warn!("Day {}: no tribe can attend council", season.day);
        return;
    };
    season.councils_held += 1;
    let (day, council_no) = (season.day, season.councils_held);

    let result = {
        let mut council = TribalCouncil::new(&mut *graph, &mut *registry, &mut *rng);
        run_tribal_council(&mut council, &mut *season, &tribe, tuning.max_revotes)
    };
    season.clear_immunity();

    match result {
        Ok(report) => {
            for kind in report.events {
                if let Err(e) = logger.log(day, council_no, kind) {
                    tracing::warn!("Failed to log council event: {}", e);
                }
            }
        }
        Err(e) => {
            tracing::error!("Council {} for {} failed: {}", council_no, tribe, e);
            return;
        }
    }

    if !season.phase().is_post_merge() && season.remaining().len() <= tuning.merge_at {
        let members = season.merge(&tuning.merged_tribe_name);
        tracing::info!("Day {}: the tribes merge into {}", day, tuning.merged_tribe_name);
        let kind = CouncilEventKind::TribesMerged {
            tribe: tuning.merged_tribe_name.clone(),
            members,
        };
        if let Err(e) = logger.log(day, council_no, kind) {
            tracing::warn!("Failed to log merge event: {}", e);
        }
    }
}
