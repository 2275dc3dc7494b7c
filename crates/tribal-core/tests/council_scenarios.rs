//! Council scenario tests
//!
//! Full councils driven through the public engine API against hand-built
//! tribes with known relationships.

use std::collections::BTreeSet;

use tribal_core::components::{Agent, AllianceRegistry, Personality, RelationshipGraph, Tribe};
use tribal_core::config::AllianceTuning;
use tribal_core::{AgentId, CouncilError, CouncilPhase, GameHost, Season, SimRng, TribalCouncil};
use tribal_events::fixtures::sample_council_log;
use tribal_events::CouncilEventKind;

const NAMES: [&str; 5] = ["Pat", "Nia", "Ned", "Noor", "Rudy"];

/// Five survivors on Tagi; agent 0 is the human. Everyone starts at 50.
fn tagi() -> (Season, RelationshipGraph, AllianceRegistry, SimRng) {
    let agents: Vec<Agent> = NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let agent = Agent::new(AgentId(i as u32), *name, Personality::default());
            if i == 0 {
                agent.human()
            } else {
                agent
            }
        })
        .collect();
    let mut graph = RelationshipGraph::default();
    for agent in &agents {
        graph.register(agent.id, agent.personality);
    }
    for a in 0..5 {
        for b in (a + 1)..5 {
            graph.set_mutual(AgentId(a), AgentId(b), 50.0).unwrap();
        }
    }
    let tribe = Tribe::new("Tagi").with_members((0..5).map(AgentId).collect());
    (
        Season::new(agents, vec![tribe]),
        graph,
        AllianceRegistry::new(AllianceTuning::default()),
        SimRng::seeded(2024),
    )
}

/// P=0 (human), N1..N4 = 1..4. {N2, N3} are allies who dislike N4; N4
/// dislikes N1; N1 dislikes P.
fn end_to_end_table() -> (Season, RelationshipGraph, AllianceRegistry, SimRng) {
    let (season, mut graph, mut registry, mut rng) = tagi();
    graph.set_mutual(AgentId(2), AgentId(3), 70.0).unwrap();
    registry
        .try_form(AgentId(2), AgentId(3), &mut graph, &mut rng.0)
        .unwrap()
        .unwrap();
    graph.set_affinity(AgentId(2), AgentId(4), 20.0).unwrap();
    graph.set_affinity(AgentId(3), AgentId(4), 20.0).unwrap();
    graph.set_affinity(AgentId(4), AgentId(1), 10.0).unwrap();
    graph.set_affinity(AgentId(1), AgentId(0), 10.0).unwrap();
    (season, graph, registry, rng)
}

#[test]
fn test_end_to_end_tie_and_revote() {
    let (mut season, mut graph, mut registry, mut rng) = end_to_end_table();
    assert_eq!(registry.alliances()[0].strength, 70.0);

    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);
    council.prepare(&season, "Tagi").unwrap();

    // P votes N1, and a stray self-vote is refused
    assert!(council.cast_vote(AgentId(0), AgentId(1)).unwrap());
    assert!(!council.cast_vote(AgentId(0), AgentId(0)).unwrap());

    let tally = council.count_votes().unwrap();
    assert_eq!(tally.votes_for(AgentId(1)), 2);
    assert_eq!(tally.votes_for(AgentId(4)), 2);
    assert_eq!(tally.votes_for(AgentId(0)), 1);
    assert!(tally.is_tied);
    assert_eq!(tally.tied, vec![AgentId(1), AgentId(4)]);
    assert_eq!(council.phase(), Some(CouncilPhase::Tied));

    // Revote among {P, N2, N3}, restricted to {N1, N4}
    council.begin_revote(&tally.tied).unwrap();
    assert!(!council.cast_vote(AgentId(2), AgentId(0)).unwrap());
    assert!(!council.cast_vote(AgentId(1), AgentId(4)).unwrap());
    assert!(council.cast_vote(AgentId(0), AgentId(1)).unwrap());

    let outcome = council.handle_tie_vote(&tally.tied).unwrap();
    assert!(!outcome.still_tied);
    assert_eq!(outcome.revote_count, 1);
    assert_eq!(outcome.candidate, Some(AgentId(4)));

    let elimination = council.process_elimination(&mut season, AgentId(4)).unwrap();
    assert_eq!(elimination.name, "Rudy");
    assert_eq!(elimination.votes_against, 2);
    assert!(!elimination.game_over);
    assert_eq!(season.remaining(), vec![AgentId(0), AgentId(1), AgentId(2), AgentId(3)]);
}

#[test]
fn test_end_to_end_matches_sample_log() {
    let (mut season, mut graph, mut registry, mut rng) = end_to_end_table();
    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);

    council.prepare(&season, "Tagi").unwrap();
    council.cast_vote(AgentId(0), AgentId(1)).unwrap();
    council.cast_vote(AgentId(0), AgentId(0)).unwrap();
    let tally = council.count_votes().unwrap();
    council.begin_revote(&tally.tied).unwrap();
    council.cast_vote(AgentId(0), AgentId(1)).unwrap();
    council.handle_tie_vote(&tally.tied).unwrap();
    council.process_elimination(&mut season, AgentId(4)).unwrap();

    // The sample log opens with the alliance forming at camp
    let expected: Vec<CouncilEventKind> = sample_council_log().into_iter().skip(1).map(|e| e.kind).collect();
    assert_eq!(council.drain_events(), expected);
}

#[test]
fn test_conservation_of_votes() {
    let (season, mut graph, mut registry, mut rng) = end_to_end_table();
    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);
    council.prepare(&season, "Tagi").unwrap();
    council.cast_vote(AgentId(0), AgentId(1)).unwrap();

    let tally = council.count_votes().unwrap();
    assert_eq!(tally.total, 5);
    assert_eq!(tally.counts.iter().map(|c| c.votes).sum::<u32>(), 5);

    // Tied survivors do not vote in the revote
    council.begin_revote(&tally.tied).unwrap();
    council.cast_vote(AgentId(0), AgentId(4)).unwrap();
    let outcome = council.handle_tie_vote(&tally.tied).unwrap();
    assert_eq!(outcome.tally.total, 3);
}

#[test]
fn test_no_self_votes_or_immune_targets() {
    let (mut season, mut graph, mut registry, mut rng) = tagi();
    season.agent_mut(AgentId(3)).unwrap().has_immunity = true;
    // Everyone loathes the immune survivor
    for voter in [0, 1, 2, 4] {
        graph.set_affinity(AgentId(voter), AgentId(3), 0.0).unwrap();
    }

    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);
    council.prepare(&season, "Tagi").unwrap();
    assert!(!council.cast_vote(AgentId(0), AgentId(3)).unwrap());
    council.cast_vote(AgentId(0), AgentId(1)).unwrap();
    council.count_votes().unwrap();

    let immune = council.immune_agents();
    for vote in council.current_votes().unwrap().votes() {
        assert_ne!(vote.voter, vote.target);
        assert!(!immune.contains(&vote.target));
    }
}

#[test]
fn test_idol_negation_keeps_ledger() {
    let (mut season, mut graph, mut registry, mut rng) = tagi();
    season.agent_mut(AgentId(2)).unwrap().has_idol = true;

    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);
    council.prepare(&season, "Tagi").unwrap();
    for voter in [0, 1, 3] {
        council.cast_vote(AgentId(voter), AgentId(2)).unwrap();
    }
    council.cast_vote(AgentId(2), AgentId(4)).unwrap();
    council.cast_vote(AgentId(4), AgentId(1)).unwrap();

    assert!(council.play_idol(&mut season, AgentId(2)).unwrap());
    // The idol is gone: a second play fails
    assert!(!council.play_idol(&mut season, AgentId(2)).unwrap());

    let tally = council.count_votes().unwrap();
    assert_eq!(tally.votes_for(AgentId(2)), 0);
    assert_eq!(tally.negated.len(), 3);

    let ledger = council.reveal();
    assert_eq!(ledger.len(), 5);
    let negated: Vec<_> = ledger.iter().filter(|e| e.negated).collect();
    assert_eq!(negated.len(), 3);
    assert!(negated.iter().all(|e| e.target == AgentId(2)));
}

#[test]
fn test_idol_cannot_be_played_after_counting() {
    let (mut season, mut graph, mut registry, mut rng) = tagi();
    season.agent_mut(AgentId(2)).unwrap().has_idol = true;

    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);
    council.prepare(&season, "Tagi").unwrap();
    council.count_votes().unwrap();

    assert!(matches!(
        council.play_idol(&mut season, AgentId(2)),
        Err(CouncilError::OutOfPhase { .. })
    ));
    assert!(season.agent(AgentId(2)).unwrap().has_idol);
}

/// A:0 B:1 C:2 D:3 E:4 with C immune and a 2-2 tie between A and B
fn rock_draw_drawers(post_merge: bool) -> BTreeSet<AgentId> {
    let (mut season, mut graph, mut registry, mut rng) = tagi();
    if post_merge {
        season.merge("Tagi");
    }
    season.agent_mut(AgentId(0)).unwrap().is_human = false;
    season.agent_mut(AgentId(2)).unwrap().has_immunity = true;

    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);
    council.prepare(&season, "Tagi").unwrap();
    for (voter, target) in [(0, 1), (1, 0), (2, 0), (3, 1), (4, 3)] {
        assert!(council.cast_vote(AgentId(voter), AgentId(target)).unwrap());
    }
    let tally = council.count_votes().unwrap();
    assert_eq!(tally.tied, vec![AgentId(0), AgentId(1)]);

    let eliminated = council.draw_rocks(&tally.tied).unwrap();
    let drawers = council
        .drain_events()
        .into_iter()
        .find_map(|e| match e {
            CouncilEventKind::RocksDrawn { drawers, .. } => Some(drawers),
            _ => None,
        })
        .unwrap();
    assert!(drawers.contains(&eliminated));

    let elimination = council.process_elimination(&mut season, eliminated).unwrap();
    assert!(elimination.by_rocks);
    assert_eq!(elimination.joins_jury, post_merge);

    drawers.into_iter().collect()
}

#[test]
fn test_rock_draw_exclusion_pre_merge() {
    let expected: BTreeSet<_> = [AgentId(2), AgentId(3), AgentId(4)].into_iter().collect();
    assert_eq!(rock_draw_drawers(false), expected);
}

#[test]
fn test_rock_draw_exclusion_post_merge() {
    let expected: BTreeSet<_> = [AgentId(3), AgentId(4)].into_iter().collect();
    assert_eq!(rock_draw_drawers(true), expected);
}

#[test]
fn test_human_elimination_is_game_over() {
    let (mut season, mut graph, mut registry, mut rng) = tagi();
    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);
    council.prepare(&season, "Tagi").unwrap();
    for voter in 1..5 {
        council.cast_vote(AgentId(voter), AgentId(0)).unwrap();
    }
    council.cast_vote(AgentId(0), AgentId(1)).unwrap();
    council.count_votes().unwrap();

    let elimination = council.process_elimination(&mut season, AgentId(0)).unwrap();
    assert!(elimination.game_over);
    assert!(season.is_game_over());
    assert!(season.player_agent().is_none());
}

#[test]
fn test_bloc_precedence_at_council() {
    let (season, mut graph, mut registry, mut rng) = tagi();
    // Weak {1,2} formed first, strong {2,3} second; 2 belongs to both
    graph.set_mutual(AgentId(1), AgentId(2), 61.0).unwrap();
    graph.set_mutual(AgentId(2), AgentId(3), 95.0).unwrap();
    registry.try_form(AgentId(1), AgentId(2), &mut graph, &mut rng.0).unwrap();
    registry.try_form(AgentId(2), AgentId(3), &mut graph, &mut rng.0).unwrap();
    graph.set_affinity(AgentId(1), AgentId(0), 5.0).unwrap();
    graph.set_affinity(AgentId(2), AgentId(0), 30.0).unwrap();
    graph.set_affinity(AgentId(2), AgentId(4), 5.0).unwrap();
    graph.set_affinity(AgentId(3), AgentId(4), 5.0).unwrap();

    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);
    council.prepare(&season, "Tagi").unwrap();
    assert_eq!(council.suggest_vote(AgentId(2)).unwrap(), Some(AgentId(4)));
    assert_eq!(council.suggest_vote(AgentId(3)).unwrap(), Some(AgentId(4)));
}

/// `count` NPC survivors on Tagi, all neutral toward each other
fn open_tribe(count: u32) -> (Season, RelationshipGraph, AllianceRegistry, SimRng) {
    let agents: Vec<Agent> = (0..count)
        .map(|i| Agent::new(AgentId(i), format!("S{}", i), Personality::default()))
        .collect();
    let mut graph = RelationshipGraph::default();
    for agent in &agents {
        graph.register(agent.id, agent.personality);
    }
    for a in 0..count {
        for b in (a + 1)..count {
            graph.set_mutual(AgentId(a), AgentId(b), 50.0).unwrap();
        }
    }
    let tribe = Tribe::new("Tagi").with_members((0..count).map(AgentId).collect());
    (
        Season::new(agents, vec![tribe]),
        graph,
        AllianceRegistry::new(AllianceTuning::default()),
        SimRng::seeded(77),
    )
}

fn cast_all(council: &mut TribalCouncil<'_>, votes: &[(u32, u32)]) {
    for &(voter, target) in votes {
        assert!(
            council.cast_vote(AgentId(voter), AgentId(target)).unwrap(),
            "vote {} -> {} refused",
            voter,
            target
        );
    }
}

fn rocks_event(events: Vec<CouncilEventKind>) -> (Vec<AgentId>, AgentId, bool) {
    events
        .into_iter()
        .find_map(|e| match e {
            CouncilEventKind::RocksDrawn {
                drawers,
                eliminated,
                fallback,
            } => Some((drawers, eliminated, fallback)),
            _ => None,
        })
        .unwrap()
}

#[test]
fn test_still_tied_revote_goes_to_rocks() {
    let (mut season, mut graph, mut registry, mut rng) = open_tribe(6);
    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);
    council.prepare(&season, "Tagi").unwrap();

    // 0:2, 1:2, 4:1, 5:1
    cast_all(&mut council, &[(0, 1), (1, 0), (2, 0), (3, 1), (4, 5), (5, 4)]);
    let tally = council.count_votes().unwrap();
    assert_eq!(tally.tied, vec![AgentId(0), AgentId(1)]);

    council.begin_revote(&tally.tied).unwrap();
    cast_all(&mut council, &[(2, 0), (3, 1), (4, 0), (5, 1)]);
    let outcome = council.handle_tie_vote(&tally.tied).unwrap();
    assert!(outcome.still_tied);
    assert_eq!(outcome.revote_count, 1);
    assert_eq!(outcome.tied, vec![AgentId(0), AgentId(1)]);
    assert_eq!(outcome.candidate, None);
    assert_eq!(council.phase(), Some(CouncilPhase::StillTied));

    let eliminated = council.draw_rocks(&outcome.tied).unwrap();
    assert!(![AgentId(0), AgentId(1)].contains(&eliminated));
    let (drawers, drawn, fallback) = rocks_event(council.drain_events());
    assert_eq!(drawers, vec![AgentId(2), AgentId(3), AgentId(4), AgentId(5)]);
    assert_eq!(drawn, eliminated);
    assert!(!fallback);

    let elimination = council.process_elimination(&mut season, eliminated).unwrap();
    assert!(elimination.by_rocks);
    assert_eq!(elimination.votes_against, 0);
    assert_eq!(season.remaining().len(), 5);
}

#[test]
fn test_revote_can_narrow_the_tie() {
    let (mut season, mut graph, mut registry, mut rng) = open_tribe(7);
    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);
    council.prepare(&season, "Tagi").unwrap();

    // 0:2, 1:2, 2:2, 3:1
    cast_all(
        &mut council,
        &[(0, 1), (1, 2), (2, 0), (3, 0), (4, 1), (5, 2), (6, 3)],
    );
    let tally = council.count_votes().unwrap();
    assert_eq!(tally.tied, vec![AgentId(0), AgentId(1), AgentId(2)]);

    council.begin_revote(&tally.tied).unwrap();
    cast_all(&mut council, &[(3, 0), (4, 1), (5, 0), (6, 1)]);
    let outcome = council.handle_tie_vote(&tally.tied).unwrap();
    assert!(outcome.still_tied);
    assert_eq!(outcome.tied, vec![AgentId(0), AgentId(1)]);

    // The narrowed tie replaces the original one
    assert_eq!(
        council.handle_tie_vote(&tally.tied),
        Err(CouncilError::InvalidTieSet(tally.tied.clone()))
    );

    // Agent 2 is out of the tie and votes again
    council.begin_revote(&outcome.tied).unwrap();
    cast_all(&mut council, &[(2, 0), (3, 0), (4, 0), (5, 1), (6, 1)]);
    let second = council.handle_tie_vote(&outcome.tied).unwrap();
    assert!(!second.still_tied);
    assert_eq!(second.revote_count, 2);
    assert_eq!(second.candidate, Some(AgentId(0)));

    let elimination = council.process_elimination(&mut season, AgentId(0)).unwrap();
    assert_eq!(elimination.votes_against, 3);
    assert!(!elimination.by_rocks);
}

#[test]
fn test_deadlocked_revote_falls_back_to_tied_agents() {
    // Everyone is tied, so nobody can revote and nobody can draw
    let (mut season, mut graph, mut registry, mut rng) = open_tribe(3);
    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);
    council.prepare(&season, "Tagi").unwrap();

    cast_all(&mut council, &[(0, 1), (1, 2), (2, 0)]);
    let tally = council.count_votes().unwrap();
    assert_eq!(tally.tied.len(), 3);

    let outcome = council.handle_tie_vote(&tally.tied).unwrap();
    assert!(outcome.still_tied);
    assert_eq!(outcome.tally.total, 0);
    assert_eq!(outcome.tied, tally.tied);
    assert_eq!(council.phase(), Some(CouncilPhase::StillTied));

    let eliminated = council.draw_rocks(&outcome.tied).unwrap();
    assert!(tally.tied.contains(&eliminated));
    let (drawers, drawn, fallback) = rocks_event(council.drain_events());
    assert!(drawers.is_empty());
    assert_eq!(drawn, eliminated);
    assert!(fallback);

    let elimination = council.process_elimination(&mut season, eliminated).unwrap();
    assert!(elimination.by_rocks);
    assert_eq!(season.remaining().len(), 2);
}

#[test]
fn test_post_merge_vote_seats_juror() {
    let (mut season, mut graph, mut registry, mut rng) = tagi();
    season.merge("Solana");

    let mut council = TribalCouncil::new(&mut graph, &mut registry, &mut rng);
    council.prepare(&season, "Solana").unwrap();
    cast_all(&mut council, &[(0, 4), (1, 4), (2, 4), (3, 4), (4, 0)]);
    let tally = council.count_votes().unwrap();
    assert_eq!(tally.candidate, Some(AgentId(4)));

    let elimination = council.process_elimination(&mut season, AgentId(4)).unwrap();
    assert!(elimination.joins_jury);
    assert!(!elimination.by_rocks);
    assert_eq!(elimination.votes_against, 4);
    assert_eq!(season.jury(), &[AgentId(4)]);
}
