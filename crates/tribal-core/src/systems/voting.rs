//! Voting Decisions
//!
//! How NPCs pick a target: alliances vote as blocs, strongest alliance first,
//! and anyone left over votes for the tribemate they like least.

use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use tribal_events::{AgentId, AllianceId};

use crate::components::alliance::{measure_strength, AllianceRegistry};
use crate::components::social::{RelationshipGraph, SocialError};

/// Who may vote and who may be voted for in one pass of a council.
#[derive(Debug, Clone, Copy)]
pub struct Ballot<'a> {
    /// Everyone at council, in seating order
    pub members: &'a [AgentId],
    pub humans: &'a BTreeSet<AgentId>,
    /// Challenge immunity: cannot be targeted at all
    pub immune: &'a BTreeSet<AgentId>,
    /// Members who sit out this pass (tied survivors during a revote)
    pub barred_voters: &'a BTreeSet<AgentId>,
    /// Revote restriction: only these may be voted for
    pub allowed_targets: Option<&'a BTreeSet<AgentId>>,
}

impl<'a> Ballot<'a> {
    pub fn can_vote(&self, voter: AgentId) -> bool {
        self.members.contains(&voter) && !self.barred_voters.contains(&voter)
    }

    /// Whether anyone may vote for `target` in this pass
    pub fn is_open_target(&self, target: AgentId) -> bool {
        self.members.contains(&target)
            && !self.immune.contains(&target)
            && self.allowed_targets.map_or(true, |t| t.contains(&target))
    }

    pub fn is_valid_vote(&self, voter: AgentId, target: AgentId) -> bool {
        voter != target && self.can_vote(voter) && self.is_open_target(target)
    }

    /// NPCs who still need a decision, in seating order
    pub fn npc_voters(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.members
            .iter()
            .copied()
            .filter(|m| !self.humans.contains(m) && self.can_vote(*m))
    }
}

/// A vote assigned by an alliance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlocVote {
    pub target: AgentId,
    pub alliance: AllianceId,
}

/// Assign bloc votes for every alliance with at least two voting members
/// present, strongest alliance first. A voter keeps the first assignment
/// they receive.
pub fn compute_bloc_votes(
    registry: &AllianceRegistry,
    graph: &mut RelationshipGraph,
    rng: &mut impl Rng,
    ballot: &Ballot<'_>,
) -> Result<BTreeMap<AgentId, BlocVote>, SocialError> {
    let mut relevant = Vec::new();
    for alliance in registry.alliances() {
        let voting: Vec<AgentId> = alliance
            .members()
            .iter()
            .copied()
            .filter(|m| !ballot.humans.contains(m) && ballot.can_vote(*m))
            .collect();
        if voting.len() < 2 {
            continue;
        }
        let strength = measure_strength(alliance.members(), graph, rng)?;
        relevant.push((alliance, voting, strength));
    }

    // Stable sort: equal strengths keep creation order
    relevant.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    let mut assigned = BTreeMap::new();
    for (alliance, voting, strength) in relevant {
        let mut best: Option<(AgentId, f32)> = None;
        for &candidate in ballot.members {
            if alliance.contains(candidate) || !ballot.is_open_target(candidate) {
                continue;
            }
            let mut total = 0.0;
            for &voter in &voting {
                total += graph.get_affinity(voter, candidate, rng)?;
            }
            let mean = total / voting.len() as f32;
            if best.map_or(true, |(_, lowest)| mean < lowest) {
                best = Some((candidate, mean));
            }
        }

        let Some((target, mean)) = best else {
            tracing::debug!("{} has no valid target", alliance.id);
            continue;
        };
        tracing::debug!(
            "{} (strength {:.1}) targets {} (mean affinity {:.1})",
            alliance.id,
            strength,
            target,
            mean
        );
        for voter in voting {
            assigned.entry(voter).or_insert(BlocVote {
                target,
                alliance: alliance.id,
            });
        }
    }

    Ok(assigned)
}

/// The open target `voter` likes least; first in seating order on ties.
///
/// `None` when nobody can be voted for. A random pick among open targets
/// would draw from the same empty set, so the voter abstains.
pub fn fallback_target(
    graph: &mut RelationshipGraph,
    rng: &mut impl Rng,
    ballot: &Ballot<'_>,
    voter: AgentId,
) -> Result<Option<AgentId>, SocialError> {
    let mut best: Option<(AgentId, f32)> = None;
    for &candidate in ballot.members {
        if !ballot.is_valid_vote(voter, candidate) {
            continue;
        }
        let affinity = graph.get_affinity(voter, candidate, rng)?;
        if best.map_or(true, |(_, lowest)| affinity < lowest) {
            best = Some((candidate, affinity));
        }
    }
    Ok(best.map(|(target, _)| target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::agent::Personality;
    use crate::config::AllianceTuning;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn ids(raw: &[u32]) -> Vec<AgentId> {
        raw.iter().map(|&i| AgentId(i)).collect()
    }

    fn set(raw: &[u32]) -> BTreeSet<AgentId> {
        raw.iter().map(|&i| AgentId(i)).collect()
    }

    /// Everyone starts neutral (50) toward everyone
    fn neutral_graph(count: u32) -> RelationshipGraph {
        let mut graph = RelationshipGraph::default();
        for id in 0..count {
            graph.register(AgentId(id), Personality::default());
        }
        for a in 0..count {
            for b in (a + 1)..count {
                graph.set_mutual(AgentId(a), AgentId(b), 50.0).unwrap();
            }
        }
        graph
    }

    #[test]
    fn test_ballot_rules() {
        let members = ids(&[0, 1, 2, 3]);
        let humans = set(&[0]);
        let immune = set(&[3]);
        let barred = set(&[1, 2]);
        let allowed = set(&[1, 2]);
        let ballot = Ballot {
            members: &members,
            humans: &humans,
            immune: &immune,
            barred_voters: &barred,
            allowed_targets: Some(&allowed),
        };

        assert!(ballot.is_valid_vote(AgentId(0), AgentId(1)));
        assert!(!ballot.is_valid_vote(AgentId(1), AgentId(2)), "tied survivors do not vote");
        assert!(!ballot.is_valid_vote(AgentId(0), AgentId(3)), "immune target");
        assert!(!ballot.is_valid_vote(AgentId(0), AgentId(9)), "not at council");
        assert_eq!(ballot.npc_voters().count(), 0);
    }

    #[test]
    fn test_fallback_picks_lowest_affinity_first_in_order() {
        let mut graph = neutral_graph(4);
        let mut rng = SmallRng::seed_from_u64(1);
        graph.set_affinity(AgentId(0), AgentId(2), 30.0).unwrap();
        graph.set_affinity(AgentId(0), AgentId(3), 30.0).unwrap();

        let members = ids(&[0, 1, 2, 3]);
        let empty = BTreeSet::new();
        let ballot = Ballot {
            members: &members,
            humans: &empty,
            immune: &empty,
            barred_voters: &empty,
            allowed_targets: None,
        };

        let target = fallback_target(&mut graph, &mut rng, &ballot, AgentId(0)).unwrap();
        assert_eq!(target, Some(AgentId(2)));
    }

    #[test]
    fn test_fallback_skips_immune_and_self() {
        let mut graph = neutral_graph(3);
        let mut rng = SmallRng::seed_from_u64(1);
        graph.set_affinity(AgentId(0), AgentId(1), 5.0).unwrap();

        let members = ids(&[0, 1, 2]);
        let immune = set(&[1]);
        let empty = BTreeSet::new();
        let ballot = Ballot {
            members: &members,
            humans: &empty,
            immune: &immune,
            barred_voters: &empty,
            allowed_targets: None,
        };

        let target = fallback_target(&mut graph, &mut rng, &ballot, AgentId(0)).unwrap();
        assert_eq!(target, Some(AgentId(2)));

        let lonely = ids(&[0, 1]);
        let ballot = Ballot { members: &lonely, ..ballot };
        assert_eq!(fallback_target(&mut graph, &mut rng, &ballot, AgentId(0)).unwrap(), None);
    }

    #[test]
    fn test_stronger_alliance_wins_shared_member() {
        let mut graph = neutral_graph(6);
        let mut rng = SmallRng::seed_from_u64(2);
        let mut registry = AllianceRegistry::new(AllianceTuning::default());

        // Weak alliance {1,2} created first, strong alliance {2,3} second
        graph.set_mutual(AgentId(1), AgentId(2), 62.0).unwrap();
        graph.set_mutual(AgentId(2), AgentId(3), 90.0).unwrap();
        let weak = registry.try_form(AgentId(1), AgentId(2), &mut graph, &mut rng).unwrap().unwrap();
        let strong = registry.try_form(AgentId(2), AgentId(3), &mut graph, &mut rng).unwrap().unwrap();

        // Weak alliance dislikes 4, strong alliance dislikes 5
        graph.set_affinity(AgentId(1), AgentId(4), 10.0).unwrap();
        graph.set_affinity(AgentId(2), AgentId(4), 10.0).unwrap();
        graph.set_affinity(AgentId(2), AgentId(5), 5.0).unwrap();
        graph.set_affinity(AgentId(3), AgentId(5), 5.0).unwrap();

        let members = ids(&[0, 1, 2, 3, 4, 5]);
        let empty = BTreeSet::new();
        let ballot = Ballot {
            members: &members,
            humans: &empty,
            immune: &empty,
            barred_voters: &empty,
            allowed_targets: None,
        };

        let votes = compute_bloc_votes(&registry, &mut graph, &mut rng, &ballot).unwrap();

        assert_eq!(votes[&AgentId(2)], BlocVote { target: AgentId(5), alliance: strong });
        assert_eq!(votes[&AgentId(3)], BlocVote { target: AgentId(5), alliance: strong });
        // The weak alliance still votes its own target with its remaining member
        assert_eq!(votes[&AgentId(1)].alliance, weak);
        assert_eq!(votes.len(), 3);
    }

    #[test]
    fn test_humans_are_not_assigned_bloc_votes() {
        let mut graph = neutral_graph(4);
        let mut rng = SmallRng::seed_from_u64(3);
        let mut registry = AllianceRegistry::new(AllianceTuning::default());

        graph.set_mutual(AgentId(0), AgentId(1), 80.0).unwrap();
        graph.set_mutual(AgentId(0), AgentId(2), 80.0).unwrap();
        graph.set_mutual(AgentId(1), AgentId(2), 80.0).unwrap();
        let duo = registry.try_form(AgentId(0), AgentId(1), &mut graph, &mut rng).unwrap().unwrap();
        registry.add_member(duo, AgentId(2), &mut graph, &mut rng).unwrap();

        let members = ids(&[0, 1, 2, 3]);
        let humans = set(&[0]);
        let empty = BTreeSet::new();
        let ballot = Ballot {
            members: &members,
            humans: &humans,
            immune: &empty,
            barred_voters: &empty,
            allowed_targets: None,
        };

        let votes = compute_bloc_votes(&registry, &mut graph, &mut rng, &ballot).unwrap();
        assert!(!votes.contains_key(&AgentId(0)));
        assert_eq!(votes[&AgentId(1)].target, AgentId(3));
        assert_eq!(votes[&AgentId(2)].target, AgentId(3));

        // With the human excluded, a two-person alliance has one voter: no bloc
        registry.remove_member(duo, AgentId(2));
        let votes = compute_bloc_votes(&registry, &mut graph, &mut rng, &ballot).unwrap();
        assert!(votes.is_empty());
    }

    #[test]
    fn test_alliance_without_valid_target_is_skipped() {
        let mut graph = neutral_graph(3);
        let mut rng = SmallRng::seed_from_u64(4);
        let mut registry = AllianceRegistry::new(AllianceTuning::default());
        graph.set_mutual(AgentId(0), AgentId(1), 70.0).unwrap();
        registry.try_form(AgentId(0), AgentId(1), &mut graph, &mut rng).unwrap();

        let members = ids(&[0, 1, 2]);
        let immune = set(&[2]);
        let empty = BTreeSet::new();
        let ballot = Ballot {
            members: &members,
            humans: &empty,
            immune: &immune,
            barred_voters: &empty,
            allowed_targets: None,
        };

        let votes = compute_bloc_votes(&registry, &mut graph, &mut rng, &ballot).unwrap();
        assert!(votes.is_empty());
    }
}
