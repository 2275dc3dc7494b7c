//! Vote counting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tribal_events::{AgentId, RevealEntry, VoteCount};

use super::round::VoteRecord;

/// Result of reading the votes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteTally {
    /// Counted votes per agent, in seating order; agents with no counted votes
    /// are left out
    pub counts: Vec<VoteCount>,
    /// Votes cast against an idol-protected agent
    pub negated: Vec<RevealEntry>,
    pub is_tied: bool,
    /// Agents sharing the top count, in seating order (empty unless tied)
    pub tied: Vec<AgentId>,
    /// The single agent with the most votes
    pub candidate: Option<AgentId>,
    /// Number of counted (non-negated) votes
    pub total: u32,
}

impl VoteTally {
    pub fn votes_for(&self, agent: AgentId) -> u32 {
        self.counts
            .iter()
            .find(|c| c.agent == agent)
            .map_or(0, |c| c.votes)
    }

    pub fn max_votes(&self) -> u32 {
        self.counts.iter().map(|c| c.votes).max().unwrap_or(0)
    }
}

/// Outcome of one revote pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieVoteOutcome {
    pub still_tied: bool,
    /// Revote passes held this council, including this one
    pub revote_count: u32,
    /// The new tied set when still tied
    pub tied: Vec<AgentId>,
    pub candidate: Option<AgentId>,
    pub tally: VoteTally,
}

/// Count `votes`, discarding any vote whose target is in `protected`.
///
/// `order` is the seating order used for `counts` and `tied`. Targets missing
/// from `order` are appended in first-vote order.
pub fn tally_votes(votes: &VoteRecord, protected: &BTreeSet<AgentId>, order: &[AgentId]) -> VoteTally {
    let mut counts: Vec<VoteCount> = Vec::new();
    let mut negated = Vec::new();

    for vote in votes.votes() {
        if protected.contains(&vote.target) {
            negated.push(RevealEntry {
                voter: vote.voter,
                target: vote.target,
                negated: true,
            });
            continue;
        }
        match counts.iter_mut().find(|c| c.agent == vote.target) {
            Some(count) => count.votes += 1,
            None => counts.push(VoteCount {
                agent: vote.target,
                votes: 1,
            }),
        }
    }

    counts.sort_by_key(|c| order.iter().position(|a| *a == c.agent).unwrap_or(usize::MAX));

    let total = counts.iter().map(|c| c.votes).sum();
    let max = counts.iter().map(|c| c.votes).max().unwrap_or(0);
    let leaders: Vec<AgentId> = counts
        .iter()
        .filter(|c| max > 0 && c.votes == max)
        .map(|c| c.agent)
        .collect();

    let (is_tied, tied, candidate) = match leaders.as_slice() {
        [] => (false, Vec::new(), None),
        [only] => (false, Vec::new(), Some(*only)),
        _ => (true, leaders, None),
    };

    VoteTally {
        counts,
        negated,
        is_tied,
        tied,
        candidate,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribal_events::VoteSource;

    fn record(pairs: &[(u32, u32)]) -> VoteRecord {
        let mut votes = VoteRecord::new();
        for &(voter, target) in pairs {
            votes.record(AgentId(voter), AgentId(target), VoteSource::Fallback);
        }
        votes
    }

    fn order(n: u32) -> Vec<AgentId> {
        (0..n).map(AgentId).collect()
    }

    #[test]
    fn test_tie_detection() {
        // A:2, B:2, C:1 with A=0, B=1, C=2
        let votes = record(&[(3, 0), (4, 0), (5, 1), (6, 1), (0, 2)]);
        let tally = tally_votes(&votes, &BTreeSet::new(), &order(7));

        assert!(tally.is_tied);
        assert_eq!(tally.tied, vec![AgentId(0), AgentId(1)]);
        assert_eq!(tally.candidate, None);
        assert_eq!(tally.total, 5);
    }

    #[test]
    fn test_single_leader_is_candidate() {
        let votes = record(&[(1, 0), (2, 0), (0, 1)]);
        let tally = tally_votes(&votes, &BTreeSet::new(), &order(3));

        assert!(!tally.is_tied);
        assert_eq!(tally.candidate, Some(AgentId(0)));
        assert_eq!(tally.votes_for(AgentId(0)), 2);
        assert_eq!(tally.votes_for(AgentId(2)), 0);
    }

    #[test]
    fn test_idol_negates_votes() {
        let votes = record(&[(1, 0), (2, 0), (3, 0), (0, 1)]);
        let protected: BTreeSet<_> = [AgentId(0)].into_iter().collect();
        let tally = tally_votes(&votes, &protected, &order(4));

        assert_eq!(tally.candidate, Some(AgentId(1)));
        assert_eq!(tally.total, 1);
        assert_eq!(tally.negated.len(), 3);
        assert!(tally.negated.iter().all(|e| e.target == AgentId(0) && e.negated));
    }

    #[test]
    fn test_counts_follow_seating_order() {
        let votes = record(&[(0, 3), (1, 2), (2, 3)]);
        let tally = tally_votes(&votes, &BTreeSet::new(), &order(4));

        let agents: Vec<_> = tally.counts.iter().map(|c| c.agent).collect();
        assert_eq!(agents, vec![AgentId(2), AgentId(3)]);
    }

    #[test]
    fn test_no_counted_votes() {
        let votes = record(&[(1, 0)]);
        let protected: BTreeSet<_> = [AgentId(0)].into_iter().collect();
        let tally = tally_votes(&votes, &protected, &order(2));

        assert!(!tally.is_tied);
        assert_eq!(tally.candidate, None);
        assert_eq!(tally.max_votes(), 0);
    }
}
