//! Council Round State
//!
//! Everything one tribal council needs to remember between calls. Created by
//! `prepare`, dropped by `process_elimination`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tribal_events::{AgentId, RevealEntry, VoteSource};

use crate::systems::voting::Ballot;

/// Where the council stands.
///
/// `Preparing → Collecting → Counting → {Resolved | Tied → Revoting →
/// {Resolved | StillTied → RockDraw → Resolved}}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouncilPhase {
    Preparing,
    /// Votes are being cast
    Collecting,
    Counting,
    /// First count ended in a tie
    Tied,
    /// Tied survivors sit out; everyone else revotes among them
    Revoting,
    /// A revote ended in another tie
    StillTied,
    RockDraw,
    /// Someone (or, in edge cases, nobody) is going home
    Resolved { eliminated: Option<AgentId> },
}

impl CouncilPhase {
    pub fn accepts_votes(&self) -> bool {
        matches!(self, CouncilPhase::Collecting | CouncilPhase::Revoting)
    }

    pub fn is_tied(&self) -> bool {
        matches!(self, CouncilPhase::Tied | CouncilPhase::StillTied)
    }
}

/// One recorded vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVote {
    pub voter: AgentId,
    pub target: AgentId,
    pub source: VoteSource,
}

/// Voter → target for the current pass, in the order votes were cast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    votes: Vec<CastVote>,
}

impl VoteRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote; a voter who changes their mind replaces their earlier vote
    pub fn record(&mut self, voter: AgentId, target: AgentId, source: VoteSource) {
        let vote = CastVote { voter, target, source };
        match self.votes.iter_mut().find(|v| v.voter == voter) {
            Some(existing) => *existing = vote,
            None => self.votes.push(vote),
        }
    }

    pub fn target_of(&self, voter: AgentId) -> Option<AgentId> {
        self.votes.iter().find(|v| v.voter == voter).map(|v| v.target)
    }

    pub fn has_voted(&self, voter: AgentId) -> bool {
        self.target_of(voter).is_some()
    }

    pub fn votes(&self) -> &[CastVote] {
        &self.votes
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn clear(&mut self) {
        self.votes.clear();
    }
}

/// State of the council currently in session
#[derive(Debug, Clone)]
pub struct CouncilRoundState {
    pub tribe: String,
    /// Attending members in seating order
    pub members: Vec<AgentId>,
    pub humans: BTreeSet<AgentId>,
    /// Challenge immunity snapshot taken at `prepare`
    pub challenge_immune: BTreeSet<AgentId>,
    /// Played an idol this round
    pub idol_protected: BTreeSet<AgentId>,
    pub idol_played: bool,
    pub post_merge: bool,
    pub votes: VoteRecord,
    pub phase: CouncilPhase,
    /// Set during a revote: the tied survivors
    pub tied: BTreeSet<AgentId>,
    /// Tie left by the last count, waiting on a revote or rocks
    pub pending_tie: BTreeSet<AgentId>,
    pub revote_count: u32,
    pub by_rocks: bool,
    /// Counted votes against each agent in the most recent tally
    pub last_counts: Vec<(AgentId, u32)>,
}

impl CouncilRoundState {
    pub fn new(
        tribe: impl Into<String>,
        members: Vec<AgentId>,
        humans: BTreeSet<AgentId>,
        challenge_immune: BTreeSet<AgentId>,
        post_merge: bool,
    ) -> Self {
        Self {
            tribe: tribe.into(),
            members,
            humans,
            challenge_immune,
            idol_protected: BTreeSet::new(),
            idol_played: false,
            post_merge,
            votes: VoteRecord::new(),
            phase: CouncilPhase::Preparing,
            tied: BTreeSet::new(),
            pending_tie: BTreeSet::new(),
            revote_count: 0,
            by_rocks: false,
            last_counts: Vec::new(),
        }
    }

    pub fn is_revote(&self) -> bool {
        !self.tied.is_empty()
    }

    /// Voting rules for the current pass
    pub fn ballot(&self) -> Ballot<'_> {
        Ballot {
            members: &self.members,
            humans: &self.humans,
            immune: &self.challenge_immune,
            barred_voters: &self.tied,
            allowed_targets: if self.tied.is_empty() { None } else { Some(&self.tied) },
        }
    }

    /// Raw ledger for the reveal, negated votes included
    pub fn reveal(&self) -> Vec<RevealEntry> {
        self.votes
            .votes()
            .iter()
            .map(|v| RevealEntry {
                voter: v.voter,
                target: v.target,
                negated: self.idol_played && self.idol_protected.contains(&v.target),
            })
            .collect()
    }

    pub fn counted_votes_against(&self, agent: AgentId) -> u32 {
        self.last_counts
            .iter()
            .find(|(a, _)| *a == agent)
            .map_or(0, |(_, n)| *n)
    }
}
