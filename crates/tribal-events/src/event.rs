//! Event Types
//!
//! Everything the council engine and the alliance registry report, in the
//! JSONL schema consumed by the presentation layer.

use serde::{Deserialize, Serialize};

use crate::{AgentId, AllianceId};

/// Where a recorded vote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoteSource {
    /// Chosen by the human player (or their autopilot)
    Human,
    /// Assigned by an alliance voting as a bloc
    Bloc { alliance: AllianceId },
    /// Individual NPC choice: lowest affinity target
    Fallback,
}

/// Why `cast_vote` refused to record a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Target holds challenge immunity
    TargetImmune,
    /// Voter tried to vote for themselves
    SelfVote,
    /// Target is not attending this council
    UnknownTarget,
    /// Voter is not attending, or is barred from voting in this revote
    VoterIneligible,
    /// Revote target outside the tied set
    OutsideTiedSet,
}

impl RejectReason {
    /// Returns a short description for narration.
    pub fn description(&self) -> &'static str {
        match self {
            RejectReason::TargetImmune => "target is immune",
            RejectReason::SelfVote => "cannot vote for yourself",
            RejectReason::UnknownTarget => "target is not at tribal council",
            RejectReason::VoterIneligible => "voter may not vote",
            RejectReason::OutsideTiedSet => "revote is restricted to the tied survivors",
        }
    }
}

/// Votes counted against one survivor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    pub agent: AgentId,
    pub votes: u32,
}

/// Payload of a council event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouncilEventKind {
    /// A tribe sat down at tribal council
    RoundPrepared {
        tribe: String,
        members: Vec<AgentId>,
        immune: Vec<AgentId>,
        post_merge: bool,
    },
    /// A vote was written down
    VoteCast {
        voter: AgentId,
        target: AgentId,
        source: VoteSource,
        #[serde(default)]
        revote: bool,
    },
    /// A vote was refused
    VoteRejected {
        voter: AgentId,
        target: AgentId,
        reason: RejectReason,
    },
    /// A hidden immunity idol was played
    IdolPlayed { agent: AgentId },
    /// Votes were read
    VotesCounted {
        counts: Vec<VoteCount>,
        negated: u32,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tied: Vec<AgentId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        candidate: Option<AgentId>,
        #[serde(default)]
        revote: bool,
    },
    /// Rocks were drawn to break a deadlock
    RocksDrawn {
        drawers: Vec<AgentId>,
        eliminated: AgentId,
        /// True when nobody was eligible to draw and a tied survivor was picked
        fallback: bool,
    },
    /// A survivor left the game
    Eliminated {
        agent: AgentId,
        name: String,
        game_over: bool,
        joins_jury: bool,
    },
    /// Two survivors started an alliance
    AllianceFormed {
        alliance: AllianceId,
        members: Vec<AgentId>,
    },
    /// A survivor was admitted to an alliance
    AllianceJoined { alliance: AllianceId, agent: AgentId },
    /// A survivor left (or was pushed out of) an alliance
    AllianceLeft { alliance: AllianceId, agent: AgentId },
    /// An alliance fell apart
    AllianceDissolved { alliance: AllianceId },
    /// Tribes merged into one
    TribesMerged { tribe: String, members: Vec<AgentId> },
}

/// A single logged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilEvent {
    /// Unique identifier (evt_XXXXXXXX)
    pub event_id: String,
    /// Day of the season
    pub day: u32,
    /// Tribal council sequence number (0 before the first council)
    pub council: u32,
    pub kind: CouncilEventKind,
}

impl CouncilEvent {
    pub fn new(event_id: impl Into<String>, day: u32, council: u32, kind: CouncilEventKind) -> Self {
        Self {
            event_id: event_id.into(),
            day,
            council,
            kind,
        }
    }

    /// Returns all agent IDs involved in this event.
    pub fn agent_ids(&self) -> Vec<AgentId> {
        match &self.kind {
            CouncilEventKind::RoundPrepared { members, .. } => members.clone(),
            CouncilEventKind::VoteCast { voter, target, .. }
            | CouncilEventKind::VoteRejected { voter, target, .. } => vec![*voter, *target],
            CouncilEventKind::IdolPlayed { agent }
            | CouncilEventKind::Eliminated { agent, .. }
            | CouncilEventKind::AllianceJoined { agent, .. }
            | CouncilEventKind::AllianceLeft { agent, .. } => vec![*agent],
            CouncilEventKind::VotesCounted { counts, .. } => {
                counts.iter().map(|c| c.agent).collect()
            }
            CouncilEventKind::RocksDrawn { drawers, eliminated, .. } => {
                let mut ids = drawers.clone();
                if !ids.contains(eliminated) {
                    ids.push(*eliminated);
                }
                ids
            }
            CouncilEventKind::AllianceFormed { members, .. }
            | CouncilEventKind::TribesMerged { members, .. } => members.clone(),
            CouncilEventKind::AllianceDissolved { .. } => Vec::new(),
        }
    }

    /// Checks if a specific agent is involved in this event.
    pub fn involves_agent(&self, agent: AgentId) -> bool {
        self.agent_ids().contains(&agent)
    }

    /// Returns true for events the reveal sequence should dwell on.
    pub fn is_dramatic(&self) -> bool {
        match &self.kind {
            CouncilEventKind::IdolPlayed { .. }
            | CouncilEventKind::RocksDrawn { .. }
            | CouncilEventKind::AllianceDissolved { .. } => true,
            CouncilEventKind::VotesCounted { tied, .. } => !tied.is_empty(),
            CouncilEventKind::Eliminated { game_over, .. } => *game_over,
            _ => false,
        }
    }

    /// Serializes the event to a single JSON line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an event from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Generates an event ID with the given sequence number.
pub fn generate_event_id(sequence: u64) -> String {
    format!("evt_{:08}", sequence)
}
