//! Tribal Council
//!
//! The vote resolution engine. One [`TribalCouncil`] borrows the relationship
//! graph, the alliance registry and the shared RNG; the surrounding game is
//! passed in per call through [`GameHost`]. Operations must be called in
//! sequence:
//!
//! `prepare` → `cast_vote`/`play_idol` → `count_votes` →
//! (`handle_tie_vote` → (`draw_rocks`)) → `process_elimination`
//!
//! Anything out of order is rejected with [`CouncilError::OutOfPhase`].

mod rocks;
mod round;
pub mod runner;
mod tally;

pub use rocks::{draw_rock, rock_drawers, RockDraw};
pub use round::{CastVote, CouncilPhase, CouncilRoundState, VoteRecord};
pub use runner::{run_council_system, run_tribal_council, CouncilReport};
pub use tally::{tally_votes, TieVoteOutcome, VoteTally};

use std::collections::BTreeSet;
use thiserror::Error;
use tribal_events::{AgentId, CouncilEventKind, RejectReason, RevealEntry, VoteSource};

use crate::components::alliance::AllianceRegistry;
use crate::components::social::{RelationshipGraph, SocialError};
use crate::host::{Elimination, GameHost};
use crate::systems::voting::{compute_bloc_votes, fallback_target, Ballot};
use crate::SimRng;

/// Errors from the council engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CouncilError {
    #[error("no tribal council in session")]
    NoActiveRound,
    #[error("cannot {operation} while the council is {phase:?}")]
    OutOfPhase {
        operation: &'static str,
        phase: CouncilPhase,
    },
    #[error("unknown tribe: {0}")]
    UnknownTribe(String),
    /// Immune tribes skip tribal council
    #[error("tribe {0} holds immunity")]
    TribeImmune(String),
    #[error("tribe {tribe} has {count} members, a council needs at least two")]
    NotEnoughMembers { tribe: String, count: usize },
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),
    /// A tie needs at least two agents, all seated at this council
    #[error("invalid tie set: {0:?}")]
    InvalidTieSet(Vec<AgentId>),
    #[error("{agent} was not voted out this council")]
    NotTheCandidate { agent: AgentId },
    #[error(transparent)]
    Social(#[from] SocialError),
}

/// The vote resolution engine
pub struct TribalCouncil<'a> {
    relationships: &'a mut RelationshipGraph,
    alliances: &'a mut AllianceRegistry,
    rng: &'a mut SimRng,
    round: Option<CouncilRoundState>,
    last_eliminated: Option<AgentId>,
    /// Events produced since the last `drain_events`
    journal: Vec<CouncilEventKind>,
}

impl<'a> TribalCouncil<'a> {
    pub fn new(
        relationships: &'a mut RelationshipGraph,
        alliances: &'a mut AllianceRegistry,
        rng: &'a mut SimRng,
    ) -> Self {
        Self {
            relationships,
            alliances,
            rng,
            round: None,
            last_eliminated: None,
            journal: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current phase, `None` between councils
    pub fn phase(&self) -> Option<CouncilPhase> {
        self.round.as_ref().map(|r| r.phase)
    }

    pub fn round(&self) -> Option<&CouncilRoundState> {
        self.round.as_ref()
    }

    /// Votes recorded in the current pass
    pub fn current_votes(&self) -> Option<&VoteRecord> {
        self.round.as_ref().map(|r| &r.votes)
    }

    /// Challenge-immune agents snapshotted at `prepare`. These cannot be
    /// voted for at all; idol protection is tracked apart in
    /// [`idol_protected`](Self::idol_protected), see
    /// [`protected_agents`](Self::protected_agents) for both.
    pub fn immune_agents(&self) -> BTreeSet<AgentId> {
        self.round
            .as_ref()
            .map(|r| r.challenge_immune.clone())
            .unwrap_or_default()
    }

    /// Agents who played an idol this round. They may still be voted for,
    /// but those votes are dropped at counting.
    pub fn idol_protected(&self) -> BTreeSet<AgentId> {
        self.round
            .as_ref()
            .map(|r| r.idol_protected.clone())
            .unwrap_or_default()
    }

    /// Everyone safe at counting: challenge immunity plus idol protection
    pub fn protected_agents(&self) -> BTreeSet<AgentId> {
        self.round
            .as_ref()
            .map(|r| r.challenge_immune.union(&r.idol_protected).copied().collect())
            .unwrap_or_default()
    }

    pub fn last_eliminated(&self) -> Option<AgentId> {
        self.last_eliminated
    }

    /// Per-voter ledger of the current pass, negated votes included
    pub fn reveal(&self) -> Vec<RevealEntry> {
        self.round.as_ref().map(|r| r.reveal()).unwrap_or_default()
    }

    /// Take the events recorded so far
    pub fn drain_events(&mut self) -> Vec<CouncilEventKind> {
        std::mem::take(&mut self.journal)
    }

    // ========================================================================
    // Round lifecycle
    // ========================================================================

    /// Open a council for `tribe_name`: snapshot immunity, reset the votes
    pub fn prepare<H: GameHost>(&mut self, host: &H, tribe_name: &str) -> Result<(), CouncilError> {
        let tribe = host
            .tribes()
            .iter()
            .find(|t| t.name == tribe_name)
            .ok_or_else(|| CouncilError::UnknownTribe(tribe_name.to_string()))?;
        if tribe.is_immune {
            return Err(CouncilError::TribeImmune(tribe.name.clone()));
        }
        if tribe.len() < 2 {
            return Err(CouncilError::NotEnoughMembers {
                tribe: tribe.name.clone(),
                count: tribe.len(),
            });
        }

        let mut humans = BTreeSet::new();
        let mut immune = BTreeSet::new();
        for &member in tribe.members() {
            let agent = host.agent(member).ok_or(CouncilError::UnknownAgent(member))?;
            if agent.is_human {
                humans.insert(member);
            }
            if agent.has_immunity {
                immune.insert(member);
            }
        }

        if let Some(old) = self.round.take() {
            tracing::warn!("Discarding unfinished council for {} ({:?})", old.tribe, old.phase);
        }

        let post_merge = host.phase().is_post_merge();
        let mut round = CouncilRoundState::new(
            tribe.name.clone(),
            tribe.members().to_vec(),
            humans,
            immune,
            post_merge,
        );
        round.phase = CouncilPhase::Collecting;

        tracing::info!(
            "Tribal council for {}: {} members, {} immune",
            round.tribe,
            round.members.len(),
            round.challenge_immune.len()
        );
        self.journal.push(CouncilEventKind::RoundPrepared {
            tribe: round.tribe.clone(),
            members: round.members.clone(),
            immune: round.challenge_immune.iter().copied().collect(),
            post_merge,
        });
        self.round = Some(round);
        Ok(())
    }

    /// Record a vote chosen by the player (or any caller directing a voter).
    /// Invalid votes are refused and `Ok(false)` is returned.
    pub fn cast_vote(&mut self, voter: AgentId, target: AgentId) -> Result<bool, CouncilError> {
        let round = self.round.as_mut().ok_or(CouncilError::NoActiveRound)?;
        if !round.phase.accepts_votes() {
            return Err(CouncilError::OutOfPhase {
                operation: "cast a vote",
                phase: round.phase,
            });
        }

        if let Some(reason) = rejection(&round.ballot(), voter, target) {
            tracing::debug!("Vote {} -> {} refused: {}", voter, target, reason.description());
            self.journal.push(CouncilEventKind::VoteRejected { voter, target, reason });
            return Ok(false);
        }

        let revote = round.is_revote();
        round.votes.record(voter, target, VoteSource::Human);
        self.journal.push(CouncilEventKind::VoteCast {
            voter,
            target,
            source: VoteSource::Human,
            revote,
        });
        Ok(true)
    }

    /// Play a hidden immunity idol. `Ok(false)` when the agent holds none or
    /// is not at this council.
    pub fn play_idol<H: GameHost>(&mut self, host: &mut H, agent: AgentId) -> Result<bool, CouncilError> {
        let round = self.round.as_mut().ok_or(CouncilError::NoActiveRound)?;
        if round.phase != CouncilPhase::Collecting {
            return Err(CouncilError::OutOfPhase {
                operation: "play an idol",
                phase: round.phase,
            });
        }
        if !round.members.contains(&agent) {
            return Ok(false);
        }
        let Some(holder) = host.agent_mut(agent) else {
            return Err(CouncilError::UnknownAgent(agent));
        };
        if !holder.has_idol {
            return Ok(false);
        }

        holder.has_idol = false;
        round.idol_protected.insert(agent);
        round.idol_played = true;
        tracing::info!("{} plays a hidden immunity idol", agent);
        self.journal.push(CouncilEventKind::IdolPlayed { agent });
        Ok(true)
    }

    /// What an NPC would vote for right now: their bloc's target if an
    /// alliance assigns one, else the open target they like least.
    pub fn suggest_vote(&mut self, voter: AgentId) -> Result<Option<AgentId>, CouncilError> {
        let round = self.round.as_ref().ok_or(CouncilError::NoActiveRound)?;
        let ballot = round.ballot();
        if !ballot.can_vote(voter) {
            return Ok(None);
        }
        let blocs = compute_bloc_votes(&*self.alliances, self.relationships, &mut self.rng.0, &ballot)?;
        if let Some(bloc) = blocs.get(&voter) {
            return Ok(Some(bloc.target));
        }
        Ok(fallback_target(self.relationships, &mut self.rng.0, &ballot, voter)?)
    }

    /// Fill in votes for every NPC who has not voted yet. Returns the number
    /// of votes recorded.
    pub fn collect_npc_votes(&mut self) -> Result<usize, CouncilError> {
        let round = self.round.as_ref().ok_or(CouncilError::NoActiveRound)?;
        if !round.phase.accepts_votes() {
            return Err(CouncilError::OutOfPhase {
                operation: "collect votes",
                phase: round.phase,
            });
        }

        let ballot = round.ballot();
        let blocs = compute_bloc_votes(&*self.alliances, self.relationships, &mut self.rng.0, &ballot)?;
        let mut decided = Vec::new();
        for voter in ballot.npc_voters() {
            if round.votes.has_voted(voter) {
                continue;
            }
            if let Some(bloc) = blocs.get(&voter) {
                decided.push(CastVote {
                    voter,
                    target: bloc.target,
                    source: VoteSource::Bloc {
                        alliance: bloc.alliance,
                    },
                });
                continue;
            }
            match fallback_target(self.relationships, &mut self.rng.0, &ballot, voter)? {
                Some(target) => decided.push(CastVote {
                    voter,
                    target,
                    source: VoteSource::Fallback,
                }),
                None => tracing::debug!("{} has nobody to vote for and abstains", voter),
            }
        }

        let round = self.round.as_mut().ok_or(CouncilError::NoActiveRound)?;
        let revote = round.is_revote();
        for vote in &decided {
            round.votes.record(vote.voter, vote.target, vote.source);
            self.journal.push(CouncilEventKind::VoteCast {
                voter: vote.voter,
                target: vote.target,
                source: vote.source,
                revote,
            });
        }
        Ok(decided.len())
    }

    /// Read the votes. Missing NPC votes are collected first; votes against
    /// an agent who played an idol are discarded.
    pub fn count_votes(&mut self) -> Result<VoteTally, CouncilError> {
        self.collect_npc_votes()?;

        let round = self.round.as_mut().ok_or(CouncilError::NoActiveRound)?;
        round.phase = CouncilPhase::Counting;

        let protected = if round.idol_played {
            round.idol_protected.clone()
        } else {
            BTreeSet::new()
        };
        let mut tally = tally_votes(&round.votes, &protected, &round.members);

        // Nobody voted in a revote: the deadlock stands
        if round.is_revote() && tally.total == 0 {
            tally.is_tied = true;
            tally.tied = round
                .members
                .iter()
                .copied()
                .filter(|m| round.tied.contains(m))
                .collect();
        }

        round.last_counts = tally.counts.iter().map(|c| (c.agent, c.votes)).collect();
        round.pending_tie = if tally.is_tied {
            tally.tied.iter().copied().collect()
        } else {
            BTreeSet::new()
        };
        round.phase = if tally.is_tied {
            if round.is_revote() {
                CouncilPhase::StillTied
            } else {
                CouncilPhase::Tied
            }
        } else {
            CouncilPhase::Resolved {
                eliminated: tally.candidate,
            }
        };

        match (tally.is_tied, tally.candidate) {
            (true, _) => tracing::info!("Votes tied between {:?}", tally.tied),
            (false, Some(candidate)) => {
                tracing::info!("{} receives the most votes ({})", candidate, tally.max_votes())
            }
            (false, None) => tracing::info!("No votes counted, nobody goes home"),
        }

        self.journal.push(CouncilEventKind::VotesCounted {
            counts: tally.counts.clone(),
            negated: tally.negated.len() as u32,
            tied: tally.tied.clone(),
            candidate: tally.candidate,
            revote: round.is_revote(),
        });
        Ok(tally)
    }

    /// Open a revote among `tied`: votes are cleared, tied agents sit out and
    /// only they may be voted for. Lets the player cast a revote before
    /// `handle_tie_vote` completes the pass.
    pub fn begin_revote(&mut self, tied: &[AgentId]) -> Result<(), CouncilError> {
        let round = self.round.as_mut().ok_or(CouncilError::NoActiveRound)?;
        if !round.phase.is_tied() {
            return Err(CouncilError::OutOfPhase {
                operation: "start a revote",
                phase: round.phase,
            });
        }
        validate_tie(round, tied)?;

        round.tied = tied.iter().copied().collect();
        round.votes.clear();
        round.revote_count += 1;
        round.phase = CouncilPhase::Revoting;
        tracing::info!("Revote #{} among {:?}", round.revote_count, tied);
        Ok(())
    }

    /// Run one revote pass restricted to `tied`.
    ///
    /// Never loops: a second tie comes back with `still_tied` and the caller
    /// decides between another pass and `draw_rocks`.
    pub fn handle_tie_vote(&mut self, tied: &[AgentId]) -> Result<TieVoteOutcome, CouncilError> {
        let phase = self.phase().ok_or(CouncilError::NoActiveRound)?;
        match phase {
            CouncilPhase::Tied | CouncilPhase::StillTied => self.begin_revote(tied)?,
            CouncilPhase::Revoting => {
                let round = self.round.as_ref().ok_or(CouncilError::NoActiveRound)?;
                let requested: BTreeSet<AgentId> = tied.iter().copied().collect();
                if requested != round.tied {
                    return Err(CouncilError::InvalidTieSet(tied.to_vec()));
                }
            }
            phase => {
                return Err(CouncilError::OutOfPhase {
                    operation: "revote",
                    phase,
                })
            }
        }

        let tally = self.count_votes()?;
        let revote_count = self.round.as_ref().map_or(0, |r| r.revote_count);
        Ok(TieVoteOutcome {
            still_tied: tally.is_tied,
            revote_count,
            tied: tally.tied.clone(),
            candidate: tally.candidate,
            tally,
        })
    }

    /// Break a deadlock by drawing rocks. Returns the agent going home.
    pub fn draw_rocks(&mut self, tied: &[AgentId]) -> Result<AgentId, CouncilError> {
        let round = self.round.as_mut().ok_or(CouncilError::NoActiveRound)?;
        if !round.phase.is_tied() {
            return Err(CouncilError::OutOfPhase {
                operation: "draw rocks",
                phase: round.phase,
            });
        }
        validate_tie(round, tied)?;
        round.phase = CouncilPhase::RockDraw;

        let drawers = rock_drawers(
            &round.members,
            tied,
            &round.challenge_immune,
            &round.idol_protected,
            round.post_merge,
        );
        let draw = draw_rock(&drawers, tied, &mut self.rng.0)
            .ok_or_else(|| CouncilError::InvalidTieSet(tied.to_vec()))?;

        if draw.fallback {
            tracing::warn!("Nobody eligible to draw rocks, {} picked from the tie", draw.eliminated);
        } else {
            tracing::info!("{} draws the purple rock from {} drawers", draw.eliminated, drawers.len());
        }

        round.by_rocks = true;
        round.phase = CouncilPhase::Resolved {
            eliminated: Some(draw.eliminated),
        };
        self.journal.push(CouncilEventKind::RocksDrawn {
            drawers,
            eliminated: draw.eliminated,
            fallback: draw.fallback,
        });
        Ok(draw.eliminated)
    }

    /// Send the resolved agent home and close the council.
    ///
    /// Removes them from their tribe and every alliance, seats them on the
    /// jury after the merge, and notifies the host.
    pub fn process_elimination<H: GameHost>(
        &mut self,
        host: &mut H,
        agent: AgentId,
    ) -> Result<Elimination, CouncilError> {
        let round = self.round.as_ref().ok_or(CouncilError::NoActiveRound)?;
        match round.phase {
            CouncilPhase::Resolved {
                eliminated: Some(candidate),
            } if candidate == agent => {}
            CouncilPhase::Resolved { .. } => return Err(CouncilError::NotTheCandidate { agent }),
            phase => {
                return Err(CouncilError::OutOfPhase {
                    operation: "eliminate",
                    phase,
                })
            }
        }

        let (name, is_human) = host
            .agent(agent)
            .map(|a| (a.name.clone(), a.is_human))
            .ok_or(CouncilError::UnknownAgent(agent))?;
        let Some(round) = self.round.take() else {
            return Err(CouncilError::NoActiveRound);
        };

        if let Some(tribe) = host.tribe_mut(&round.tribe) {
            tribe.remove_member(agent);
        }
        for change in self.alliances.remove_agent_everywhere(agent) {
            self.journal.push(change.to_event_kind());
        }

        let joins_jury = !is_human && round.post_merge;
        if joins_jury {
            host.add_juror(agent);
        }

        let elimination = Elimination {
            agent,
            name: name.clone(),
            tribe: round.tribe.clone(),
            votes_against: if round.by_rocks { 0 } else { round.counted_votes_against(agent) },
            by_rocks: round.by_rocks,
            game_over: is_human,
            joins_jury,
        };

        if is_human {
            tracing::info!("{} ({}) has been voted out: game over", name, agent);
        } else {
            tracing::info!("{} ({}) has been voted out of {}", name, agent, round.tribe);
        }
        host.on_eliminated(&elimination);
        self.journal.push(CouncilEventKind::Eliminated {
            agent,
            name,
            game_over: is_human,
            joins_jury,
        });
        self.last_eliminated = Some(agent);
        Ok(elimination)
    }

    /// Close a council that resolved without anyone going home (every
    /// counted vote was cancelled by an idol).
    pub fn adjourn(&mut self) -> Result<(), CouncilError> {
        let round = self.round.as_ref().ok_or(CouncilError::NoActiveRound)?;
        if round.phase != (CouncilPhase::Resolved { eliminated: None }) {
            return Err(CouncilError::OutOfPhase {
                operation: "adjourn",
                phase: round.phase,
            });
        }
        tracing::info!("Council for {} adjourned with nobody voted out", round.tribe);
        self.round = None;
        Ok(())
    }
}

/// Why `voter` may not vote for `target` in this pass, if they may not
fn rejection(ballot: &Ballot<'_>, voter: AgentId, target: AgentId) -> Option<RejectReason> {
    if voter == target {
        Some(RejectReason::SelfVote)
    } else if !ballot.can_vote(voter) {
        Some(RejectReason::VoterIneligible)
    } else if !ballot.members.contains(&target) {
        Some(RejectReason::UnknownTarget)
    } else if ballot.immune.contains(&target) {
        Some(RejectReason::TargetImmune)
    } else if !ballot.is_open_target(target) {
        Some(RejectReason::OutsideTiedSet)
    } else {
        None
    }
}

/// `tied` must be exactly the tie the last count produced
fn validate_tie(round: &CouncilRoundState, tied: &[AgentId]) -> Result<(), CouncilError> {
    let requested: BTreeSet<AgentId> = tied.iter().copied().collect();
    if requested.len() < 2 || requested.len() != tied.len() || requested != round.pending_tie {
        return Err(CouncilError::InvalidTieSet(tied.to_vec()));
    }
    Ok(())
}
