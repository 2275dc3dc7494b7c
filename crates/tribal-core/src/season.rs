//! Season State
//!
//! The in-crate [`GameHost`]: cast, tribes, jury and the elimination record.
//! Immunity challenges are outside this crate, so the season awards immunity
//! with a seeded coin flip before each council.

use bevy_ecs::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tribal_events::{AgentId, EliminationRecord};

use crate::components::agent::Agent;
use crate::components::tribe::{GamePhase, Tribe};
use crate::host::{Elimination, GameHost};

/// Resource: the running season
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    agents: BTreeMap<AgentId, Agent>,
    tribes: Vec<Tribe>,
    jury: Vec<AgentId>,
    phase: GamePhase,
    eliminations: Vec<EliminationRecord>,
    pub day: u32,
    pub councils_held: u32,
    game_over: bool,
}

impl Season {
    pub fn new(agents: Vec<Agent>, tribes: Vec<Tribe>) -> Self {
        Self {
            agents: agents.into_iter().map(|a| (a.id, a)).collect(),
            tribes,
            jury: Vec::new(),
            phase: GamePhase::PreMerge,
            eliminations: Vec::new(),
            day: 0,
            councils_held: 0,
            game_over: false,
        }
    }

    /// Every survivor ever cast, eliminated or not
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Survivors still in the game, tribe by tribe in seating order
    pub fn remaining(&self) -> Vec<AgentId> {
        self.tribes
            .iter()
            .flat_map(|t| t.members().iter().copied())
            .collect()
    }

    pub fn tribe_of(&self, agent: AgentId) -> Option<&Tribe> {
        self.tribes.iter().find(|t| t.contains(agent))
    }

    pub fn jury(&self) -> &[AgentId] {
        &self.jury
    }

    pub fn eliminations(&self) -> &[EliminationRecord] {
        &self.eliminations
    }

    /// The human player was voted out
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_finished(&self, final_size: usize) -> bool {
        self.game_over || self.remaining().len() <= final_size
    }

    pub fn is_council_day(&self, days_between_councils: u32) -> bool {
        self.day > 0 && self.day % days_between_councils.max(1) == 0
    }

    pub fn player_id(&self) -> Option<AgentId> {
        self.player_agent().map(|a| a.id)
    }

    /// Remaining survivors currently holding an idol
    pub fn idol_holders(&self) -> Vec<AgentId> {
        self.remaining()
            .into_iter()
            .filter(|id| self.agents.get(id).is_some_and(|a| a.has_idol))
            .collect()
    }

    /// Fold every tribe into one. Returns the merged membership.
    pub fn merge(&mut self, name: &str) -> Vec<AgentId> {
        let members = self.remaining();
        self.tribes = vec![Tribe::new(name).with_members(members.clone())];
        self.phase = GamePhase::PostMerge;
        members
    }

    /// Decide who is safe at the next council and return the tribe that
    /// attends.
    ///
    /// Before the merge one tribe (with at least two members) is picked to
    /// lose and the rest win immunity. After the merge one survivor wins
    /// individual immunity, provided enough remain that somebody can still be
    /// voted for.
    pub fn award_immunity(&mut self, rng: &mut impl Rng) -> Option<String> {
        match self.phase {
            GamePhase::PreMerge => {
                let eligible: Vec<usize> = (0..self.tribes.len())
                    .filter(|&i| self.tribes[i].len() >= 2)
                    .collect();
                let loser = *eligible.choose(rng)?;
                for (i, tribe) in self.tribes.iter_mut().enumerate() {
                    tribe.is_immune = i != loser;
                }
                let name = self.tribes[loser].name.clone();
                tracing::debug!("{} lost the immunity challenge", name);
                Some(name)
            }
            GamePhase::PostMerge => {
                let tribe = self.tribes.iter().find(|t| t.len() >= 2)?;
                let name = tribe.name.clone();
                if tribe.len() >= 3 {
                    let winner = *tribe.members().choose(rng)?;
                    if let Some(agent) = self.agents.get_mut(&winner) {
                        agent.has_immunity = true;
                        tracing::debug!("{} won individual immunity", agent.name);
                    }
                }
                Some(name)
            }
        }
    }

    /// Immunity lasts for one council only
    pub fn clear_immunity(&mut self) {
        for tribe in &mut self.tribes {
            tribe.is_immune = false;
        }
        for agent in self.agents.values_mut() {
            agent.has_immunity = false;
        }
    }
}

impl GameHost for Season {
    fn tribes(&self) -> &[Tribe] {
        &self.tribes
    }

    fn player_agent(&self) -> Option<&Agent> {
        self.agents
            .values()
            .find(|a| a.is_human && self.tribe_of(a.id).is_some())
    }

    fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    fn tribe_mut(&mut self, name: &str) -> Option<&mut Tribe> {
        self.tribes.iter_mut().find(|t| t.name == name)
    }

    fn phase(&self) -> GamePhase {
        self.phase
    }

    fn add_juror(&mut self, agent: AgentId) {
        if !self.jury.contains(&agent) {
            self.jury.push(agent);
        }
    }

    fn on_eliminated(&mut self, elimination: &Elimination) {
        if let Some(agent) = self.agents.get_mut(&elimination.agent) {
            agent.has_idol = false;
            agent.has_immunity = false;
        }
        if elimination.game_over {
            self.game_over = true;
        }
        self.eliminations.push(EliminationRecord {
            day: self.day,
            council: self.councils_held,
            agent: elimination.agent,
            name: elimination.name.clone(),
            tribe: elimination.tribe.clone(),
            votes_against: elimination.votes_against,
            by_rocks: elimination.by_rocks,
            joins_jury: elimination.joins_jury,
        });
    }
}
