//! Alliance Components
//!
//! Alliances and the registry that owns them. Membership changes only go
//! through the registry so the derived strength stays in step.

use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tribal_events::{AgentId, AllianceId, CouncilEventKind};

use super::social::{RelationshipGraph, SocialError};
use crate::config::AllianceTuning;

/// A group of survivors who vote together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alliance {
    pub id: AllianceId,
    /// Members in the order they joined
    members: Vec<AgentId>,
    /// Mean pairwise affinity among members, as of the last refresh
    pub strength: f32,
}

impl Alliance {
    pub fn members(&self) -> &[AgentId] {
        &self.members
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.members.contains(&agent)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A membership change, reported so callers can log and narrate it
#[derive(Debug, Clone, PartialEq)]
pub enum AllianceChange {
    Formed {
        alliance: AllianceId,
        members: Vec<AgentId>,
    },
    Joined {
        alliance: AllianceId,
        agent: AgentId,
    },
    Left {
        alliance: AllianceId,
        agent: AgentId,
    },
    Dissolved {
        alliance: AllianceId,
    },
}

impl AllianceChange {
    pub fn to_event_kind(&self) -> CouncilEventKind {
        match self {
            AllianceChange::Formed { alliance, members } => CouncilEventKind::AllianceFormed {
                alliance: *alliance,
                members: members.clone(),
            },
            AllianceChange::Joined { alliance, agent } => CouncilEventKind::AllianceJoined {
                alliance: *alliance,
                agent: *agent,
            },
            AllianceChange::Left { alliance, agent } => CouncilEventKind::AllianceLeft {
                alliance: *alliance,
                agent: *agent,
            },
            AllianceChange::Dissolved { alliance } => {
                CouncilEventKind::AllianceDissolved { alliance: *alliance }
            }
        }
    }
}

/// Mean directed affinity over every ordered pair of members
pub fn measure_strength(
    members: &[AgentId],
    graph: &mut RelationshipGraph,
    rng: &mut impl Rng,
) -> Result<f32, SocialError> {
    let mut total = 0.0;
    let mut pairs = 0u32;
    for &a in members {
        for &b in members {
            if a != b {
                total += graph.get_affinity(a, b, rng)?;
                pairs += 1;
            }
        }
    }
    Ok(if pairs == 0 { 0.0 } else { total / pairs as f32 })
}

/// Resource: Registry of all alliances
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllianceRegistry {
    tuning: AllianceTuning,
    /// Live alliances in creation order
    alliances: Vec<Alliance>,
    next_id: u32,
}

impl AllianceRegistry {
    pub fn new(tuning: AllianceTuning) -> Self {
        Self {
            tuning,
            alliances: Vec::new(),
            next_id: 1,
        }
    }

    pub fn tuning(&self) -> &AllianceTuning {
        &self.tuning
    }

    /// Get an alliance by ID
    pub fn get(&self, id: AllianceId) -> Option<&Alliance> {
        self.alliances.iter().find(|a| a.id == id)
    }

    /// All live alliances in creation order
    pub fn alliances(&self) -> &[Alliance] {
        &self.alliances
    }

    pub fn len(&self) -> usize {
        self.alliances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alliances.is_empty()
    }

    /// Alliances an agent belongs to, in creation order
    pub fn alliances_of(&self, agent: AgentId) -> Vec<&Alliance> {
        self.alliances.iter().filter(|a| a.contains(agent)).collect()
    }

    /// Alliances containing both agents
    pub fn shared_alliances(&self, a: AgentId, b: AgentId) -> Vec<AllianceId> {
        self.alliances
            .iter()
            .filter(|al| al.contains(a) && al.contains(b))
            .map(|al| al.id)
            .collect()
    }

    /// Start a two-person alliance if `a` likes `b` enough and they are not
    /// already allied
    pub fn try_form(
        &mut self,
        a: AgentId,
        b: AgentId,
        graph: &mut RelationshipGraph,
        rng: &mut impl Rng,
    ) -> Result<Option<AllianceId>, SocialError> {
        if a == b {
            return Ok(None);
        }
        if graph.get_affinity(a, b, rng)? < self.tuning.join_threshold {
            return Ok(None);
        }
        if !self.shared_alliances(a, b).is_empty() {
            return Ok(None);
        }

        let members = vec![a, b];
        let strength = measure_strength(&members, graph, rng)?;
        let id = AllianceId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.alliances.push(Alliance {
            id,
            members,
            strength,
        });

        tracing::debug!("{} formed by {} and {} (strength {:.1})", id, a, b, strength);
        Ok(Some(id))
    }

    /// Admit `candidate` only if every current member is at least neutral
    /// toward them
    pub fn add_member(
        &mut self,
        id: AllianceId,
        candidate: AgentId,
        graph: &mut RelationshipGraph,
        rng: &mut impl Rng,
    ) -> Result<bool, SocialError> {
        let Some(index) = self.alliances.iter().position(|a| a.id == id) else {
            return Ok(false);
        };
        if self.alliances[index].contains(candidate) {
            return Ok(false);
        }

        let members = self.alliances[index].members.clone();
        for &member in &members {
            if graph.get_affinity(member, candidate, rng)? < self.tuning.admit_threshold {
                tracing::debug!("{} vetoed {} joining {}", member, candidate, id);
                return Ok(false);
            }
        }

        let mut members = members;
        members.push(candidate);
        let strength = measure_strength(&members, graph, rng)?;
        let alliance = &mut self.alliances[index];
        alliance.members = members;
        alliance.strength = strength;
        Ok(true)
    }

    /// Remove a member; an alliance left with fewer than two members dissolves
    pub fn remove_member(&mut self, id: AllianceId, agent: AgentId) -> Vec<AllianceChange> {
        let mut changes = Vec::new();
        let Some(index) = self.alliances.iter().position(|a| a.id == id) else {
            return changes;
        };
        if !self.alliances[index].remove(agent) {
            return changes;
        }

        changes.push(AllianceChange::Left { alliance: id, agent });
        if self.alliances[index].len() < 2 {
            self.alliances.remove(index);
            tracing::debug!("{} dissolved after {} left", id, agent);
            changes.push(AllianceChange::Dissolved { alliance: id });
        }
        changes
    }

    /// Remove an agent from every alliance (used on elimination)
    pub fn remove_agent_everywhere(&mut self, agent: AgentId) -> Vec<AllianceChange> {
        let ids: Vec<AllianceId> = self.alliances_of(agent).iter().map(|a| a.id).collect();
        ids.into_iter()
            .flat_map(|id| self.remove_member(id, agent))
            .collect()
    }

    /// Dissolve an alliance outright
    pub fn disband(&mut self, id: AllianceId) -> bool {
        let initial_len = self.alliances.len();
        self.alliances.retain(|a| a.id != id);
        self.alliances.len() < initial_len
    }

    /// Recompute every alliance's strength from current affinities
    pub fn refresh_strengths(
        &mut self,
        graph: &mut RelationshipGraph,
        rng: &mut impl Rng,
    ) -> Result<(), SocialError> {
        for alliance in &mut self.alliances {
            alliance.strength = measure_strength(&alliance.members, graph, rng)?;
        }
        Ok(())
    }
}

impl Alliance {
    fn remove(&mut self, agent: AgentId) -> bool {
        let initial_len = self.members.len();
        self.members.retain(|m| *m != agent);
        self.members.len() < initial_len
    }
}
