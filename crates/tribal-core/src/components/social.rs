//! Social Components
//!
//! The relationship graph: one canonical edge per pair of survivors, holding
//! both directions of affinity in a single record.

use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tribal_events::AgentId;

use super::agent::Personality;
use crate::config::RelationshipTuning;

/// Lowest possible affinity
pub const MIN_AFFINITY: f32 = 0.0;
/// Highest possible affinity
pub const MAX_AFFINITY: f32 = 100.0;

/// Errors from relationship lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocialError {
    /// The id was never registered with the graph
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),
    /// Survivors have no relationship with themselves
    #[error("{0} has no relationship with themselves")]
    SelfRelationship(AgentId),
}

/// Descriptive affinity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffinityTier {
    Hostile,
    Distrustful,
    Neutral,
    Friendly,
    CloseAlly,
}

impl AffinityTier {
    /// Bucket an affinity value: 0-19, 20-39, 40-59, 60-79, 80-100
    pub fn from_value(value: f32) -> Self {
        if value < 20.0 {
            AffinityTier::Hostile
        } else if value < 40.0 {
            AffinityTier::Distrustful
        } else if value < 60.0 {
            AffinityTier::Neutral
        } else if value < 80.0 {
            AffinityTier::Friendly
        } else {
            AffinityTier::CloseAlly
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AffinityTier::Hostile => "Hostile",
            AffinityTier::Distrustful => "Distrustful",
            AffinityTier::Neutral => "Neutral",
            AffinityTier::Friendly => "Friendly",
            AffinityTier::CloseAlly => "Close Ally",
        }
    }
}

/// Unordered pair of survivors, stored low id first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub low: AgentId,
    pub high: AgentId,
}

impl EdgeKey {
    pub fn new(a: AgentId, b: AgentId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }
}

/// Both directions of one relationship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub key: EdgeKey,
    /// How `key.low` feels about `key.high`
    pub low_to_high: f32,
    /// How `key.high` feels about `key.low`
    pub high_to_low: f32,
}

impl RelationshipEdge {
    fn symmetric(key: EdgeKey, value: f32) -> Self {
        let value = value.clamp(MIN_AFFINITY, MAX_AFFINITY);
        Self {
            key,
            low_to_high: value,
            high_to_low: value,
        }
    }

    /// Affinity held by `from` toward the other end of the edge
    pub fn from(&self, from: AgentId) -> f32 {
        if from == self.key.low {
            self.low_to_high
        } else {
            self.high_to_low
        }
    }

    fn set_from(&mut self, from: AgentId, value: f32) {
        let value = value.clamp(MIN_AFFINITY, MAX_AFFINITY);
        if from == self.key.low {
            self.low_to_high = value;
        } else {
            self.high_to_low = value;
        }
    }
}

/// Serializable form of the graph, for lossless save/load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub personalities: Vec<(AgentId, Personality)>,
    pub edges: Vec<RelationshipEdge>,
}

/// Resource: Graph of all relationships between survivors
#[derive(Resource, Debug, Clone)]
pub struct RelationshipGraph {
    tuning: RelationshipTuning,
    personalities: BTreeMap<AgentId, Personality>,
    edges: BTreeMap<EdgeKey, RelationshipEdge>,
}

impl Default for RelationshipGraph {
    fn default() -> Self {
        Self::new(RelationshipTuning::default())
    }
}

impl RelationshipGraph {
    pub fn new(tuning: RelationshipTuning) -> Self {
        Self {
            tuning,
            personalities: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    /// Make a survivor known to the graph
    pub fn register(&mut self, agent: AgentId, personality: Personality) {
        self.personalities.insert(agent, personality);
    }

    pub fn is_registered(&self, agent: AgentId) -> bool {
        self.personalities.contains_key(&agent)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All stored edges, ordered by key
    pub fn edges(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.edges.values()
    }

    /// Stored affinity from `from` toward `to`, without initializing it
    pub fn peek(&self, from: AgentId, to: AgentId) -> Option<f32> {
        self.edges.get(&EdgeKey::new(from, to)).map(|e| e.from(from))
    }

    /// Affinity from `from` toward `to`, initializing the pair on first query
    pub fn get_affinity(
        &mut self,
        from: AgentId,
        to: AgentId,
        rng: &mut impl Rng,
    ) -> Result<f32, SocialError> {
        Ok(self.ensure_edge(from, to, rng)?.from(from))
    }

    /// Apply `delta` to from->to, and `delta` plus a little noise to to->from
    pub fn change_affinity(
        &mut self,
        from: AgentId,
        to: AgentId,
        delta: f32,
        rng: &mut impl Rng,
    ) -> Result<(), SocialError> {
        let spread = self.tuning.mirror_noise.abs();
        let mirror_noise = rng.gen_range(-spread..=spread) as f32;
        let edge = self.ensure_edge(from, to, rng)?;

        let forward = edge.from(from) + delta;
        let backward = edge.from(to) + delta + mirror_noise;
        edge.set_from(from, forward);
        edge.set_from(to, backward);
        Ok(())
    }

    /// Overwrite from->to. A pair seen for the first time gets the value in
    /// both directions.
    pub fn set_affinity(&mut self, from: AgentId, to: AgentId, value: f32) -> Result<(), SocialError> {
        self.check_pair(from, to)?;
        let key = EdgeKey::new(from, to);
        self.edges
            .entry(key)
            .and_modify(|e| e.set_from(from, value))
            .or_insert_with(|| RelationshipEdge::symmetric(key, value));
        Ok(())
    }

    /// Overwrite both directions of a pair
    pub fn set_mutual(&mut self, a: AgentId, b: AgentId, value: f32) -> Result<(), SocialError> {
        self.check_pair(a, b)?;
        let key = EdgeKey::new(a, b);
        self.edges.insert(key, RelationshipEdge::symmetric(key, value));
        Ok(())
    }

    /// Descriptive tier of from->to
    pub fn describe(
        &mut self,
        from: AgentId,
        to: AgentId,
        rng: &mut impl Rng,
    ) -> Result<AffinityTier, SocialError> {
        Ok(AffinityTier::from_value(self.get_affinity(from, to, rng)?))
    }

    /// Lower of the two directions; what a pair can rely on
    pub fn mutual_affinity(
        &mut self,
        a: AgentId,
        b: AgentId,
        rng: &mut impl Rng,
    ) -> Result<f32, SocialError> {
        let edge = self.ensure_edge(a, b, rng)?;
        Ok(edge.low_to_high.min(edge.high_to_low))
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            personalities: self.personalities.iter().map(|(id, p)| (*id, *p)).collect(),
            edges: self.edges.values().copied().collect(),
        }
    }

    pub fn from_snapshot(tuning: RelationshipTuning, snapshot: GraphSnapshot) -> Self {
        Self {
            tuning,
            personalities: snapshot.personalities.into_iter().collect(),
            edges: snapshot.edges.into_iter().map(|e| (e.key, e)).collect(),
        }
    }

    fn check_pair(&self, a: AgentId, b: AgentId) -> Result<(), SocialError> {
        if a == b {
            return Err(SocialError::SelfRelationship(a));
        }
        for id in [a, b] {
            if !self.is_registered(id) {
                return Err(SocialError::UnknownAgent(id));
            }
        }
        Ok(())
    }

    fn ensure_edge(
        &mut self,
        a: AgentId,
        b: AgentId,
        rng: &mut impl Rng,
    ) -> Result<&mut RelationshipEdge, SocialError> {
        self.check_pair(a, b)?;
        let key = EdgeKey::new(a, b);
        if !self.edges.contains_key(&key) {
            let value = self.initial_affinity(a, b, rng);
            self.edges.insert(key, RelationshipEdge::symmetric(key, value));
        }
        self.edges
            .get_mut(&key)
            .ok_or(SocialError::UnknownAgent(a))
    }

    /// First-impression affinity from personality proximity plus noise
    fn initial_affinity(&self, a: AgentId, b: AgentId, rng: &mut impl Rng) -> f32 {
        let t = &self.tuning;
        let distance = match (self.personalities.get(&a), self.personalities.get(&b)) {
            (Some(pa), Some(pb)) => pa.distance(pb),
            _ => 0.0,
        };

        let mut value = t.base_affinity;
        if distance < t.proximity_window && t.proximity_window > 0.0 {
            value += (t.proximity_window - distance) / t.proximity_window * t.proximity_bonus;
        } else if distance > t.divergence_threshold {
            value -= (distance - t.divergence_threshold) * t.divergence_rate;
        }

        let noise = t.initial_noise.abs();
        value += rng.gen_range(-noise..=noise);
        value.clamp(t.initial_min, t.initial_max)
    }
}
