//! Alliance Re-evaluation
//!
//! Relationship changes never reshape alliances on their own. After a batch
//! of affinity changes the caller runs [`reevaluate_alliances`] for each
//! touched pair.

use rand::Rng;
use tribal_events::{AgentId, AllianceId};

use crate::components::alliance::{AllianceChange, AllianceRegistry};
use crate::components::social::{RelationshipGraph, SocialError};

/// Bring the alliances of `a` and `b` in line with how they now feel about
/// each other.
///
/// - Allies whose mutual affinity fell below the break threshold split: the
///   less attached of the two leaves each shared alliance.
/// - Non-allies above the join threshold recruit one another into an existing
///   alliance (unanimous consent), or start a new one.
pub fn reevaluate_alliances(
    registry: &mut AllianceRegistry,
    graph: &mut RelationshipGraph,
    rng: &mut impl Rng,
    a: AgentId,
    b: AgentId,
) -> Result<Vec<AllianceChange>, SocialError> {
    let mut changes = Vec::new();
    let tuning = registry.tuning().clone();
    let shared = registry.shared_alliances(a, b);

    if !shared.is_empty() {
        if graph.mutual_affinity(a, b, rng)? < tuning.break_threshold {
            for id in shared {
                let leaver = less_attached(registry, graph, rng, id, a, b)?;
                tracing::info!("{} walks away from {} after falling out with the other", leaver, id);
                changes.extend(registry.remove_member(id, leaver));
            }
        }
        return Ok(changes);
    }

    if graph.get_affinity(a, b, rng)? < tuning.join_threshold {
        return Ok(changes);
    }

    for (member, candidate) in [(a, b), (b, a)] {
        let ids: Vec<AllianceId> = registry.alliances_of(member).iter().map(|al| al.id).collect();
        for id in ids {
            if registry.add_member(id, candidate, graph, rng)? {
                tracing::info!("{} brought {} into {}", member, candidate, id);
                changes.push(AllianceChange::Joined { alliance: id, agent: candidate });
                return Ok(changes);
            }
        }
    }

    if let Some(id) = registry.try_form(a, b, graph, rng)? {
        tracing::info!("{} and {} formed {}", a, b, id);
        changes.push(AllianceChange::Formed {
            alliance: id,
            members: vec![a, b],
        });
    }
    Ok(changes)
}

/// Of `a` and `b`, the one with lower mean affinity toward the rest of the
/// alliance; `b` on ties
fn less_attached(
    registry: &AllianceRegistry,
    graph: &mut RelationshipGraph,
    rng: &mut impl Rng,
    id: AllianceId,
    a: AgentId,
    b: AgentId,
) -> Result<AgentId, SocialError> {
    let others: Vec<AgentId> = registry
        .get(id)
        .map(|al| {
            al.members()
                .iter()
                .copied()
                .filter(|m| *m != a && *m != b)
                .collect()
        })
        .unwrap_or_default();
    if others.is_empty() {
        return Ok(b);
    }

    let mut attachment = |agent: AgentId| -> Result<f32, SocialError> {
        let mut total = 0.0;
        for &other in &others {
            total += graph.get_affinity(agent, other, rng)?;
        }
        Ok(total / others.len() as f32)
    };
    let a_score = attachment(a)?;
    let b_score = attachment(b)?;
    Ok(if a_score < b_score { a } else { b })
}
