//! Cast Generation
//!
//! Functions to create survivors with randomized personalities, divide them
//! into tribes, and seed first impressions and alliances.

use rand::seq::SliceRandom;
use rand::Rng;
use tribal_events::AgentId;

use crate::components::agent::{Agent, Personality};
use crate::components::alliance::{AllianceChange, AllianceRegistry};
use crate::components::social::{RelationshipGraph, SocialError};
use crate::components::tribe::Tribe;
use crate::config::Config;
use crate::season::Season;
use crate::systems::alliance::reevaluate_alliances;

/// Survivor names, handed out in shuffled order
const SURVIVOR_NAMES: &[&str] = &[
    "Alex", "Bree", "Cody", "Dana", "Eli", "Faye", "Gus", "Hana", "Ivan", "Jo",
    "Kai", "Lena", "Milo", "Nina", "Owen", "Pia", "Quinn", "Rudy", "Sue", "Tom",
    "Uma", "Vic", "Wes", "Xena", "Yuri", "Zoe", "Abe", "Bea", "Cal", "Dee",
];

/// Starting tribe names
const TRIBE_NAMES: &[&str] = &["Tagi", "Pagong", "Rattana", "Ulong"];

/// Everything a new season starts from
pub struct CastSetup {
    pub season: Season,
    pub graph: RelationshipGraph,
    pub alliances: AllianceRegistry,
    /// Alliances formed from first impressions
    pub seeded: Vec<AllianceChange>,
}

/// Generate a personality with traits clustered around the middle
fn generate_personality(rng: &mut impl Rng) -> Personality {
    let mut roll = || {
        let a: f32 = rng.gen();
        let b: f32 = rng.gen();
        ((a + b) / 2.0 * 100.0).clamp(5.0, 95.0)
    };
    Personality::new(roll(), roll(), roll(), roll())
}

/// Create `cast_size` survivors. Agent 0 is the human player.
pub fn create_cast(cast_size: usize, rng: &mut impl Rng) -> Vec<Agent> {
    let mut names: Vec<&str> = SURVIVOR_NAMES.to_vec();
    names.shuffle(rng);

    (0..cast_size)
        .map(|i| {
            let name = match names.get(i) {
                Some(name) => name.to_string(),
                None => format!("Survivor {}", i + 1),
            };
            let agent = Agent::new(AgentId(i as u32), name, generate_personality(rng));
            if i == 0 {
                agent.human()
            } else {
                agent
            }
        })
        .collect()
}

/// Shuffle the cast and deal them into `tribe_count` tribes
pub fn divide_into_tribes(agents: &[Agent], tribe_count: usize, rng: &mut impl Rng) -> Vec<Tribe> {
    let tribe_count = tribe_count.clamp(1, TRIBE_NAMES.len());
    let mut order: Vec<AgentId> = agents.iter().map(|a| a.id).collect();
    order.shuffle(rng);

    let mut tribes: Vec<Tribe> = TRIBE_NAMES[..tribe_count].iter().map(|n| Tribe::new(*n)).collect();
    for (i, id) in order.into_iter().enumerate() {
        tribes[i % tribe_count].add_member(id);
    }
    tribes
}

/// Register everyone with the graph and form first impressions between
/// tribemates, then let alliances form from them
pub fn seed_relationships(
    agents: &[Agent],
    tribes: &[Tribe],
    graph: &mut RelationshipGraph,
    registry: &mut AllianceRegistry,
    rng: &mut impl Rng,
) -> Result<Vec<AllianceChange>, SocialError> {
    for agent in agents {
        graph.register(agent.id, agent.personality);
    }

    let mut changes = Vec::new();
    for tribe in tribes {
        let members = tribe.members();
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                graph.get_affinity(a, b, rng)?;
                changes.extend(reevaluate_alliances(registry, graph, rng, a, b)?);
            }
        }
    }
    Ok(changes)
}

/// Build a fresh season from the tuning
pub fn create_season(config: &Config, rng: &mut impl Rng) -> Result<CastSetup, SocialError> {
    let agents = create_cast(config.season.cast_size, rng);
    let tribes = divide_into_tribes(&agents, config.season.tribe_count, rng);

    let mut graph = RelationshipGraph::new(config.relationship.clone());
    let mut alliances = AllianceRegistry::new(config.alliance.clone());
    let seeded = seed_relationships(&agents, &tribes, &mut graph, &mut alliances, rng)?;

    Ok(CastSetup {
        season: Season::new(agents, tribes),
        graph,
        alliances,
        seeded,
    })
}
