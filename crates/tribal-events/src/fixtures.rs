//! Sample data fixtures for testing.
//!
//! This module provides a ready-made council log for other crates to use.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // tribal-events = { path = "../tribal-events", features = ["test-fixtures"] }
//!
//! use tribal_events::fixtures;
//!
//! let events = fixtures::sample_council_log();
//! ```

use crate::{AgentId, CouncilEvent, CouncilEventKind};

/// Returns the sample council log from the fixtures file.
///
/// Five survivors at one council (agent 0 is the human):
/// - an alliance of agents 2 and 3 voting as a bloc
/// - a rejected self-vote
/// - a 2-2 tie between agents 1 and 4
/// - a revote that sends agent 4 home
pub fn sample_council_log() -> Vec<CouncilEvent> {
    let jsonl = include_str!("../tests/fixtures/sample_council.jsonl");
    jsonl
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            CouncilEvent::from_jsonl(l).unwrap_or_else(|e| {
                panic!("Failed to parse event line: {}\nError: {}", l, e)
            })
        })
        .collect()
}

/// Returns a specific event by ID from the sample log.
pub fn get_event(event_id: &str) -> Option<CouncilEvent> {
    sample_council_log()
        .into_iter()
        .find(|e| e.event_id == event_id)
}

/// Returns the survivor eliminated in the sample log.
pub fn eliminated_agent() -> AgentId {
    sample_council_log()
        .into_iter()
        .find_map(|e| match e.kind {
            CouncilEventKind::Eliminated { agent, .. } => Some(agent),
            _ => None,
        })
        .expect("sample log contains an elimination")
}
