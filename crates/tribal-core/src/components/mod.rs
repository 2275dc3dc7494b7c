//! Components
//!
//! Data for survivors, tribes, relationships and alliances.

pub mod agent;
pub mod alliance;
pub mod social;
pub mod tribe;

pub use agent::*;
pub use alliance::*;
pub use social::*;
pub use tribe::*;
