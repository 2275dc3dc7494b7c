//! Event logging for council and camp events.

pub mod logger;

pub use logger::EventLogger;
