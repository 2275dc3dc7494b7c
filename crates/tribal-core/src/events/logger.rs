//! Event Logger
//!
//! Append-only JSONL council log, one `CouncilEvent` per line.

use bevy_ecs::prelude::*;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tribal_events::{generate_event_id, CouncilEvent, CouncilEventKind};

/// Where logged events go
enum Sink {
    File(BufWriter<File>),
    Memory(Vec<CouncilEvent>),
    Null,
}

/// Resource for logging events to a JSONL file
#[derive(Resource)]
pub struct EventLogger {
    sink: Sink,
    event_count: u64,
    next_sequence: u64,
}

impl EventLogger {
    /// Create a new event logger writing to the specified path
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::with_sink(Sink::File(BufWriter::new(file))))
    }

    /// Create a logger that discards events
    pub fn null() -> Self {
        Self::with_sink(Sink::Null)
    }

    /// Create a logger that keeps events in memory (for tests and replays)
    pub fn in_memory() -> Self {
        Self::with_sink(Sink::Memory(Vec::new()))
    }

    fn with_sink(sink: Sink) -> Self {
        Self {
            sink,
            event_count: 0,
            next_sequence: 1,
        }
    }

    /// Generate the next event ID
    pub fn next_id(&mut self) -> String {
        let id = generate_event_id(self.next_sequence);
        self.next_sequence += 1;
        id
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Events kept by an in-memory logger (empty for other sinks)
    pub fn events(&self) -> &[CouncilEvent] {
        match &self.sink {
            Sink::Memory(events) => events,
            _ => &[],
        }
    }

    /// Stamp `kind` with the next id and log it
    pub fn log(&mut self, day: u32, council: u32, kind: CouncilEventKind) -> std::io::Result<()> {
        let event = CouncilEvent::new(self.next_id(), day, council, kind);
        self.log_event(event)
    }

    /// Log an already built event
    pub fn log_event(&mut self, event: CouncilEvent) -> std::io::Result<()> {
        self.event_count += 1;
        match &mut self.sink {
            Sink::File(writer) => {
                let json = event.to_jsonl()?;
                writeln!(writer, "{}", json)?;
            }
            Sink::Memory(events) => events.push(event),
            Sink::Null => {}
        }
        Ok(())
    }

    /// Flush the buffer to disk
    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Sink::File(writer) = &mut self.sink {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush event logger: {}", e);
        }
    }
}
