//! Stage-transition event reporting.
//!
//! Every stage transition is reported as one line on an append-only stream:
//! `<cycle>\t<STAGE>\t<tag>`. Within a cycle, lines appear in the order the
//! phases run; within a phase, in the phase's own selection order.
//!
//! The sink is a trait so the CLI can hand the simulator stdout (or a file)
//! while tests collect events in memory.

use crate::pipeline::instruction::Tag;
use std::fmt;
use std::io::{self, Write};

/// Pipeline stage names as they appear in the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Instruction read from the trace into the fetch buffer.
    Fetched,
    /// Instruction moved from the fetch buffer to the dispatch queue.
    Dispatched,
    /// Instruction moved from the dispatch queue to the reservation station.
    Scheduled,
    /// Execution finished (one cycle after firing).
    Executed,
    /// Result broadcast on a result bus; instruction retired.
    StateUpdate,
}

impl Stage {
    /// The stage name as printed in the event stream.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetched => "FETCHED",
            Stage::Dispatched => "DISPATCHED",
            Stage::Scheduled => "SCHEDULED",
            Stage::Executed => "EXECUTED",
            Stage::StateUpdate => "STATE UPDATE",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stage-transition event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Cycle in which the transition happened.
    pub cycle: u64,
    /// Stage entered.
    pub stage: Stage,
    /// Tag of the instruction.
    pub tag: Tag,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.cycle, self.stage, self.tag.0)
    }
}

/// Destination for stage-transition events.
pub trait EventSink {
    /// Records one event.
    fn emit(&mut self, event: Event) -> io::Result<()>;

    /// Flushes any buffered output. Called once when the run finishes.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// In-memory sink; used by tests and available to any embedder.
impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) -> io::Result<()> {
        self.push(event);
        Ok(())
    }
}

/// Sink writing the textual event stream to any `io::Write`.
pub struct StreamSink<W: Write> {
    out: W,
}

impl<W: Write> StreamSink<W> {
    /// Creates a sink over `out`. Output is line-buffered by the caller's
    /// writer; [`EventSink::flush`] is forwarded so ordering survives
    /// program termination.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the sink, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for StreamSink<W> {
    fn emit(&mut self, event: Event) -> io::Result<()> {
        writeln!(self.out, "{}", event)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
