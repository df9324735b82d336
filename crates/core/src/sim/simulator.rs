//! Pipeline driver: the per-cycle state machine.
//!
//! The [`Simulator`] owns every piece of machine state (scoreboard, function
//! units, reservation station, queues, statistics) and advances time one
//! cycle at a time. Each cycle decomposes into two half-cycles so that a
//! result broadcast becomes visible to waiting consumers in the same cycle
//! without creating a zero-cycle path through the pipeline:
//!
//! **First half:** State Update frees units and clears the scoreboard for
//! up to `R` completed instructions; execution that fired last cycle
//! completes; ready bits propagate from the scoreboard; the dispatch queue
//! drains into the reservation station; ready entries fire in tag order.
//!
//! **Second half:** the fetch buffer latches into the dispatch queue
//! (claiming destination registers), state-updated entries leave the
//! reservation station, and up to `F` new instructions are fetched.
//!
//! Running State Update before ready propagation realizes the writeback-to-
//! waiters forwarding path: a consumer can fire in the very cycle its
//! producer broadcasts. Dispatch runs after the queue is drained so the
//! depth sampled at cycle start reflects the register-clocked queue.

use crate::config::SimConfig;
use crate::events::{Event, EventSink, Stage};
use crate::pipeline::{FuPool, InFlightInst, ReservationStation, Scoreboard, Tag};
use crate::stats::{SimStats, StatsReport};
use crate::trace::TraceSource;
use log::info;
use std::collections::VecDeque;
use std::io;

/// Cycle interval between progress lines on the diagnostic log.
const PROGRESS_INTERVAL: u64 = 10_000;

/// The out-of-order pipeline simulator.
///
/// All state is owned by the value; independent simulators do not share
/// anything. The caller supplies the trace source and event sink to
/// [`run`](Self::run).
pub struct Simulator {
    config: SimConfig,
    scoreboard: Scoreboard,
    fus: FuPool,
    rs: ReservationStation,
    dispatch_queue: VecDeque<InFlightInst>,
    fetch_buffer: Vec<InFlightInst>,
    cycle: u64,
    next_tag: u64,
    done_fetching: bool,
    /// Tags state-updated this cycle, evicted from the RS in the second half.
    retiring: Vec<Tag>,
    stats: SimStats,
}

impl Simulator {
    /// Creates a simulator for `config`.
    ///
    /// The configuration must have been validated; the core assumes every
    /// resource count is positive.
    pub fn new(config: SimConfig) -> Self {
        Self {
            scoreboard: Scoreboard::new(),
            fus: FuPool::new(&config),
            rs: ReservationStation::new(config.rs_capacity()),
            dispatch_queue: VecDeque::new(),
            fetch_buffer: Vec::with_capacity(config.fetch_rate),
            cycle: 0,
            next_tag: 1,
            done_fetching: false,
            retiring: Vec::new(),
            stats: SimStats::default(),
            config,
        }
    }

    /// Runs the pipeline until the trace is exhausted and every queue has
    /// drained, then flushes the event sink.
    pub fn run<S: TraceSource, E: EventSink>(
        &mut self,
        trace: &mut S,
        events: &mut E,
    ) -> io::Result<()> {
        while !self.tick(trace, events)? {}
        events.flush()
    }

    /// Advances one cycle. Returns `true` once the pipeline has drained.
    pub fn tick<S: TraceSource, E: EventSink>(
        &mut self,
        trace: &mut S,
        events: &mut E,
    ) -> io::Result<bool> {
        self.cycle += 1;
        self.stats.sample_dispatch_queue(self.dispatch_queue.len());

        // First half.
        self.state_update(events)?;
        self.complete_execution(events)?;
        self.propagate_ready();
        self.schedule(events)?;
        self.fire();

        // Second half.
        self.dispatch(events)?;
        let retiring = std::mem::take(&mut self.retiring);
        self.rs.evict(&retiring);
        self.fetch(trace, events)?;

        self.stats.cycles = self.cycle;

        if self.cycle % PROGRESS_INTERVAL == 0 {
            info!(
                "cycle {}: rs={}/{} dq={}",
                self.cycle,
                self.rs.len(),
                self.rs.capacity(),
                self.dispatch_queue.len()
            );
        }

        Ok(self.done_fetching
            && self.fetch_buffer.is_empty()
            && self.dispatch_queue.is_empty()
            && self.rs.is_empty())
    }

    /// State Update: broadcast up to `R` completed results.
    ///
    /// Selection is by `(complete_cycle, tag)` ascending (oldest completion
    /// first, tag as the tie-break), which keeps result-bus contention
    /// deterministic. Each selected instruction frees one unit of
    /// its class and conditionally releases its scoreboard claim. Eviction
    /// from the RS is deferred to the second half so a full station stays
    /// full for this cycle's Schedule.
    fn state_update<E: EventSink>(&mut self, events: &mut E) -> io::Result<()> {
        let mut candidates: Vec<(u64, Tag)> = self
            .rs
            .iter()
            .filter(|inst| inst.execution_complete && inst.state_update_cycle.is_none())
            .filter_map(|inst| inst.complete_cycle.map(|complete| (complete, inst.tag)))
            .collect();
        candidates.sort_unstable();
        candidates.truncate(self.config.result_buses);

        for (_, tag) in candidates {
            if let Some(inst) = self.rs.get_mut(tag) {
                self.fus.release(inst.class);
                if let Some(dest) = inst.dest {
                    self.scoreboard.release(dest, tag);
                }
                inst.state_update_cycle = Some(self.cycle);
                self.stats.total_retired += 1;
                self.retiring.push(tag);
                events.emit(Event {
                    cycle: self.cycle,
                    stage: Stage::StateUpdate,
                    tag,
                })?;
            }
        }
        Ok(())
    }

    /// Completes execution for everything that fired in an earlier cycle
    /// (one-cycle latency: fired at `c`, complete at `c + 1`).
    fn complete_execution<E: EventSink>(&mut self, events: &mut E) -> io::Result<()> {
        let cycle = self.cycle;
        for inst in self.rs.iter_mut() {
            if inst.fired
                && !inst.execution_complete
                && inst.execute_cycle.map_or(false, |fired_at| fired_at < cycle)
            {
                inst.complete_cycle = Some(cycle);
                inst.execution_complete = true;
                events.emit(Event {
                    cycle,
                    stage: Stage::Executed,
                    tag: inst.tag,
                })?;
            }
        }
        Ok(())
    }

    /// Marks sources ready for unfired entries whose producers have
    /// broadcast. Ready bits are sticky: a later dispatch reclaiming the
    /// same register does not clear them.
    fn propagate_ready(&mut self) {
        let scoreboard = &self.scoreboard;
        for inst in self.rs.iter_mut() {
            if inst.fired {
                continue;
            }
            for slot in 0..2 {
                if inst.src_ready[slot] {
                    continue;
                }
                let ready = match inst.srcs[slot] {
                    None => true,
                    Some(reg) => scoreboard.is_ready(reg),
                };
                if ready {
                    inst.src_ready[slot] = true;
                }
            }
        }
    }

    /// Drains the dispatch queue head-first into the reservation station
    /// while capacity lasts.
    ///
    /// Readiness is initialized from the live scoreboard. A source equal to
    /// the instruction's own destination carries no hazard: the value being
    /// read predates the value being written, and the scoreboard entry the
    /// instruction sees is its own claim.
    fn schedule<E: EventSink>(&mut self, events: &mut E) -> io::Result<()> {
        while !self.rs.is_full() {
            let mut inst = match self.dispatch_queue.pop_front() {
                Some(inst) => inst,
                None => break,
            };
            inst.schedule_cycle = Some(self.cycle);
            for slot in 0..2 {
                inst.src_ready[slot] = match inst.srcs[slot] {
                    None => true,
                    Some(reg) => inst.dest == Some(reg) || self.scoreboard.is_ready(reg),
                };
            }
            let tag = inst.tag;
            self.rs.push(inst);
            events.emit(Event {
                cycle: self.cycle,
                stage: Stage::Scheduled,
                tag,
            })?;
        }
        Ok(())
    }

    /// Fires ready entries to function units in tag order.
    ///
    /// An entry scheduled this cycle with ready sources fires immediately;
    /// the pipeline register sits between Dispatch and Schedule, not
    /// between Schedule and wakeup/select. No event is emitted on firing.
    fn fire(&mut self) {
        let mut ready: Vec<Tag> = self
            .rs
            .iter()
            .filter(|inst| inst.ready_to_fire())
            .map(|inst| inst.tag)
            .collect();
        ready.sort_unstable();

        for tag in ready {
            if let Some(inst) = self.rs.get_mut(tag) {
                if self.fus.reserve(inst.class) {
                    inst.fired = true;
                    inst.execute_cycle = Some(self.cycle);
                    self.stats.total_fired += 1;
                }
            }
        }
    }

    /// Latches the fetch buffer into the dispatch queue, claiming
    /// destination registers. The claim is unconditional: the scoreboard
    /// always names the latest dispatched writer, which is what resolves
    /// WAW ordering.
    fn dispatch<E: EventSink>(&mut self, events: &mut E) -> io::Result<()> {
        for mut inst in self.fetch_buffer.drain(..) {
            inst.dispatch_cycle = Some(self.cycle);
            if let Some(dest) = inst.dest {
                self.scoreboard.claim(dest, inst.tag);
            }
            let tag = inst.tag;
            self.dispatch_queue.push_back(inst);
            events.emit(Event {
                cycle: self.cycle,
                stage: Stage::Dispatched,
                tag,
            })?;
        }
        Ok(())
    }

    /// Reads up to `F` instructions into the fetch buffer. The first pull
    /// failure ends fetching for good; there is no partial retry.
    fn fetch<S: TraceSource, E: EventSink>(
        &mut self,
        trace: &mut S,
        events: &mut E,
    ) -> io::Result<()> {
        if self.done_fetching {
            return Ok(());
        }
        for _ in 0..self.config.fetch_rate {
            match trace.next_record() {
                Some(record) => {
                    let tag = Tag(self.next_tag);
                    self.next_tag += 1;
                    self.fetch_buffer
                        .push(InFlightInst::new(tag, &record, self.cycle));
                    events.emit(Event {
                        cycle: self.cycle,
                        stage: Stage::Fetched,
                        tag,
                    })?;
                }
                None => {
                    self.done_fetching = true;
                    break;
                }
            }
        }
        Ok(())
    }

    /// Current cycle (0 before the first tick).
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Configuration the simulator was built with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Running statistics.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// End-of-run report with the derived averages.
    pub fn report(&self) -> StatsReport {
        self.stats.report()
    }

    /// Scoreboard state, for inspection between ticks.
    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }
}
