use crate::recognition::domain::inference_error::InferenceError;
use crate::recognition::domain::recognition_result::RecognitionResult;

/// Proof of dispatch for one inference round.
///
/// Carries the run generation it was issued in; a completion whose
/// generation no longer matches is discarded on arrival.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    round: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn round(&self) -> u64 {
        self.round
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickDecision {
    Dispatch(Ticket),
    /// Scheduler is not running.
    SkipIdle,
    /// A request is outstanding; the tick is dropped, not queued.
    SkipInFlight,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    Published(RecognitionResult),
    /// Round failed; the previous result stays.
    Retained,
    /// Stale round from before a stop or restart.
    Discarded,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub dispatched: u64,
    pub skipped_in_flight: u64,
    pub skipped_not_ready: u64,
    pub published: u64,
    pub failed: u64,
    pub discarded: u64,
}

/// Single-slot inference scheduler, free of threads and clocks.
///
/// The in-flight slot survives `stop()`: a restart cannot dispatch until the
/// pre-stop request has come back (and been discarded), so at most one
/// request is ever outstanding.
#[derive(Debug, Default)]
pub struct SchedulerCore {
    enabled: bool,
    generation: u64,
    in_flight: Option<Ticket>,
    latest: Option<RecognitionResult>,
    stats: SchedulerStats,
}

impl SchedulerCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.generation += 1;
        self.enabled = true;
        self.latest = None;
    }

    pub fn stop(&mut self) {
        if self.enabled {
            self.generation += 1;
        }
        self.enabled = false;
        self.latest = None;
    }

    pub fn phase(&self) -> SchedulerPhase {
        if self.enabled {
            SchedulerPhase::Running
        } else {
            SchedulerPhase::Idle
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn latest(&self) -> Option<&RecognitionResult> {
        self.latest.as_ref()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn on_tick(&mut self) -> TickDecision {
        if !self.enabled {
            return TickDecision::SkipIdle;
        }
        self.stats.ticks += 1;
        if self.in_flight.is_some() {
            self.stats.skipped_in_flight += 1;
            return TickDecision::SkipInFlight;
        }
        let ticket = Ticket {
            generation: self.generation,
            round: self.stats.dispatched,
        };
        self.in_flight = Some(ticket);
        self.stats.dispatched += 1;
        TickDecision::Dispatch(ticket)
    }

    /// Releases the slot when no frame could be sampled for a dispatched
    /// tick.
    pub fn abandon(&mut self, ticket: Ticket) {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            self.stats.skipped_not_ready += 1;
        }
    }

    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<RecognitionResult, InferenceError>,
    ) -> Completion {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }
        if !self.enabled || ticket.generation != self.generation {
            self.stats.discarded += 1;
            log::debug!(
                "Discarding inference result from generation {} (current {})",
                ticket.generation,
                self.generation
            );
            return Completion::Discarded;
        }
        match outcome {
            Ok(result) => {
                self.stats.published += 1;
                self.latest = Some(result.clone());
                Completion::Published(result)
            }
            Err(e) => {
                self.stats.failed += 1;
                log::warn!("Inference round failed: {e}");
                Completion::Retained
            }
        }
    }
}
