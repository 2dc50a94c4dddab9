use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::camera::domain::camera_device::FrameSource;
use crate::recognition::domain::inference_error::InferenceError;
use crate::recognition::domain::recognition_result::RecognitionResult;
use crate::recognition::domain::recognizer::Recognizer;
use crate::recognition::scheduler_core::{
    Completion, SchedulerCore, SchedulerPhase, SchedulerStats, TickDecision, Ticket,
};
use crate::sampling::frame_sampler::{CaptureSize, FrameSampler};

const UPDATE_CHANNEL_CAPACITY: usize = 16;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("inference scheduler is already running")]
    AlreadyRunning,
    #[error("frame source is not live")]
    SourceNotLive,
}

/// Fixed-cadence recognition loop over a live frame source.
///
/// Layout: `ticker thread [sample] → request thread [recognize] → core`
///
/// The ticker never waits on the network; each dispatched round runs on its
/// own short-lived thread and reports back through [`SchedulerCore`], which
/// drops ticks while a round is outstanding and discards rounds that finish
/// after a stop.
pub struct InferenceScheduler {
    recognizer: Arc<dyn Recognizer>,
    sampler: FrameSampler,
    cadence: Duration,
    core: Arc<Mutex<SchedulerCore>>,
    updates_tx: Sender<RecognitionResult>,
    updates_rx: Receiver<RecognitionResult>,
    ticker: Option<Ticker>,
}

struct Ticker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl InferenceScheduler {
    pub fn new(recognizer: Arc<dyn Recognizer>, sampler: FrameSampler, cadence: Duration) -> Self {
        let (updates_tx, updates_rx) = crossbeam_channel::bounded(UPDATE_CHANNEL_CAPACITY);
        Self {
            recognizer,
            sampler,
            cadence,
            core: Arc::new(Mutex::new(SchedulerCore::new())),
            updates_tx,
            updates_rx,
            ticker: None,
        }
    }

    pub fn start(&mut self, source: Arc<dyn FrameSource>) -> Result<(), SchedulerError> {
        if self.ticker.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }
        if !source.is_live() {
            return Err(SchedulerError::SourceNotLive);
        }

        {
            let mut core = lock(&self.core);
            core.start();
            self.updates_rx.try_iter().for_each(drop);
        }

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let round = Round {
            recognizer: self.recognizer.clone(),
            core: self.core.clone(),
            updates_tx: self.updates_tx.clone(),
        };
        let handle = spawn_ticker(
            source,
            self.sampler.clone(),
            self.cadence,
            round,
            stop_rx,
        );
        self.ticker = Some(Ticker { stop_tx, handle });

        log::info!(
            "Inference scheduler started (cadence {} ms)",
            self.cadence.as_millis()
        );
        Ok(())
    }

    /// Cancels the tick and forgets the latest result. An outstanding request
    /// is left to finish; its result is discarded. Idempotent.
    pub fn stop(&mut self) {
        {
            let mut core = lock(&self.core);
            core.stop();
            self.updates_rx.try_iter().for_each(drop);
        }

        if let Some(ticker) = self.ticker.take() {
            let _ = ticker.stop_tx.send(());
            if ticker.handle.join().is_err() {
                log::error!("Inference ticker thread panicked");
            }
            log::info!("Inference scheduler stopped");
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        lock(&self.core).phase()
    }

    pub fn latest(&self) -> Option<RecognitionResult> {
        lock(&self.core).latest().cloned()
    }

    /// Results in publication order. Lossy when nobody reads; the newest
    /// result is always available through [`latest`](Self::latest).
    pub fn updates(&self) -> Receiver<RecognitionResult> {
        self.updates_rx.clone()
    }

    pub fn stats(&self) -> SchedulerStats {
        lock(&self.core).stats()
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }
}

impl Drop for InferenceScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Clone)]
struct Round {
    recognizer: Arc<dyn Recognizer>,
    core: Arc<Mutex<SchedulerCore>>,
    updates_tx: Sender<RecognitionResult>,
}

fn spawn_ticker(
    source: Arc<dyn FrameSource>,
    sampler: FrameSampler,
    cadence: Duration,
    round: Round,
    stop_rx: Receiver<()>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let ticks = crossbeam_channel::tick(cadence);
        loop {
            crossbeam_channel::select! {
                recv(stop_rx) -> _ => break,
                recv(ticks) -> _ => on_tick(&*source, &sampler, &round),
            }
        }
    })
}

fn on_tick(source: &dyn FrameSource, sampler: &FrameSampler, round: &Round) {
    let ticket = match lock(&round.core).on_tick() {
        TickDecision::Dispatch(ticket) => ticket,
        TickDecision::SkipInFlight => {
            log::debug!("Inference tick skipped: request in flight");
            return;
        }
        TickDecision::SkipIdle => return,
    };

    match sampler.capture(source, CaptureSize::Native) {
        Ok(image) => {
            let round = round.clone();
            std::thread::spawn(move || {
                let outcome = round.recognizer.recognize(&image);
                round.complete(ticket, outcome);
            });
        }
        Err(e) => {
            log::debug!("Inference tick skipped: {e}");
            lock(&round.core).abandon(ticket);
        }
    }
}

impl Round {
    fn complete(&self, ticket: Ticket, outcome: Result<RecognitionResult, InferenceError>) {
        let mut core = lock(&self.core);
        if let Completion::Published(result) = core.complete(ticket, outcome) {
            // Sent under the lock so a concurrent stop drains it.
            let _ = self.updates_tx.try_send(result);
        }
    }
}

fn lock(core: &Mutex<SchedulerCore>) -> MutexGuard<'_, SchedulerCore> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}
