/*!
 * Progress reporting for the analysis and translation phases.
 *
 * Orchestrators push percentages into a `ProgressSink`. Translation progress
 * is exact (completed chunks over total chunks). Analysis is a single opaque
 * call, so its progress is simulated by a `ProgressTicker` that approaches
 * 99% asymptotically until the call returns.
 */

use log::trace;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Block of the most recently completed chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentBlock {
    pub block_id: String,
    pub timestamp: String,
}

/// Receiver of progress updates. Implementations must tolerate calls from
/// several tasks at once.
pub trait ProgressSink: Send + Sync {
    /// Analysis percentage, 0 to 100
    fn analysis_progress(&self, percent: u8);

    /// Translation percentage, 0 to 100
    fn translation_progress(&self, percent: u8);

    /// Block of the chunk most recently completed, or `None` when idle
    fn current_block(&self, block: Option<CurrentBlock>);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn analysis_progress(&self, _percent: u8) {}
    fn translation_progress(&self, _percent: u8) {}
    fn current_block(&self, _block: Option<CurrentBlock>) {}
}

#[derive(Debug, Default, Clone)]
struct ProgressState {
    analysis: u8,
    translation: u8,
    current: Option<CurrentBlock>,
    analysis_history: Vec<u8>,
    translation_history: Vec<u8>,
}

/// Sink that records the latest values and every emission
#[derive(Debug, Default)]
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analysis(&self) -> u8 {
        self.state.lock().analysis
    }

    pub fn translation(&self) -> u8 {
        self.state.lock().translation
    }

    pub fn current(&self) -> Option<CurrentBlock> {
        self.state.lock().current.clone()
    }

    /// Every analysis value emitted, in order
    pub fn analysis_history(&self) -> Vec<u8> {
        self.state.lock().analysis_history.clone()
    }

    /// Every translation value emitted, in order
    pub fn translation_history(&self) -> Vec<u8> {
        self.state.lock().translation_history.clone()
    }
}

impl ProgressSink for ProgressTracker {
    fn analysis_progress(&self, percent: u8) {
        let mut state = self.state.lock();
        state.analysis = percent;
        state.analysis_history.push(percent);
    }

    fn translation_progress(&self, percent: u8) {
        let mut state = self.state.lock();
        state.translation = percent;
        state.translation_history.push(percent);
    }

    fn current_block(&self, block: Option<CurrentBlock>) {
        self.state.lock().current = block;
    }
}

/// Time constant of the simulated analysis curve: `max(20, chars / 5000)` seconds
pub fn analysis_time_constant(source_chars: usize) -> Duration {
    Duration::from_secs_f64((source_chars as f64 / 5000.0).max(20.0))
}

/// `floor(min(99, 100 · (1 − 1/(t/τ + 1))))`
pub fn simulated_percentage(elapsed: Duration, tau: Duration) -> u8 {
    let tau = tau.as_secs_f64();
    if tau <= 0.0 {
        return 99;
    }
    let ratio = elapsed.as_secs_f64() / tau;
    let percent = 100.0 * (1.0 - 1.0 / (ratio + 1.0));
    percent.clamp(0.0, 99.0).floor() as u8
}

/// Percentage of completed chunks, floored
pub fn chunk_percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed.min(total) * 100) / total) as u8
}

/// Periodic emitter of simulated analysis progress.
///
/// Only strictly increasing values are emitted, and never 100: completion is
/// signalled by the owner after `stop`.
pub struct ProgressTicker {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<u8>>,
}

impl ProgressTicker {
    /// Start ticking every `interval` on the current tokio runtime
    pub fn start(interval: Duration, tau: Duration, sink: Arc<dyn ProgressSink>) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;

            let mut last = 0u8;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let percent = simulated_percentage(started.elapsed(), tau);
                        if percent > last {
                            trace!("Simulated analysis progress {}%", percent);
                            last = percent;
                            sink.analysis_progress(percent);
                        }
                    }
                }
            }
            last
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Stop ticking and wait for the task to end. Returns the last value emitted.
    ///
    /// No emission happens after this returns.
    pub async fn stop(mut self) -> u8 {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or(0),
            None => 0,
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
