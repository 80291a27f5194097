use std::{ops::ControlFlow, pin::Pin, sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior, Sleep},
};

use crate::{
    config::Config,
    models::picker_session::PickerSession,
    picker::PickerError,
    polling::StatusSource,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl PollConfig {
    /// A zero interval falls back to [`DEFAULT_POLL_INTERVAL`].
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        let interval = if interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        Self { interval, max_wait }
    }
}

impl From<&Config> for PollConfig {
    fn from(config: &Config) -> Self {
        Self::new(
            Duration::from_secs(config.poll_interval_secs),
            Duration::from_secs(config.poll_max_wait_secs),
        )
    }
}

/// `IDLE → POLLING → {COMPLETE | TIMED_OUT | CANCELED | FAILED}`; `reset` goes back to IDLE.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Idle,
    Polling,
    Complete(PickerSession),
    TimedOut,
    Canceled,
    Failed(PickerError),
}

#[derive(Debug, Clone)]
struct Snapshot {
    generation: u64,
    state: PollState,
}

/// Polls a [`StatusSource`] until the user finishes picking.
///
/// The repeating tick and the max-wait timer live in a single task, so
/// stopping that task always clears both. Each run gets a generation number;
/// a result from an older generation is dropped instead of applied.
pub struct PollingController {
    source: Arc<dyn StatusSource>,
    config: PollConfig,
    state: Arc<watch::Sender<Snapshot>>,
    task: Option<JoinHandle<()>>,
}

impl PollingController {
    pub fn new(source: Arc<dyn StatusSource>, config: PollConfig) -> Self {
        let (state, _) = watch::channel(Snapshot {
            generation: 0,
            state: PollState::Idle,
        });
        Self {
            source,
            config: PollConfig::new(config.interval, config.max_wait),
            state: Arc::new(state),
            task: None,
        }
    }

    pub fn state(&self) -> PollState {
        self.state.borrow().state.clone()
    }

    /// Begins a new polling run, stopping any run already in progress.
    pub fn start(&mut self) {
        self.stop_task();

        let mut generation = 0;
        self.state.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.state = PollState::Polling;
            generation = snapshot.generation;
        });

        let run = PollRun {
            source: self.source.clone(),
            config: self.config,
            state: self.state.clone(),
            generation,
        };
        self.task = Some(tokio::spawn(run.execute()));
        tracing::debug!(generation, "Started picker status polling");
    }

    /// Stops polling now. A run in progress ends as CANCELED.
    pub fn cancel(&mut self) {
        self.state.send_modify(|snapshot| {
            snapshot.generation += 1;
            if snapshot.state == PollState::Polling {
                snapshot.state = PollState::Canceled;
            }
        });
        self.stop_task();
    }

    /// Returns to IDLE from any state.
    pub fn reset(&mut self) {
        self.state.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.state = PollState::Idle;
        });
        self.stop_task();
    }

    pub fn watch(&self) -> PollWatcher {
        PollWatcher {
            receiver: self.state.subscribe(),
            max_wait: self.config.max_wait,
        }
    }

    /// Waits for the current run to finish. See [`PollWatcher::wait`].
    pub async fn wait(&self) -> Result<PickerSession, PickerError> {
        self.watch().wait().await
    }

    pub async fn poll_until_complete(&mut self) -> Result<PickerSession, PickerError> {
        self.start();
        self.wait().await
    }

    fn stop_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        self.stop_task();
    }
}

/// Observes a controller's state without borrowing the controller.
///
/// A run whose task stops without an outcome ends as CANCELED, so `wait`
/// always resolves.
pub struct PollWatcher {
    receiver: watch::Receiver<Snapshot>,
    max_wait: Duration,
}

impl PollWatcher {
    /// Resolves once the run leaves POLLING. IDLE counts as canceled.
    pub async fn wait(&mut self) -> Result<PickerSession, PickerError> {
        loop {
            let outcome = match &self.receiver.borrow_and_update().state {
                PollState::Polling => None,
                PollState::Complete(session) => Some(Ok(session.clone())),
                PollState::TimedOut => Some(Err(PickerError::PollTimeout(self.max_wait))),
                PollState::Canceled | PollState::Idle => Some(Err(PickerError::PollCanceled)),
                PollState::Failed(err) => Some(Err(err.clone())),
            };
            if let Some(outcome) = outcome {
                return outcome;
            }
            if self.receiver.changed().await.is_err() {
                return Err(PickerError::PollCanceled);
            }
        }
    }
}

struct PollRun {
    source: Arc<dyn StatusSource>,
    config: PollConfig,
    state: Arc<watch::Sender<Snapshot>>,
    generation: u64,
}

impl PollRun {
    async fn execute(self) {
        let deadline = time::sleep(self.config.max_wait);
        tokio::pin!(deadline);

        if self.check(deadline.as_mut()).await.is_break() {
            return;
        }

        let period = self.config.interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = &mut deadline => {
                    self.finish(PollState::TimedOut);
                    return;
                }
                _ = ticker.tick() => {}
            }
            if self.check(deadline.as_mut()).await.is_break() {
                return;
            }
        }
    }

    /// One status call. The deadline still wins if it passes mid-request.
    async fn check(&self, deadline: Pin<&mut Sleep>) -> ControlFlow<()> {
        let result = tokio::select! {
            biased;
            _ = deadline => {
                self.finish(PollState::TimedOut);
                return ControlFlow::Break(());
            }
            result = self.source.refresh_status() => result,
        };

        match result {
            Ok(session) if session.media_items_set => {
                tracing::info!(session_id = %session.id, "Picker selection complete");
                self.finish(PollState::Complete(session));
                ControlFlow::Break(())
            }
            Ok(session) => {
                tracing::debug!(session_id = %session.id, "Picker selection still pending");
                ControlFlow::Continue(())
            }
            Err(err) if err.is_transient() => {
                tracing::warn!(error = %err, "Picker status check failed, retrying on next tick");
                ControlFlow::Continue(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Picker status polling stopped");
                self.finish(PollState::Failed(err));
                ControlFlow::Break(())
            }
        }
    }

    fn finish(&self, outcome: PollState) {
        let applied = self.state.send_if_modified(|snapshot| {
            if snapshot.generation != self.generation || snapshot.state != PollState::Polling {
                return false;
            }
            snapshot.state = outcome;
            true
        });
        if !applied {
            tracing::debug!(
                generation = self.generation,
                "Discarded result of a stopped polling run"
            );
        }
    }
}

impl Drop for PollRun {
    fn drop(&mut self) {
        let abandoned = self.state.send_if_modified(|snapshot| {
            if snapshot.generation != self.generation || snapshot.state != PollState::Polling {
                return false;
            }
            snapshot.state = PollState::Canceled;
            true
        });
        if abandoned {
            tracing::warn!(
                generation = self.generation,
                "Polling run stopped without an outcome"
            );
        }
    }
}
