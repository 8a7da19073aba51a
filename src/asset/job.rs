//! One asynchronous fetch + decode of a bundle
//!
//! The load runs as a tokio task and reports back over an mpsc channel. The
//! owner drains that channel with [`AssetLoadJob::poll`] at the start of each
//! frame, so every event is observed on the frame pump's thread and never
//! concurrently with a frame tick.

use super::decode::decode_bundle;
use super::handle::AssetHandle;
use super::source::{BundleSource, ProgressSink};
use crate::error::{JobError, LoadError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What the load task sends back
#[derive(Debug)]
enum JobMessage {
    Progress(f32),
    Completed(AssetHandle),
    Failed(LoadError),
}

/// Events surfaced to the job's owner
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// Non-decreasing progress in `[0, 1]`
    Progress(f32),
    /// Terminal: the decoded asset
    Completed(AssetHandle),
    /// Terminal: why no asset was produced
    Failed(LoadError),
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress(_))
    }
}

/// Lifecycle of a load job
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// Not started
    Idle,
    /// In flight
    Pending,
    Loaded,
    Failed(LoadError),
}

/// Drives exactly one load.
///
/// Guarantees one terminal event per job and no progress after it. A
/// cancelled job emits nothing further at all.
#[derive(Debug)]
pub struct AssetLoadJob {
    source: Arc<dyn BundleSource>,
    stall_timeout: Option<Duration>,
    state: LoadState,
    bundle: Option<String>,
    rx: Option<UnboundedReceiver<JobMessage>>,
    task: Option<JoinHandle<()>>,
    progress: Option<f32>,
    stalled_for: Duration,
}

impl AssetLoadJob {
    pub fn new(source: Arc<dyn BundleSource>) -> Self {
        Self {
            source,
            stall_timeout: None,
            state: LoadState::Idle,
            bundle: None,
            rx: None,
            task: None,
            progress: None,
            stalled_for: Duration::ZERO,
        }
    }

    /// Fail with [`LoadError::TimedOut`] after this much frame time without news
    pub fn with_stall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Begin the fetch and decode on the current tokio runtime
    pub fn start(&mut self, bundle: &str) -> Result<(), JobError> {
        if self.state != LoadState::Idle {
            return Err(JobError::AlreadyStarted);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| JobError::NoRuntime)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let progress_tx = tx.clone();
        let sink = ProgressSink::new(move |p| {
            let _ = progress_tx.send(JobMessage::Progress(p));
        });
        let source = Arc::clone(&self.source);
        let id = bundle.to_string();

        let task = runtime.spawn(async move {
            let outcome = match source.fetch(&id, sink).await {
                Ok(bytes) => tokio::task::spawn_blocking(move || decode_bundle(&id, &bytes))
                    .await
                    .unwrap_or_else(|e| Err(LoadError::decode(format!("decoder panicked: {}", e)))),
                Err(e) => Err(e),
            };
            let _ = tx.send(match outcome {
                Ok(asset) => JobMessage::Completed(asset),
                Err(e) => JobMessage::Failed(e),
            });
        });

        info!("Started loading bundle '{}'", bundle);
        self.bundle = Some(bundle.to_string());
        self.rx = Some(rx);
        self.task = Some(task);
        self.state = LoadState::Pending;
        Ok(())
    }

    /// Drain everything the load task has reported since the last poll
    pub fn poll(&mut self) -> Vec<JobEvent> {
        let mut events = Vec::new();
        while let Some(rx) = self.rx.as_mut() {
            let message = match rx.try_recv() {
                Ok(message) => message,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    JobMessage::Failed(LoadError::network("load task ended without a result"))
                }
            };
            self.stalled_for = Duration::ZERO;
            match message {
                JobMessage::Progress(value) => {
                    let value = value.clamp(0.0, 1.0);
                    if self.progress.map_or(true, |last| value > last) {
                        self.progress = Some(value);
                        debug!("Load progress {:.0}%", value * 100.0);
                        events.push(JobEvent::Progress(value));
                    }
                }
                JobMessage::Completed(asset) => {
                    self.finish(LoadState::Loaded);
                    events.push(JobEvent::Completed(asset));
                }
                JobMessage::Failed(error) => {
                    self.finish(LoadState::Failed(error.clone()));
                    events.push(JobEvent::Failed(error));
                }
            }
        }
        events
    }

    /// Account for `elapsed` frame time; fails the job once it has stalled too long
    pub fn tick(&mut self, elapsed: Duration) -> Option<JobEvent> {
        let timeout = self.stall_timeout?;
        if self.state != LoadState::Pending {
            return None;
        }
        self.stalled_for += elapsed;
        if self.stalled_for < timeout {
            return None;
        }
        let error = LoadError::TimedOut {
            after_secs: self.stalled_for.as_secs_f32(),
        };
        warn!(
            "Load of '{}' stalled, giving up",
            self.bundle.as_deref().unwrap_or_default()
        );
        self.abort_task();
        self.finish(LoadState::Failed(error.clone()));
        Some(JobEvent::Failed(error))
    }

    /// Abandon an in-flight load. No event fires afterward.
    pub fn cancel(&mut self) {
        if self.state == LoadState::Pending {
            info!(
                "Cancelling load of '{}'",
                self.bundle.as_deref().unwrap_or_default()
            );
            self.abort_task();
            self.finish(LoadState::Failed(LoadError::Cancelled));
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == LoadState::Pending
    }

    /// Latest reported progress, 0 before any report
    pub fn progress(&self) -> f32 {
        self.progress.unwrap_or(0.0)
    }

    pub fn bundle(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn finish(&mut self, state: LoadState) {
        self.state = state;
        self.rx = None;
        self.task = None;
    }
}

impl Drop for AssetLoadJob {
    fn drop(&mut self) {
        self.cancel();
    }
}
