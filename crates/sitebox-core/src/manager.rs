//! Job lifecycle manager
//!
//! Owns the single active site download. A job moves Idle -> Running and
//! back to Idle when it finishes, is stopped, or is superseded by a newer
//! job. The outcome of every job that is not superseded is written to the
//! history store exactly once.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::engine::{
    engine_options, EngineError, EngineEvent, EngineFactory, ProgressSink, SiteEngine,
};
use crate::error::{Error, Result};
use crate::id::generate_id;
use crate::service::UiMessage;
use crate::store::HistoryStore;
use crate::types::{DownloadConfig, HistoryEntry, JobStatus};

/// Per-process job number, carried by every `UiMessage` of that job
pub type JobId = u64;

/// Cancellation state shared by the manager and one job task
#[derive(Debug, Default)]
struct JobControl {
    cancel: CancellationToken,
    superseded: AtomicBool,
}

impl JobControl {
    fn stop(&self) {
        self.cancel.cancel();
    }

    fn supersede(&self) {
        self.superseded.store(true, Ordering::SeqCst);
        self.cancel.cancel();
    }

    fn is_superseded(&self) -> bool {
        self.superseded.load(Ordering::SeqCst)
    }

    /// Stopped or superseded; either way no longer the active job
    fn is_released(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct ActiveJob {
    id: JobId,
    config: DownloadConfig,
    started_at: DateTime<Utc>,
    control: Arc<JobControl>,
}

#[derive(Default)]
struct ManagerState {
    next_id: JobId,
    active: Option<ActiveJob>,
}

/// Forwards engine notifications to the UI and tracks the highest counts
struct RelaySink {
    job_id: JobId,
    ui_sender: async_channel::Sender<UiMessage>,
    control: Arc<JobControl>,
    downloaded: AtomicU64,
    errors: AtomicU64,
}

impl RelaySink {
    fn new(
        job_id: JobId,
        ui_sender: async_channel::Sender<UiMessage>,
        control: Arc<JobControl>,
    ) -> Self {
        Self {
            job_id,
            ui_sender,
            control,
            downloaded: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    fn counts(&self) -> (u64, u64) {
        (
            self.downloaded.load(Ordering::SeqCst),
            self.errors.load(Ordering::SeqCst),
        )
    }
}

impl ProgressSink for RelaySink {
    fn emit(&self, event: EngineEvent) {
        // Counts are cumulative; concurrent workers may report them out of order
        self.downloaded.fetch_max(event.downloaded, Ordering::SeqCst);
        self.errors.fetch_max(event.errors, Ordering::SeqCst);

        // A stopped or superseded job must not interleave with its successor
        if self.control.is_released() {
            return;
        }
        send_ui(
            &self.ui_sender,
            UiMessage::Progress {
                job_id: self.job_id,
                event: event.into(),
            },
        );
    }
}

/// Everything a job task needs once it is detached from the caller
struct JobRun {
    id: JobId,
    config: DownloadConfig,
    started_at: DateTime<Utc>,
    engine: Box<dyn SiteEngine>,
    control: Arc<JobControl>,
    sink: Arc<RelaySink>,
    state: Arc<Mutex<ManagerState>>,
    history: Arc<HistoryStore>,
    ui_sender: async_channel::Sender<UiMessage>,
}

/// Starts, stops and supervises site download jobs
pub struct DownloadManager {
    factory: Arc<dyn EngineFactory>,
    history: Arc<HistoryStore>,
    ui_sender: async_channel::Sender<UiMessage>,
    runtime: Handle,
    state: Arc<Mutex<ManagerState>>,
}

impl DownloadManager {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        history: Arc<HistoryStore>,
        ui_sender: async_channel::Sender<UiMessage>,
        runtime: Handle,
    ) -> Self {
        Self {
            factory,
            history,
            ui_sender,
            runtime,
            state: Arc::new(Mutex::new(ManagerState::default())),
        }
    }

    /// Check a configuration without starting anything
    pub fn validate(&self, config: &DownloadConfig) -> Result<()> {
        self.build_engine(config).map(|_| ())
    }

    /// Start a job for `config` and return without waiting for it.
    ///
    /// A running job is cancelled and its outcome discarded.
    pub fn start(&self, config: DownloadConfig) -> Result<()> {
        let mut engine = self.build_engine(&config)?;
        let control = Arc::new(JobControl::default());

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = state.active.take() {
            log::info!("Superseding download of {}", previous.config.url);
            previous.control.supersede();
        }

        state.next_id += 1;
        let id = state.next_id;
        let started_at = Utc::now();

        let sink = Arc::new(RelaySink::new(id, self.ui_sender.clone(), control.clone()));
        engine.on_progress(sink.clone());
        log::info!("Starting download {} of {} into {}", id, config.url, config.output);

        // The task cannot observe the state before this lock is released
        self.runtime.spawn(run_job(JobRun {
            id,
            config: config.clone(),
            started_at,
            engine,
            control: control.clone(),
            sink,
            state: self.state.clone(),
            history: self.history.clone(),
            ui_sender: self.ui_sender.clone(),
        }));

        state.active = Some(ActiveJob {
            id,
            config,
            started_at,
            control,
        });
        Ok(())
    }

    /// Cancel the running job, if any. The manager is idle on return; the
    /// job records itself as stopped once the engine returns.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(job) = state.active.take() {
            log::info!("Stopping download {} of {}", job.id, job.config.url);
            job.control.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .is_some()
    }

    /// Identifier of the running job, matching its `UiMessage`s
    pub fn current_job_id(&self) -> Option<JobId> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.active.as_ref().map(|job| job.id)
    }

    /// Configuration of the running job
    pub fn current_config(&self) -> Option<DownloadConfig> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.active.as_ref().map(|job| job.config.clone())
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.active.as_ref().map(|job| job.started_at)
    }

    fn build_engine(&self, config: &DownloadConfig) -> Result<Box<dyn SiteEngine>> {
        config.validate()?;
        let engine = self.factory.create(engine_options(config));
        // Whatever the engine objects to, the configuration is what failed
        engine.validate().map_err(|e| match Error::from(e) {
            Error::Engine(message) => Error::Validation(message),
            other => other,
        })?;
        Ok(engine)
    }
}

async fn run_job(job: JobRun) {
    let result = job.engine.download(job.control.cancel.clone()).await;
    let completed_at = Utc::now();

    // Decided under the lock so a concurrent start either supersedes this
    // job first or finds it already finished.
    let status = {
        let mut state = job.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.active.as_ref().map(|active| active.id) == Some(job.id) {
            state.active = None;
        }
        if job.control.is_superseded() {
            None
        } else {
            Some(final_status(&result, job.control.cancel.is_cancelled()))
        }
    };

    let Some(status) = status else {
        log::info!("Discarding outcome of superseded download {}", job.id);
        return;
    };

    if let Err(e) = &result {
        log::error!("Download {} of {} failed: {}", job.id, job.config.url, e);
        if status == JobStatus::Error {
            let message = e.to_string();
            send_ui(
                &job.ui_sender,
                UiMessage::JobFailed {
                    job_id: job.id,
                    message,
                },
            );
        }
    }

    let (downloaded, errors) = job.sink.counts();
    let entry = HistoryEntry {
        id: generate_id(),
        url: job.config.url.clone(),
        domain: job.config.domain.clone(),
        output: job.config.output.clone(),
        started_at: job.started_at,
        completed_at,
        downloaded,
        errors,
        status,
        config: job.config,
    };

    log::info!(
        "Download {} of {} finished: {} ({} downloaded, {} errors)",
        job.id,
        entry.url,
        entry.status,
        entry.downloaded,
        entry.errors
    );

    let history = job.history.clone();
    let record = entry.clone();
    match tokio::task::spawn_blocking(move || history.add(record)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("Failed to save history entry: {}", e),
        Err(e) => log::error!("History write task failed: {}", e),
    }

    send_ui(
        &job.ui_sender,
        UiMessage::JobFinished {
            job_id: job.id,
            entry,
        },
    );
}

fn final_status(result: &std::result::Result<(), EngineError>, cancelled: bool) -> JobStatus {
    match (cancelled, result) {
        (true, _) => JobStatus::Stopped,
        (false, Ok(())) => JobStatus::Completed,
        (false, Err(_)) => JobStatus::Error,
    }
}

/// Deliver a message without waiting; drop it if nobody is keeping up
fn send_ui(sender: &async_channel::Sender<UiMessage>, msg: UiMessage) {
    match sender.try_send(msg) {
        Ok(()) => {}
        Err(async_channel::TrySendError::Full(msg)) => {
            log::debug!("UI channel full, dropping {:?}", msg);
        }
        Err(async_channel::TrySendError::Closed(_)) => {
            log::debug!("UI channel closed, dropping message");
        }
    }
}
