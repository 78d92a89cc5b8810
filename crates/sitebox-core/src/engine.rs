//! Engine contract
//!
//! The crawl, fetch and write logic lives in an external site download
//! engine. This module describes the narrow surface the job manager drives
//! it through and converts between engine types and application types.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::types::{DownloadConfig, ProgressEvent, ProgressKind};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

/// Builder-style engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub domain: String,
    pub url: String,
    pub output: String,
    /// Subdirectory appended to `output`; empty saves directly into it
    pub suffix: String,
    pub max_depth: u32,
    pub concurrent: u32,
    pub retries: u32,
    pub images: bool,
    /// Terminal progress bar
    pub progress: bool,
    pub verbose: bool,
    /// `None` keeps the engine's own defaults
    pub blacklist: Option<Vec<String>>,
    pub extensions: Option<Vec<String>>,
    pub image_extensions: Option<Vec<String>>,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn concurrent(mut self, concurrent: u32) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn images(mut self, images: bool) -> Self {
        self.images = images;
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn blacklist(mut self, blacklist: Vec<String>) -> Self {
        self.blacklist = Some(blacklist);
        self
    }

    pub fn extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = Some(extensions);
        self
    }

    pub fn image_extensions(mut self, extensions: Vec<String>) -> Self {
        self.image_extensions = Some(extensions);
        self
    }
}

/// Kind of an engine notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEventKind {
    Start,
    Download,
    Error,
    Complete,
}

/// Status notification emitted by the engine while it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub kind: EngineEventKind,
    pub url: String,
    pub file_path: String,
    /// Cumulative successful downloads
    pub downloaded: u64,
    /// Cumulative errors
    pub errors: u64,
    pub message: String,
}

impl From<EngineEvent> for ProgressEvent {
    fn from(event: EngineEvent) -> Self {
        let kind = match event.kind {
            EngineEventKind::Start => ProgressKind::Start,
            EngineEventKind::Download => ProgressKind::Download,
            EngineEventKind::Error => ProgressKind::Error,
            EngineEventKind::Complete => ProgressKind::Complete,
        };

        ProgressEvent {
            kind,
            url: event.url,
            file_path: event.file_path,
            downloaded: event.downloaded,
            errors: event.errors,
            message: event.message,
        }
    }
}

/// Receiver of engine notifications. Must not block.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// One configured engine instance, good for a single run
#[async_trait]
pub trait SiteEngine: Send + Sync {
    /// Check the configuration without touching the network
    fn validate(&self) -> Result<(), EngineError>;

    /// Register the sink that receives every notification of the run
    fn on_progress(&mut self, sink: Arc<dyn ProgressSink>);

    /// Run the job to the end.
    ///
    /// `cancel` is raised when the job is stopped or superseded; engines
    /// should check it between units of work and return early.
    async fn download(&self, cancel: CancellationToken) -> Result<(), EngineError>;
}

/// Builds engine instances from options
pub trait EngineFactory: Send + Sync {
    fn create(&self, options: EngineOptions) -> Box<dyn SiteEngine>;
}

impl<F> EngineFactory for F
where
    F: Fn(EngineOptions) -> Box<dyn SiteEngine> + Send + Sync,
{
    fn create(&self, options: EngineOptions) -> Box<dyn SiteEngine> {
        self(options)
    }
}

/// Translate a job configuration into engine options
pub fn engine_options(config: &DownloadConfig) -> EngineOptions {
    let mut options = EngineOptions::new()
        .domain(&config.domain)
        .url(&config.url)
        .output(&config.output)
        .suffix("")
        .max_depth(non_negative(config.max_depth))
        .concurrent(non_negative(config.concurrent))
        .retries(non_negative(config.retries))
        .images(config.include_images)
        .progress(false)
        .verbose(false);

    if !config.blacklist.is_empty() {
        options = options.blacklist(config.blacklist.clone());
    }
    if !config.extensions.is_empty() {
        options = options.extensions(config.extensions.clone());
    }
    if !config.image_extensions.is_empty() {
        options = options.image_extensions(config.image_extensions.clone());
    }

    options
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}
