#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use async_trait::async_trait;
use sitebox_core::{
    CancellationToken, DownloadConfig, EngineError, EngineEvent, EngineEventKind, EngineFactory,
    EngineOptions, HistoryEntry, JobId, ProgressEvent, ProgressSink, SiteEngine, UiMessage,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fake engine whose behavior is picked by the URL path:
/// `/hang` runs until cancelled, `/stubborn` ignores cancellation and
/// reports late, `/fail` reports an error, `/offline` fails validation,
/// anything else downloads two files and completes.
pub struct ScriptedEngine {
    options: EngineOptions,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl ScriptedEngine {
    fn emit(&self, kind: EngineEventKind, path: &str, downloaded: u64, errors: u64) {
        if let Some(sink) = &self.sink {
            sink.emit(EngineEvent {
                kind,
                url: format!("{}{}", self.options.url, path),
                file_path: format!("{}{}", self.options.output, path),
                downloaded,
                errors,
                message: format!("{:?}", kind),
            });
        }
    }
}

#[async_trait]
impl SiteEngine for ScriptedEngine {
    fn validate(&self) -> Result<(), EngineError> {
        if !self.options.url.starts_with(&self.options.domain) {
            return Err(EngineError::InvalidInput {
                field: "domain".into(),
                message: "url is outside the domain".into(),
            });
        }
        if self.options.url.ends_with("/offline") {
            return Err(EngineError::Other("engine backend unavailable".into()));
        }
        Ok(())
    }

    fn on_progress(&mut self, sink: Arc<dyn ProgressSink>) {
        self.sink = Some(sink);
    }

    async fn download(&self, cancel: CancellationToken) -> Result<(), EngineError> {
        self.emit(EngineEventKind::Start, "", 0, 0);

        if self.options.url.ends_with("/hang") {
            cancel.cancelled().await;
            return Ok(());
        }

        if self.options.url.ends_with("/stubborn") {
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.emit(EngineEventKind::Download, "/late.html", 99, 0);
            return Ok(());
        }

        if self.options.url.ends_with("/fail") {
            self.emit(EngineEventKind::Error, "/index.html", 0, 1);
            return Err(EngineError::Network("connection refused".into()));
        }

        self.emit(EngineEventKind::Download, "/index.html", 1, 0);
        self.emit(EngineEventKind::Download, "/style.css", 2, 0);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.emit(EngineEventKind::Complete, "", 2, 0);
        Ok(())
    }
}

pub fn scripted_factory() -> Arc<dyn EngineFactory> {
    Arc::new(|options: EngineOptions| -> Box<dyn SiteEngine> {
        Box::new(ScriptedEngine {
            options,
            sink: None,
        })
    })
}

pub fn config(url: &str, output: &std::path::Path) -> DownloadConfig {
    DownloadConfig {
        url: url.to_string(),
        domain: "https://example.com".to_string(),
        output: output.to_string_lossy().to_string(),
        max_depth: 1,
        concurrent: 2,
        retries: 0,
        ..Default::default()
    }
}

/// Wait for the next finished job, collecting the progress seen on the way
pub async fn next_finished(rx: &Receiver<UiMessage>) -> (HistoryEntry, Vec<ProgressEvent>) {
    let (_, entry, progress) = next_finished_tagged(rx).await;
    (entry, progress.into_iter().map(|(_, event)| event).collect())
}

/// Like `next_finished`, keeping the job id of every message
pub async fn next_finished_tagged(
    rx: &Receiver<UiMessage>,
) -> (JobId, HistoryEntry, Vec<(JobId, ProgressEvent)>) {
    let mut progress = Vec::new();
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for job")
            .expect("ui channel closed");
        match msg {
            UiMessage::Progress { job_id, event } => progress.push((job_id, event)),
            UiMessage::JobFinished { job_id, entry } => return (job_id, entry, progress),
            UiMessage::JobFailed { .. } => {}
        }
    }
}
