mod common;

use std::time::Duration;

use common::{config, init_logger, next_finished, next_finished_tagged, scripted_factory};
use pretty_assertions::assert_eq;
use sitebox_core::{App, JobStatus, ProgressKind, UiMessage};
use tempfile::TempDir;

#[tokio::test]
async fn completed_job_writes_one_history_entry() {
    init_logger();
    let temp = TempDir::new().unwrap();
    let (app, rx) = App::startup(temp.path(), scripted_factory()).unwrap();

    let cfg = config("https://example.com", temp.path());
    app.start_download(cfg.clone()).unwrap();
    assert!(app.is_running());
    let job_id = app.current_job_id().unwrap();

    let (finished_id, entry, progress) = next_finished_tagged(&rx).await;
    assert_eq!(finished_id, job_id);
    assert_eq!(entry.status, JobStatus::Completed);
    assert!(entry.completed_at > entry.started_at);
    assert_eq!(entry.config, cfg);
    assert_eq!(entry.downloaded, 2);
    assert_eq!(entry.errors, 0);

    assert!(progress.iter().all(|(id, _)| *id == job_id));
    let kinds: Vec<ProgressKind> = progress.iter().map(|(_, e)| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ProgressKind::Start,
            ProgressKind::Download,
            ProgressKind::Download,
            ProgressKind::Complete
        ]
    );
    assert_eq!(progress[1].1.url, "https://example.com/index.html");

    let history = app.get_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, entry.id);
    assert!(!app.is_running());
}

#[tokio::test]
async fn stop_before_completion_records_stopped() {
    init_logger();
    let temp = TempDir::new().unwrap();
    let (app, rx) = App::startup(temp.path(), scripted_factory()).unwrap();

    let cfg = config("https://example.com/hang", temp.path());
    app.start_download(cfg).unwrap();
    app.stop_download();
    assert!(!app.is_running());
    assert!(app.current_config().is_none());
    assert!(app.current_job_id().is_none());

    let (entry, _) = next_finished(&rx).await;
    assert_eq!(entry.status, JobStatus::Stopped);
    assert_eq!(app.get_history().len(), 1);
}

#[tokio::test]
async fn stopped_job_does_not_report_into_next_job() {
    init_logger();
    let temp = TempDir::new().unwrap();
    let (app, rx) = App::startup(temp.path(), scripted_factory()).unwrap();

    let stubborn = config("https://example.com/stubborn", temp.path());
    app.start_download(stubborn).unwrap();
    let old_id = app.current_job_id().unwrap();
    app.stop_download();

    let next = config("https://example.com/hang", temp.path());
    app.start_download(next.clone()).unwrap();
    let new_id = app.current_job_id().unwrap();
    assert_ne!(old_id, new_id);

    // The stubborn engine keeps going and reports after the stop
    let (finished_id, entry, progress) = next_finished_tagged(&rx).await;
    assert_eq!(finished_id, old_id);
    assert_eq!(entry.status, JobStatus::Stopped);
    assert_eq!(entry.downloaded, 99);
    assert!(progress.iter().all(|(id, _)| *id == new_id));

    assert!(app.is_running());
    assert_eq!(app.current_job_id(), Some(new_id));
    assert_eq!(app.current_config(), Some(next));

    app.stop_download();
    let (finished_id, entry, _) = next_finished_tagged(&rx).await;
    assert_eq!(finished_id, new_id);
    assert_eq!(entry.status, JobStatus::Stopped);
    assert_eq!(app.get_history().len(), 2);
}

#[tokio::test]
async fn engine_failure_records_error() {
    init_logger();
    let temp = TempDir::new().unwrap();
    let (app, rx) = App::startup(temp.path(), scripted_factory()).unwrap();

    let cfg = config("https://example.com/fail", temp.path());
    app.start_download(cfg).unwrap();
    let job_id = app.current_job_id().unwrap();

    let mut failure = None;
    let entry = loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match msg {
            UiMessage::JobFailed { job_id: id, message } => failure = Some((id, message)),
            UiMessage::JobFinished { entry, .. } => break entry,
            UiMessage::Progress { .. } => {}
        }
    };

    assert_eq!(entry.status, JobStatus::Error);
    assert_eq!(entry.errors, 1);
    let (failed_id, message) = failure.unwrap();
    assert_eq!(failed_id, job_id);
    assert!(message.contains("connection refused"));
}

#[tokio::test]
async fn new_start_supersedes_running_job() {
    init_logger();
    let temp = TempDir::new().unwrap();
    let (app, rx) = App::startup(temp.path(), scripted_factory()).unwrap();

    let first = config("https://example.com/hang", temp.path());
    let mut second = config("https://example.com/hang", temp.path());
    second.max_depth = 7;

    app.start_download(first).unwrap();
    app.start_download(second.clone()).unwrap();

    assert!(app.is_running());
    assert_eq!(app.current_config(), Some(second.clone()));

    app.stop_download();
    let (entry, _) = next_finished(&rx).await;
    assert_eq!(entry.status, JobStatus::Stopped);
    assert_eq!(entry.config, second);

    // The superseded job has been cancelled too; give it time to finish
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.get_history().len(), 1);
    while let Ok(msg) = rx.try_recv() {
        assert!(!matches!(msg, UiMessage::JobFinished { .. }));
    }
}

#[tokio::test]
async fn invalid_start_leaves_running_job_alone() {
    init_logger();
    let temp = TempDir::new().unwrap();
    let (app, rx) = App::startup(temp.path(), scripted_factory()).unwrap();

    let running = config("https://example.com/hang", temp.path());
    app.start_download(running.clone()).unwrap();

    let err = app.start_download(config("", temp.path())).unwrap_err();
    assert!(err.is_validation());
    let offline = config("https://example.com/offline", temp.path());
    let err = app.start_download(offline).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(app.current_config(), Some(running));

    app.shutdown();
    let (entry, _) = next_finished(&rx).await;
    assert_eq!(entry.status, JobStatus::Stopped);
}

#[tokio::test]
async fn validate_does_not_touch_stores() {
    init_logger();
    let temp = TempDir::new().unwrap();
    let (app, _rx) = App::startup(temp.path(), scripted_factory()).unwrap();

    let err = app.validate_config(&config("", temp.path())).unwrap_err();
    assert!(err.is_validation());

    let minimal = config("https://example.com", temp.path());
    app.validate_config(&minimal).unwrap();

    // Rejected by the engine: url outside the configured domain
    let outside = config("https://other.org", temp.path());
    let err = app.validate_config(&outside).unwrap_err();
    assert!(err.is_validation());

    // Any engine objection is reported as a configuration problem
    let offline = config("https://example.com/offline", temp.path());
    let err = app.validate_config(&offline).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("engine backend unavailable"));

    assert!(!app.is_running());
    assert!(app.get_history().is_empty());
    assert!(app.get_presets().is_empty());
    assert!(!temp.path().join("history.json").exists());
    assert!(!temp.path().join("presets.json").exists());
    assert!(!temp.path().join("settings.json").exists());
}

#[tokio::test]
async fn jobs_finish_without_a_listener() {
    init_logger();
    let temp = TempDir::new().unwrap();
    let (app, rx) = App::startup(temp.path(), scripted_factory()).unwrap();
    drop(rx);

    let cfg = config("https://example.com", temp.path());
    app.start_download(cfg).unwrap();

    for _ in 0..100 {
        if !app.get_history().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(app.get_history().len(), 1);
    assert_eq!(app.get_history()[0].status, JobStatus::Completed);
}

#[tokio::test]
async fn history_survives_restart_and_reruns() {
    init_logger();
    let temp = TempDir::new().unwrap();
    let cfg = config("https://example.com", temp.path());

    let id = {
        let (app, rx) = App::startup(temp.path(), scripted_factory()).unwrap();
        app.start_download(cfg.clone()).unwrap();
        let (entry, _) = next_finished(&rx).await;
        entry.id
    };

    let (app, _rx) = App::startup(temp.path(), scripted_factory()).unwrap();
    let history = app.get_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, id);
    assert_eq!(app.rerun_from_history(&id).unwrap(), cfg);
    assert!(app.rerun_from_history("missing").unwrap_err().is_not_found());

    app.clear_history().unwrap();
    assert!(app.get_history().is_empty());
}

#[tokio::test]
async fn malformed_document_fails_startup() {
    init_logger();
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("presets.json"), "[{\"id\":").unwrap();

    let err = App::startup(temp.path(), scripted_factory()).err().unwrap();
    assert!(err.is_persistence());
}

#[tokio::test]
async fn uncreatable_config_dir_fails_startup() {
    init_logger();
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let config_dir = blocker.join("sitebox");
    let err = App::startup(config_dir, scripted_factory()).err().unwrap();
    assert!(err.is_persistence());
}
