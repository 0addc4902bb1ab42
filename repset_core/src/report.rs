//! Completion reporting.
//!
//! The controller hands a `CompletionReport` to a `CompletionSink` and moves
//! on. The production sink is a `DispatchHandle`, which queues the report for
//! a background worker that calls the real `CompletionReporter` and logs any
//! failure. Nothing on the session side ever waits for the reporter.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use uuid::Uuid;

/// A finished session, as handed to the completion collaborator
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletionReport {
    pub id: Uuid,
    pub plan_id: String,
    pub plan_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub sets_completed: u32,
    pub exercise_count: u32,
}

/// The collaborator that records a completed session
pub trait CompletionReporter {
    fn report_completion(&mut self, report: &CompletionReport) -> Result<()>;
}

/// Non-blocking outlet the controller sends completion reports to
pub trait CompletionSink {
    fn send(&mut self, report: CompletionReport);
}

/// Collects reports in memory
impl CompletionSink for Vec<CompletionReport> {
    fn send(&mut self, report: CompletionReport) {
        self.push(report);
    }
}

// ============================================================================
// JSONL completion log
// ============================================================================

/// Appends completion reports to a JSON Lines file under an exclusive lock
pub struct JsonlCompletionLog {
    path: PathBuf,
}

impl JsonlCompletionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl CompletionReporter for JsonlCompletionLog {
    fn report_completion(&mut self, report: &CompletionReport) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(report)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended completion {} to {:?}", report.id, self.path);
        Ok(())
    }
}

/// Read every completion report from a log file
///
/// Malformed lines are logged and skipped.
pub fn read_reports(path: &Path) -> Result<Vec<CompletionReport>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut reports = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<CompletionReport>(&line) {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::warn!("Failed to parse completion at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} completions from {:?}", reports.len(), path);
    Ok(reports)
}

// ============================================================================
// Background dispatch
// ============================================================================

enum Message {
    Report(CompletionReport),
    Shutdown,
}

/// Owns the worker thread that drives a `CompletionReporter`
///
/// Dropping the dispatcher (or calling `shutdown`) lets the worker finish
/// everything already queued, then joins it.
pub struct ReportDispatcher {
    tx: Sender<Message>,
    worker: Option<JoinHandle<()>>,
}

impl ReportDispatcher {
    pub fn spawn<R>(mut reporter: R) -> Result<Self>
    where
        R: CompletionReporter + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Message>();

        let worker = thread::Builder::new()
            .name("completion-reporter".into())
            .spawn(move || {
                for message in rx {
                    let report = match message {
                        Message::Report(report) => report,
                        Message::Shutdown => break,
                    };

                    match reporter.report_completion(&report) {
                        Ok(()) => tracing::info!("Reported completion of plan '{}'", report.plan_id),
                        Err(e) => tracing::warn!(
                            "Failed to report completion of plan '{}': {}",
                            report.plan_id,
                            e
                        ),
                    }
                }
            })?;

        Ok(Self {
            tx,
            worker: Some(worker),
        })
    }

    /// A sink that queues reports for this dispatcher
    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            tx: self.tx.clone(),
        }
    }

    /// Drain queued reports and stop the worker
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        // The worker may already be gone if it panicked
        let _ = self.tx.send(Message::Shutdown);
        worker
            .join()
            .map_err(|_| Error::Reporter("completion worker panicked".into()))
    }
}

impl Drop for ReportDispatcher {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("{}", e);
        }
    }
}

/// Cloneable sending side of a `ReportDispatcher`
#[derive(Clone)]
pub struct DispatchHandle {
    tx: Sender<Message>,
}

impl CompletionSink for DispatchHandle {
    fn send(&mut self, report: CompletionReport) {
        let plan_id = report.plan_id.clone();
        if self.tx.send(Message::Report(report)).is_err() {
            tracing::warn!(
                "Completion reporter is gone; dropping report for plan '{}'",
                plan_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn create_test_report(plan_id: &str) -> CompletionReport {
        CompletionReport {
            id: Uuid::new_v4(),
            plan_id: plan_id.into(),
            plan_name: "Test Plan".into(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            sets_completed: 6,
            exercise_count: 2,
        }
    }

    #[derive(Clone, Default)]
    struct SharedReporter {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl CompletionReporter for SharedReporter {
        fn report_completion(&mut self, report: &CompletionReport) -> Result<()> {
            self.seen.lock().unwrap().push(report.plan_id.clone());
            Ok(())
        }
    }

    struct FailingReporter;

    impl CompletionReporter for FailingReporter {
        fn report_completion(&mut self, _report: &CompletionReport) -> Result<()> {
            Err(Error::Reporter("backend unavailable".into()))
        }
    }

    #[test]
    fn test_append_and_read_report() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("completions.jsonl");

        let report = create_test_report("sample");
        let report_id = report.id;

        let mut log = JsonlCompletionLog::new(&log_path);
        log.report_completion(&report).unwrap();

        let reports = read_reports(&log_path).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, report_id);
    }

    #[test]
    fn test_read_skips_malformed_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("completions.jsonl");

        let mut log = JsonlCompletionLog::new(&log_path);
        log.report_completion(&create_test_report("a")).unwrap();
        let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
        writeln!(file, "{{ not json").unwrap();
        log.report_completion(&create_test_report("b")).unwrap();

        let reports = read_reports(&log_path).unwrap();
        assert_eq!(reports.len(), 2);
    }

    #[test]
    fn test_read_missing_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let reports = read_reports(&temp_dir.path().join("nope.jsonl")).unwrap();
        assert!(reports.is_empty());
    }

    #[test]
    fn test_dispatcher_delivers_before_shutdown() {
        let reporter = SharedReporter::default();
        let seen = reporter.seen.clone();

        let dispatcher = ReportDispatcher::spawn(reporter).unwrap();
        let mut handle = dispatcher.handle();
        handle.send(create_test_report("one"));
        handle.send(create_test_report("two"));
        dispatcher.shutdown().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn test_dispatcher_swallows_reporter_errors() {
        crate::logging::init_test();

        let dispatcher = ReportDispatcher::spawn(FailingReporter).unwrap();
        let mut handle = dispatcher.handle();
        handle.send(create_test_report("sample"));

        assert!(dispatcher.shutdown().is_ok());
    }

    #[test]
    fn test_send_after_shutdown_is_dropped() {
        let dispatcher = ReportDispatcher::spawn(SharedReporter::default()).unwrap();
        let mut handle = dispatcher.handle();
        dispatcher.shutdown().unwrap();

        // Must not panic or block
        handle.send(create_test_report("late"));
    }

    #[test]
    fn test_dispatcher_writes_jsonl() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("data").join("completions.jsonl");

        let dispatcher = ReportDispatcher::spawn(JsonlCompletionLog::new(&log_path)).unwrap();
        dispatcher.handle().send(create_test_report("sample"));
        drop(dispatcher);

        let reports = read_reports(&log_path).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].plan_id, "sample");
    }
}
