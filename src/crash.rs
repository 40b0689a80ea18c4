//! # Crash report: out-of-band fault detail.
//!
//! The duplex channel carries only small signals, so the full fault detail
//! travels through a file at a path derived from the supervisor name.
//!
//! ## Ownership phases
//! ```text
//! worker:     process() fails ─► write() ─► send Exception ─► append_unexpected()* ─► (ExceptionAck) exit
//! supervisor:                              receive Exception ─► send ExceptionAck ─► take() (read + delete)
//! ```
//! The phases never overlap: the worker stops touching the file before it
//! exits, and the supervisor reads it only after the worker has exited.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::RuntimeError;

const RULE: &str = "--------------------------------------------------------------";

/// File extension of crash reports.
pub const EXTENSION: &str = "crash";

/// Fault captured by the worker loop.
#[derive(Debug, Clone)]
pub struct Fault {
    /// One-line summary (error display or panic message).
    pub summary: String,
    /// Full detail: error chain, or panic location plus backtrace.
    pub detail: String,
}

/// Handle to the crash report of one supervisor name.
#[derive(Debug, Clone)]
pub struct CrashReport {
    path: PathBuf,
}

impl CrashReport {
    /// Report for `name` inside `dir`.
    pub fn for_name(dir: &Path, name: &str) -> Self {
        Self {
            path: dir.join(format!("{name}.{EXTENSION}")),
        }
    }

    /// Report at an explicit path (used by the worker, which receives it from its parent).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if the file exists.
    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Writes a fresh report, replacing any leftover file.
    ///
    /// Returns `true` if a previous file had to be overwritten.
    pub async fn write(&self, header: &Header<'_>, fault: &Fault) -> Result<bool, RuntimeError> {
        let overwritten = self.exists().await;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let mut text = String::new();
        if overwritten {
            text.push_str("A crash report already existed at this path and was overwritten.\n\n");
        }
        text.push_str(&format!(
            "Worker {name:?} crashed\n\
             task:   {kind}\n\
             pid:    {pid}\n\
             signal: {signal}\n\
             at:     {at}\n\
             {RULE}\n\
             {summary}\n\n\
             {detail}\n\
             {RULE}\n",
            name = header.name,
            kind = header.kind,
            pid = header.pid,
            signal = header.signal,
            at = timestamp(),
            summary = fault.summary,
            detail = fault.detail.trim_end(),
        ));
        text.push_str("The worker now waits for ExceptionAck from its supervisor.\n");
        text.push_str("Signals received meanwhile are logged below and not processed.\n");
        text.push_str(RULE);
        text.push('\n');

        fs::write(&self.path, text).await?;
        Ok(overwritten)
    }

    /// Appends one line recording a signal received while faulted.
    pub async fn append_unexpected(&self, index: u32, signal: &str) -> Result<(), RuntimeError> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;
        let line = format!(
            " . Received signal [{index:04}]: {signal:?} at {}\n",
            timestamp()
        );
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Reads the whole report, then deletes it.
    pub async fn take(&self) -> Result<String, RuntimeError> {
        let text = fs::read_to_string(&self.path).await?;
        fs::remove_file(&self.path).await?;
        Ok(text)
    }
}

/// Identity lines at the top of a report.
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    /// Supervisor name.
    pub name: &'a str,
    /// Task kind.
    pub kind: &'a str,
    /// Worker pid.
    pub pid: u32,
    /// Signal being processed when the fault happened.
    pub signal: &'a str,
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Header<'static> {
        Header {
            name: "boom",
            kind: "boom-task",
            pid: 42,
            signal: "detonate",
        }
    }

    fn fault() -> Fault {
        Fault {
            summary: "execution failed: kaboom".into(),
            detail: "Fail { error: \"kaboom\" }".into(),
        }
    }

    #[tokio::test]
    async fn write_append_take_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let report = CrashReport::for_name(dir.path(), "boom");
        assert!(!report.exists().await);

        let overwritten = report.write(&header(), &fault()).await.unwrap();
        assert!(!overwritten);
        report.append_unexpected(1, "ping").await.unwrap();

        let text = report.take().await.unwrap();
        assert!(text.contains("kaboom"));
        assert!(text.starts_with("Worker \"boom\" crashed\ntask:   boom-task\npid:    42\n"));
        assert!(text.contains("signal: detonate"));
        assert!(text.contains("execution failed: kaboom\n\nFail"));
        assert!(text.contains(" . Received signal [0001]: \"ping\" at "));
        assert!(!report.exists().await);
    }

    #[tokio::test]
    async fn overwrite_is_noted_in_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = CrashReport::for_name(dir.path(), "boom");
        std::fs::write(report.path(), "leftover").unwrap();

        assert!(report.write(&header(), &fault()).await.unwrap());
        let text = report.take().await.unwrap();
        assert!(text.starts_with("A crash report already existed"));
        assert!(!text.contains("leftover"));
    }

    #[test]
    fn path_is_derived_from_name() {
        let report = CrashReport::for_name(Path::new("/tmp/pv"), "t1");
        assert_eq!(report.path(), Path::new("/tmp/pv/t1.crash"));
    }
}
