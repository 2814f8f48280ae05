//! The user-visible activity log: what finished where, what was evicted,
//! what failed. Records accumulate in memory during a run and the whole
//! block is prepended to the log file on exit, newest tick first.

use chrono::{DateTime, Local};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Finish,
    Remove,
    Error,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActivityKind::Finish => "Finish",
            ActivityKind::Remove => "Remove",
            ActivityKind::Error => "Error",
        })
    }
}

#[derive(Debug, Clone)]
struct ActivityRecord {
    at: DateTime<Local>,
    kind: ActivityKind,
    name: String,
    detail: String,
}

impl ActivityRecord {
    fn line(&self) -> String {
        let stamp = self.at.format("%Y-%m-%d %H:%M:%S");
        if self.detail.is_empty() {
            format!("[{stamp}] {}: {}", self.kind, self.name)
        } else {
            format!("[{stamp}] {}: {} ({})", self.kind, self.name, self.detail)
        }
    }
}

pub struct ActivityLog {
    path: PathBuf,
    records: Vec<ActivityRecord>,
}

impl ActivityLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            records: Vec::new(),
        }
    }

    pub fn push(
        &mut self,
        kind: ActivityKind,
        name: impl Into<String>,
        detail: impl Into<String>,
    ) {
        let record = ActivityRecord {
            at: Local::now(),
            kind,
            name: name.into(),
            detail: detail.into(),
        };
        tracing::info!("{}: {} ({})", record.kind, record.name, record.detail);
        self.records.push(record);
    }

    /// Prepend the buffered records to the log file and clear the buffer.
    pub fn flush(&mut self) -> std::io::Result<()> {
        if self.records.is_empty() {
            return Ok(());
        }
        let old = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err),
        };
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&record.line());
            out.push('\n');
        }
        out.push_str(&old);
        std::fs::write(&self.path, out)?;
        self.records.clear();
        Ok(())
    }
}
