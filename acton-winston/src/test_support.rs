//! Recording doubles shared by the unit tests

use std::error::Error as StdError;
use std::sync::{Arc, Mutex};

use crate::level::Level;
use crate::logger::{LogEntry, Logger};
use crate::observability::Diagnostics;

/// Logger that keeps every call
#[derive(Default)]
pub(crate) struct RecordingLogger {
    calls: Mutex<Vec<(Level, LogEntry)>>,
}

impl RecordingLogger {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> Vec<(Level, LogEntry)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn push(&self, level: Level, entry: LogEntry) {
        self.calls.lock().unwrap().push((level, entry));
    }
}

impl Logger for RecordingLogger {
    fn debug(&self, entry: LogEntry) {
        self.push(Level::Debug, entry);
    }

    fn info(&self, entry: LogEntry) {
        self.push(Level::Info, entry);
    }

    fn warn(&self, entry: LogEntry) {
        self.push(Level::Warn, entry);
    }

    fn error(&self, entry: LogEntry) {
        self.push(Level::Error, entry);
    }
}

/// Logger whose every method panics
pub(crate) struct PanickingLogger;

impl Logger for PanickingLogger {
    fn debug(&self, _entry: LogEntry) {
        panic!("sink unavailable");
    }

    fn info(&self, _entry: LogEntry) {
        panic!("sink unavailable");
    }

    fn warn(&self, _entry: LogEntry) {
        panic!("sink unavailable");
    }

    fn error(&self, _entry: LogEntry) {
        panic!("sink unavailable");
    }
}

/// Diagnostics sink that keeps every report as `(scope, message)`
#[derive(Default)]
pub(crate) struct RecordingDiagnostics {
    reports: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingDiagnostics {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn reports(&self) -> Vec<(&'static str, String)> {
        self.reports.lock().unwrap().clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, scope: &'static str, error: &dyn StdError) {
        self.reports.lock().unwrap().push((scope, error.to_string()));
    }
}
