// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Logging service implementations.

use crate::host::{Diagnostic, LoggingService, Severity};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Forwards diagnostics to `tracing` events.
#[derive(Debug, Default)]
pub struct TracingLoggingService {
    errors: AtomicBool,
}

impl TracingLoggingService {
    /// Creates a service with no errors logged.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoggingService for TracingLoggingService {
    fn log(&self, diagnostic: Diagnostic) {
        let file = diagnostic
            .location
            .as_ref()
            .map_or("", |l| l.file.as_str());
        let line = diagnostic.location.as_ref().map_or(0, |l| l.line);
        let code = diagnostic.code.as_deref().unwrap_or("");
        match diagnostic.severity {
            Severity::Error => {
                self.errors.store(true, Ordering::Relaxed);
                tracing::error!(file, line, code, "{}", diagnostic.message);
            }
            Severity::Warning => tracing::warn!(file, line, code, "{}", diagnostic.message),
            Severity::Message => tracing::info!(file, line, code, "{}", diagnostic.message),
        }
    }

    fn has_logged_errors(&self) -> bool {
        self.errors.load(Ordering::Relaxed)
    }
}

/// Captures every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingLoggingService {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl RecordingLoggingService {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics in logging order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Diagnostics of one severity.
    pub fn with_severity(&self, severity: Severity) -> Vec<Diagnostic> {
        self.diagnostics()
            .into_iter()
            .filter(|d| d.severity == severity)
            .collect()
    }

    /// Logged errors.
    pub fn errors(&self) -> Vec<Diagnostic> {
        self.with_severity(Severity::Error)
    }

    /// Logged warnings.
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.with_severity(Severity::Warning)
    }
}

impl LoggingService for RecordingLoggingService {
    fn log(&self, diagnostic: Diagnostic) {
        self.diagnostics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(diagnostic);
    }

    fn has_logged_errors(&self) -> bool {
        self.diagnostics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}
