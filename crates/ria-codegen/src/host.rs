// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The narrow surface code generators see of their host.
//!
//! A generator logs diagnostics and asks sharing questions through a
//! [`GenerationHost`]; it never depends on the build environment directly.
//! [`CodeGenerationHost`] is the standard host, forwarding to a
//! [`LoggingService`] and a [`SharedCodeLookup`].

use ria_sharing::{CodeMemberKey, CodeMemberShareKind, SharedCodeLookup};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational message.
    Message,
    /// Something was skipped or degraded.
    Warning,
    /// The build must fail.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Message => "message",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// A position span in a source file. Lines and columns are 1-based; zero
/// means unknown.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File path.
    pub file: String,
    /// Start line.
    pub line: u32,
    /// Start column.
    pub column: u32,
    /// End line.
    pub end_line: u32,
    /// End column.
    pub end_column: u32,
}

impl SourceLocation {
    /// Location naming only a file.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            file: path.into(),
            ..Self::default()
        }
    }
}

/// One logged diagnostic with optional build-system detail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
    /// Subcategory shown by build tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Error or warning code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Help keyword.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_keyword: Option<String>,
    /// Source location, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    /// A diagnostic carrying only a message.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            subcategory: None,
            code: None,
            help_keyword: None,
            location: None,
        }
    }

    /// Attaches a source location.
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Attaches a diagnostic code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.location {
            if loc.line > 0 {
                write!(f, "{}({},{}): ", loc.file, loc.line, loc.column)?;
            } else {
                write!(f, "{}: ", loc.file)?;
            }
        }
        write!(f, "{}", self.severity)?;
        if let Some(code) = &self.code {
            write!(f, " {code}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Sink for generation diagnostics.
///
/// Only [`log`](Self::log) and [`has_logged_errors`](Self::has_logged_errors)
/// are required; the plain-message helpers build a [`Diagnostic`].
pub trait LoggingService: Send + Sync {
    /// Records a diagnostic.
    fn log(&self, diagnostic: Diagnostic);

    /// Whether an error has been logged. Once true it stays true.
    fn has_logged_errors(&self) -> bool;

    /// Logs an error message.
    fn log_error(&self, message: &str) {
        self.log(Diagnostic::new(Severity::Error, message));
    }

    /// Logs a warning message.
    fn log_warning(&self, message: &str) {
        self.log(Diagnostic::new(Severity::Warning, message));
    }

    /// Logs an informational message.
    fn log_message(&self, message: &str) {
        self.log(Diagnostic::new(Severity::Message, message));
    }

    /// Logs an error at a source location.
    fn log_error_at(&self, message: &str, location: SourceLocation) {
        self.log(Diagnostic::new(Severity::Error, message).at(location));
    }

    /// Logs a warning at a source location.
    fn log_warning_at(&self, message: &str, location: SourceLocation) {
        self.log(Diagnostic::new(Severity::Warning, message).at(location));
    }
}

/// Everything a generator needs from its environment: diagnostics plus
/// sharing answers.
pub trait GenerationHost: LoggingService + SharedCodeLookup {}

impl<T: LoggingService + SharedCodeLookup> GenerationHost for T {}

/// Standard [`GenerationHost`] forwarding to a logging service and a shared
/// code lookup.
pub struct CodeGenerationHost {
    logging: Arc<dyn LoggingService>,
    shared_code: Arc<dyn SharedCodeLookup>,
    errors: AtomicBool,
}

impl fmt::Debug for CodeGenerationHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeGenerationHost")
            .field("has_logged_errors", &self.has_logged_errors())
            .finish_non_exhaustive()
    }
}

impl CodeGenerationHost {
    /// Wraps the two collaborators.
    pub fn new(logging: Arc<dyn LoggingService>, shared_code: Arc<dyn SharedCodeLookup>) -> Self {
        Self {
            logging,
            shared_code,
            errors: AtomicBool::new(false),
        }
    }
}

impl LoggingService for CodeGenerationHost {
    fn log(&self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            self.errors.store(true, Ordering::Relaxed);
        }
        self.logging.log(diagnostic);
    }

    fn has_logged_errors(&self) -> bool {
        self.errors.load(Ordering::Relaxed) || self.logging.has_logged_errors()
    }
}

impl SharedCodeLookup for CodeGenerationHost {
    fn share_kind(&self, key: &CodeMemberKey) -> CodeMemberShareKind {
        self.shared_code.share_kind(key)
    }
}
