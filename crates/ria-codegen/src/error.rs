// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fatal code generation errors.
//!
//! Problems confined to a single operation, member or attribute are not
//! errors in this sense: they are logged through the host and generation
//! continues.

use thiserror::Error;

/// Errors that abort a whole generation run or registry operation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// No code provider handles the requested language.
    #[error("unsupported target language '{0}'")]
    UnsupportedLanguage(String),
    /// No registered generator matches the request.
    #[error("no code generator registered for language '{language}'{}", .name.as_ref().map(|n| format!(" named '{n}'")).unwrap_or_default())]
    NoGenerator {
        /// Requested language.
        language: String,
        /// Requested generator name, if any.
        name: Option<String>,
    },
    /// Several generators match and no name was given to pick one.
    #[error("multiple code generators registered for language '{language}': {}", .candidates.join(", "))]
    AmbiguousGenerator {
        /// Requested language.
        language: String,
        /// Names of the matching generators.
        candidates: Vec<String>,
    },
    /// A generator name was registered twice for one language.
    #[error("code generator '{name}' is already registered for language '{language}'")]
    DuplicateGenerator {
        /// Generator name.
        name: String,
        /// Language.
        language: String,
    },
    /// Writing generated text failed.
    #[error("failed to render generated code: {0}")]
    Render(#[from] std::fmt::Error),
}
