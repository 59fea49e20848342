// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Generator discovery.
//!
//! Generators are registered with a [`GeneratorMetadata`] naming them and
//! the language they target. A host picks one by language, optionally by
//! name. Without a name, a single custom generator for the language wins
//! over the built-in one; several custom generators are ambiguous.

use crate::error::GeneratorError;
use crate::generator::CodeDomClientCodeGenerator;
use crate::host::GenerationHost;
use crate::options::ClientCodeGenerationOptions;
use crate::provider::canonical_language;
use ria_schema::DomainServiceDescription;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Produces client proxy source text for a set of DomainServices.
///
/// Implementations are stateless between calls and reusable.
pub trait DomainServiceClientCodeGenerator: Send + Sync {
    /// Generates the client code. Per-member problems are logged through
    /// `host`; a successful return with `host.has_logged_errors()` set is
    /// still a failed build.
    fn generate_code(
        &self,
        host: &dyn GenerationHost,
        descriptions: &[Arc<DomainServiceDescription>],
        options: &ClientCodeGenerationOptions,
    ) -> Result<String, GeneratorError>;
}

/// Identity under which a generator is registered.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GeneratorMetadata {
    /// Generator name.
    pub name: String,
    /// Target language, free-form (`C#`, `VB`).
    pub language: String,
}

impl GeneratorMetadata {
    /// Creates metadata.
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }

    fn targets(&self, language: &str) -> bool {
        match (canonical_language(&self.language), canonical_language(language)) {
            (Some(a), Some(b)) => a == b,
            _ => self.language.eq_ignore_ascii_case(language),
        }
    }
}

/// Registered generators.
#[derive(Default)]
pub struct GeneratorRegistry {
    entries: Vec<(GeneratorMetadata, Arc<dyn DomainServiceClientCodeGenerator>)>,
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter().map(|(m, _)| m)).finish()
    }
}

impl GeneratorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in generator for C# and Visual Basic.
    pub fn with_builtin() -> Self {
        let builtin: Arc<dyn DomainServiceClientCodeGenerator> = Arc::new(CodeDomClientCodeGenerator::new());
        let entries = ["C#", "VB"]
            .into_iter()
            .map(|lang| {
                (
                    GeneratorMetadata::new(CodeDomClientCodeGenerator::GENERATOR_NAME, lang),
                    Arc::clone(&builtin),
                )
            })
            .collect();
        Self { entries }
    }

    /// Adds a generator. A name may be registered once per language.
    pub fn register(
        &mut self,
        metadata: GeneratorMetadata,
        generator: Arc<dyn DomainServiceClientCodeGenerator>,
    ) -> Result<(), GeneratorError> {
        let duplicate = self
            .entries
            .iter()
            .any(|(m, _)| m.name == metadata.name && m.targets(&metadata.language));
        if duplicate {
            return Err(GeneratorError::DuplicateGenerator {
                name: metadata.name,
                language: metadata.language,
            });
        }
        debug!(name = %metadata.name, language = %metadata.language, "generator registered");
        self.entries.push((metadata, generator));
        Ok(())
    }

    /// Registered generators in registration order.
    pub fn metadata(&self) -> impl Iterator<Item = &GeneratorMetadata> {
        self.entries.iter().map(|(m, _)| m)
    }

    /// Selects the generator for `language`, by `name` when given.
    pub fn find(
        &self,
        language: &str,
        name: Option<&str>,
    ) -> Result<Arc<dyn DomainServiceClientCodeGenerator>, GeneratorError> {
        let candidates: Vec<_> = self.entries.iter().filter(|(m, _)| m.targets(language)).collect();
        let not_found = || GeneratorError::NoGenerator {
            language: language.to_string(),
            name: name.map(str::to_string),
        };

        if let Some(name) = name {
            return candidates
                .iter()
                .find(|(m, _)| m.name.eq_ignore_ascii_case(name))
                .map(|(_, g)| Arc::clone(g))
                .ok_or_else(not_found);
        }

        let custom: Vec<_> = candidates
            .iter()
            .filter(|(m, _)| m.name != CodeDomClientCodeGenerator::GENERATOR_NAME)
            .collect();
        match custom.as_slice() {
            [] => candidates.first().map(|(_, g)| Arc::clone(g)).ok_or_else(not_found),
            [(_, only)] => Ok(Arc::clone(only)),
            many => Err(GeneratorError::AmbiguousGenerator {
                language: language.to_string(),
                candidates: many.iter().map(|(m, _)| m.name.clone()).collect(),
            }),
        }
    }
}
