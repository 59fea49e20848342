// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Language providers that render a [`CompileUnit`] as source text.

mod csharp;
mod vb;

pub use csharp::CSharpCodeProvider;
pub use vb::VisualBasicCodeProvider;

use crate::code_model::CompileUnit;
use std::fmt;

/// Banner placed at the top of every generated file. Carries no timestamp
/// or tool version so regenerated output stays byte-identical.
const GENERATED_BANNER: &[&str] = &[
    "------------------------------------------------------------------------------",
    " <auto-generated>",
    "     This code was generated by riagen.",
    "",
    "     Changes to this file may cause incorrect behavior and will be lost if",
    "     the code is regenerated.",
    " </auto-generated>",
    "------------------------------------------------------------------------------",
];

/// Renders the language-neutral code model in one target language.
pub trait CodeDomProvider: Send + Sync + fmt::Debug {
    /// Canonical language name (`C#`, `VB`).
    fn language(&self) -> &'static str;

    /// Source file extension without the dot.
    fn file_extension(&self) -> &'static str;

    /// Whether identifiers differing only in case are distinct.
    fn is_case_sensitive(&self) -> bool;

    /// Renders `unit` to source text.
    fn generate_code_from_compile_unit(&self, unit: &CompileUnit) -> Result<String, fmt::Error>;
}

/// Canonical name for a language string, matched case-insensitively against
/// each provider's name and aliases.
pub fn canonical_language(language: &str) -> Option<&'static str> {
    let wanted = language.trim().to_ascii_lowercase();
    match wanted.as_str() {
        "c#" | "cs" | "csharp" => Some("C#"),
        "vb" | "visualbasic" | "vb.net" => Some("VB"),
        _ => None,
    }
}

/// Provider for `language`, or `None` when the language is not supported.
pub fn provider_for_language(language: &str) -> Option<Box<dyn CodeDomProvider>> {
    match canonical_language(language)? {
        "C#" => Some(Box::new(CSharpCodeProvider)),
        _ => Some(Box::new(VisualBasicCodeProvider)),
    }
}

/// Escapes text for an XML documentation comment.
fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            other => out.push(other),
        }
    }
    out
}
