// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment errors into `miette` diagnostics that point into the TOML file.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a key must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {section}")]
    #[diagnostic(
        code(herald::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// `[name]` of the enclosing table, or "the top level".
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(herald::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(herald::config::missing_key),
        help("set `{key}` in herald.toml")
    )]
    MissingKey { key: String },

    /// A value parsed but is not acceptable.
    #[error("{message}")]
    #[diagnostic(code(herald::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(herald::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error held by `err` into a diagnostic.
///
/// `sources` are `(path, content)` pairs of the TOML documents that were
/// merged. They are only used to attach spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    let locator = SourceLocator { sources };
    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = locator.locate(&error, &error.path, field);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    section: match error.path.first() {
                        Some(table) => format!("[{table}]"),
                        None => "the top level".to_string(),
                    },
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::InvalidType(found, expected) => {
                // For type errors figment's path ends with the key itself.
                let (table, key) = match error.path.split_last() {
                    Some((key, table)) => (table, key.as_str()),
                    None => (&[][..], ""),
                };
                let (span, src) = locator.locate(&error, table, key);
                ConfigError::InvalidType {
                    key: error.path.join("."),
                    found: found.to_string(),
                    expected: expected.to_string(),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.to_string(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

struct SourceLocator<'a> {
    sources: &'a [(String, String)],
}

impl SourceLocator<'_> {
    /// Span of `key` inside `table` of the file the error came from.
    ///
    /// Inline strings carry no file metadata, so a lone source is assumed
    /// to be the one that failed.
    fn locate(
        &self,
        error: &figment::error::Error,
        table: &[String],
        key: &str,
    ) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
        let origin = error
            .metadata
            .as_ref()
            .and_then(|m| m.source.as_ref())
            .and_then(|s| s.file_path())
            .map(|p| p.display().to_string());

        let source = match origin {
            Some(path) => self.sources.iter().find(|(p, _)| *p == path),
            None => None,
        }
        .or(match self.sources {
            [only] => Some(only),
            _ => None,
        });

        match source {
            Some((path, content)) if !key.is_empty() => {
                match find_key_offset(content, table, key) {
                    Some(offset) => (
                        Some(SourceSpan::new(offset.into(), key.len())),
                        Some(NamedSource::new(path, content.clone())),
                    ),
                    None => (None, None),
                }
            }
            _ => (None, None),
        }
    }
}

/// Byte offset of `key` as an assignment inside the `[table]` named by
/// `path[0]`, or among the top-level keys when `path` is empty. The search
/// stops at the next table header.
pub fn find_key_offset(content: &str, path: &[String], key: &str) -> Option<usize> {
    let wanted = path.first().map(|t| format!("[{t}]"));
    let mut in_table = wanted.is_none();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let trimmed = line.trim_start();

        if trimmed.starts_with('[') {
            in_table = wanted.as_deref() == Some(trimmed.trim_end());
            continue;
        }
        if !in_table {
            continue;
        }

        let assigns_key = trimmed
            .strip_prefix(key)
            .is_some_and(|rest| rest.trim_start().starts_with('='));
        if assigns_key {
            return Some(start + (line.len() - trimmed.len()));
        }
    }
    None
}

/// The valid key most similar to `unknown`, if it clears the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print every error to stderr with miette's graphical report.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut report = String::new();
        match handler.render_report(&mut report, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{report}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
