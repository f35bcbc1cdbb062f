// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config errors as miette diagnostics.
//!
//! Figment errors are mapped onto [`ConfigError`]; when the offending key can
//! be found in one of the TOML files that was read, the diagnostic carries a
//! labelled span into that file. Unknown keys get a Jaro-Winkler "did you
//! mean" suggestion.

#![allow(unused_assignments)] // emitted by the Diagnostic derive

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Similarity a known key needs before it is offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, ready for miette rendering.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{}`", dotted(.section.as_deref(), .key))]
    #[diagnostic(
        code(finch::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Table the key appeared in; `None` at the top level.
        section: Option<String>,
        suggestion: Option<String>,
        /// Comma-separated keys accepted in that table.
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid value for `{key}`: {detail}")]
    #[diagnostic(code(finch::config::invalid_type))]
    InvalidType {
        key: String,
        detail: String,
        #[label("this value")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(finch::config::missing_key),
        help("add `{key} = <value>` to finch.toml")
    )]
    MissingKey { key: String },

    /// A value that parsed but breaks a semantic rule.
    #[error("validation error: {message}")]
    #[diagnostic(code(finch::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(finch::config::other))]
    Other(String),
}

fn dotted(section: Option<&str>, key: &str) -> String {
    match section {
        Some(s) => format!("{s}.{key}"),
        None => key.to_string(),
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Map every error inside `err` to a [`ConfigError`].
///
/// `toml_sources` holds `(path, content)` pairs of the files that were read;
/// they are only used to attach spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let section = error.path.first().cloned();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = excerpt(&error, section.as_deref(), field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        section,
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: dotted(section.as_deref(), field),
                },
                Kind::InvalidType(actual, expected) => {
                    let key = error.path.join(".");
                    let (span, src) = match error.path.as_slice() {
                        [table, field] => excerpt(&error, Some(table.as_str()), field, toml_sources),
                        [field] => excerpt(&error, None, field, toml_sources),
                        _ => (None, None),
                    };
                    ConfigError::InvalidType {
                        key,
                        detail: format!("found {actual}, expected {expected}"),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Span and source of `field` in the file the error was raised from.
fn excerpt(
    error: &figment::Error,
    section: Option<&str>,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
        Some(figment::Source::File(path)) => path.display().to_string(),
        _ => return (None, None),
    };
    let Some((path, content)) = toml_sources.iter().find(|(p, _)| *p == origin) else {
        return (None, None);
    };
    match locate_key(content, section, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` as a key inside table `section` of `content`.
///
/// Tracks `[table]` headers line by line, so a key is only matched inside
/// its own table. `None` for `section` means the top level.
pub fn locate_key(content: &str, section: Option<&str>, field: &str) -> Option<usize> {
    let mut offset = 0;
    let mut current: Option<&str> = None;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let trimmed = line.trim_start();

        if let Some(header) = trimmed.strip_prefix('[') {
            current = header.split(']').next().map(str::trim);
            continue;
        }
        if current != section {
            continue;
        }
        let Some(rest) = trimmed.strip_prefix(field) else {
            continue;
        };
        if rest.trim_start().starts_with('=') {
            return Some(start + (line.len() - trimmed.len()));
        }
    }
    None
}

/// The known key closest to `unknown`, if any is close enough.
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
        let mut out = String::new();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
