// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./finch.toml` > `~/.config/finch/finch.toml` > `/etc/finch/finch.toml`
//! with environment variable overrides via `FINCH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FinchConfig;

/// Sections recognised in `FINCH_<SECTION>_<KEY>` variables, longest first so
/// `rate_limit_` wins over any shorter prefix.
const ENV_SECTIONS: &[&str] = &[
    "rate_limit",
    "resilience",
    "storage",
    "context",
    "summary",
    "memory",
    "openai",
    "agent",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/finch/finch.toml` (system-wide)
/// 3. `~/.config/finch/finch.toml` (user XDG config)
/// 4. `./finch.toml` (local directory)
/// 5. `FINCH_*` environment variables
pub fn load_config() -> Result<FinchConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FinchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FinchConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FinchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FinchConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Candidate config files, lowest precedence first. Missing files are
/// skipped by Figment.
pub fn config_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from("/etc/finch/finch.toml")];
    if let Some(dir) = dirs::config_dir() {
        files.push(dir.join("finch").join("finch.toml"));
    }
    files.push(PathBuf::from("finch.toml"));
    files
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    config_files()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(FinchConfig::default())),
            |figment, file| figment.merge(Toml::file(file)),
        )
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env key onto its dotted config path.
///
/// Uses an explicit section table instead of `Env::split("_")` because both
/// section names (`rate_limit`) and keys (`max_requests`) contain underscores.
pub fn env_key_to_path(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section)
            && let Some(field) = rest.strip_prefix('_')
            && !field.is_empty()
        {
            return format!("{section}.{field}");
        }
    }
    key.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("FINCH_").map(|key| env_key_to_path(&key.as_str().to_ascii_lowercase()).into())
}
