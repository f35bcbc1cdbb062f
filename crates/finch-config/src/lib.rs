// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Finch memory pipeline.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `FINCH_*` environment overrides, and miette
//! diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use finch_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("rate ceiling: {}", config.rate_limit.max_requests);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::FinchConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// On a Figment error the TOML sources are re-read so diagnostics can point
/// at the offending key.
pub fn load_and_validate() -> Result<FinchConfig, Vec<ConfigError>> {
    let config = loader::load_config().map_err(|err| {
        let sources = read_sources(&loader::config_files());
        diagnostic::figment_to_config_errors(err, &sources)
    })?;
    validation::validate_config(&config)?;
    tracing::debug!(
        database = %config.storage.database_path,
        persona = %config.agent.persona,
        "configuration loaded"
    );
    Ok(config)
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<FinchConfig, Vec<ConfigError>> {
    let config = loader::load_config_from_path(path).map_err(|err| {
        let sources = read_sources(&[path.to_path_buf()]);
        diagnostic::figment_to_config_errors(err, &sources)
    })?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML string and validate it. No files or
/// environment variables are consulted.
pub fn load_and_validate_str(toml_content: &str) -> Result<FinchConfig, Vec<ConfigError>> {
    let config = loader::load_config_from_str(toml_content).map_err(|err| {
        let sources = [("<inline>".to_string(), toml_content.to_string())];
        diagnostic::figment_to_config_errors(err, &sources)
    })?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Render the effective configuration as TOML, with the API key blanked.
pub fn to_toml_string(config: &FinchConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.openai.api_key.is_some() {
        shown.openai.api_key = Some("[REDACTED]".to_string());
    }
    toml::to_string_pretty(&shown)
}

/// `(path, content)` for each readable file, keyed the way Figment reports
/// its source so spans can be matched back.
fn read_sources(files: &[PathBuf]) -> Vec<(String, String)> {
    files
        .iter()
        .filter_map(|file| {
            let content = std::fs::read_to_string(file).ok()?;
            let shown = if file.is_relative() {
                std::env::current_dir()
                    .map(|dir| dir.join(file))
                    .unwrap_or_else(|_| file.clone())
            } else {
                file.clone()
            };
            Some((shown.display().to_string(), content))
        })
        .collect()
}
