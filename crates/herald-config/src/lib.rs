// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Herald notification engine.
//!
//! TOML files are merged with environment overrides, rejected on unknown
//! keys, validated as a whole, and reported as `miette` diagnostics that
//! point into the offending file.
//!
//! ```no_run
//! let config = match herald_config::load_and_validate() {
//!     Ok(config) => config,
//!     Err(errors) => {
//!         herald_config::render_errors(&errors);
//!         std::process::exit(1);
//!     }
//! };
//! println!("attachment limit: {} bytes", config.attachments.max_size_bytes);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{AttachmentConfig, DispatchConfig, HeraldConfig};

/// Named TOML documents used to attach source spans to diagnostics.
type Sources = Vec<(String, String)>;

/// Load from the standard file hierarchy and env, then validate.
pub fn load_and_validate() -> Result<HeraldConfig, Vec<ConfigError>> {
    checked(loader::load_config(), existing_sources)
}

pub fn load_and_validate_str(toml_content: &str) -> Result<HeraldConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

pub fn load_and_validate_path(path: &Path) -> Result<HeraldConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Validate a loaded config, or turn the figment error into diagnostics.
/// Sources are only read when there is something to report.
fn checked(
    loaded: Result<HeraldConfig, figment::Error>,
    sources: impl FnOnce() -> Sources,
) -> Result<HeraldConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

fn existing_sources() -> Sources {
    loader::config_file_paths()
        .iter()
        .filter_map(|path| read_source(path))
        .collect()
}

/// Figment reports files by absolute path, so relative ones are resolved here.
fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    let name = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    Some((name.display().to_string(), content))
}
