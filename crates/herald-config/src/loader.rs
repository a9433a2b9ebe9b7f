// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading.
//!
//! Later layers win: compiled defaults, `/etc/herald/herald.toml`, the user
//! config dir, `./herald.toml`, then `HERALD_<SECTION>_<KEY>` variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use tracing::debug;

use crate::model::HeraldConfig;

/// Top-level tables that env variables may address.
const SECTIONS: [&str; 2] = ["dispatch", "attachments"];

const FILE_NAME: &str = "herald.toml";

/// Config files consulted by [`load_config`], lowest precedence first.
pub fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/herald").join(FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("herald").join(FILE_NAME));
    }
    paths.push(PathBuf::from(FILE_NAME));
    paths
}

pub fn load_config() -> Result<HeraldConfig, figment::Error> {
    let config = build_figment().extract()?;
    debug!("loaded herald configuration");
    Ok(config)
}

/// Defaults plus `toml_content`. Files and env variables are ignored.
pub fn load_config_from_str(toml_content: &str) -> Result<HeraldConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

/// Defaults, one explicit file, then env overrides.
pub fn load_config_from_path(path: &Path) -> Result<HeraldConfig, figment::Error> {
    let config = defaults()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()?;
    debug!(path = %path.display(), "loaded herald configuration");
    Ok(config)
}

pub fn build_figment() -> Figment {
    config_file_paths()
        .into_iter()
        .fold(defaults(), |figment, path| figment.merge(Toml::file(path)))
        .merge(env_provider())
}

fn defaults() -> Figment {
    Figment::new().merge(Serialized::defaults(HeraldConfig::default()))
}

/// `HERALD_ATTACHMENTS_MAX_SIZE_BYTES` becomes `attachments.max_size_bytes`.
/// Only the first underscore after a known section is a separator.
fn env_provider() -> Env {
    Env::prefixed("HERALD_").map(|key| {
        let key = key.as_str();
        SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key.to_string())
            .into()
    })
}
