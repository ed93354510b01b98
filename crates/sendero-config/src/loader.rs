// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-based layered loading.
//!
//! Later layers win: defaults, then `/etc/sendero/sendero.toml`, the
//! XDG user file, `./sendero.toml`, and finally `SENDERO_*` environment
//! variables. Missing files are skipped silently.

#![allow(clippy::result_large_err)] // figment::Error is a large foreign type

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SenderoConfig;

/// Loads from the full file hierarchy plus environment overrides.
pub fn load_config() -> Result<SenderoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SenderoConfig::default()))
        .merge(Toml::file("/etc/sendero/sendero.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("sendero/sendero.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("sendero.toml"))
        .merge(env_provider())
        .extract()
}

/// Loads from one explicit file, skipping the hierarchy. Environment
/// overrides still apply so `--config` deployments can patch single
/// values without editing the file.
pub fn load_config_from_path(path: &Path) -> Result<SenderoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SenderoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Loads from a TOML string alone. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<SenderoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SenderoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Maps `SENDERO_DISPATCHER_BATCH_LIMIT` to `dispatcher.batch_limit`.
///
/// `Env::split("_")` would also split the underscores inside key names
/// (`database_path`, `interval_secs`), so only the leading section name
/// is turned into a dot.
fn env_provider() -> Env {
    Env::prefixed("SENDERO_").map(|key| {
        let key = key.as_str();
        for section in ["log", "storage", "delivery", "dispatcher"] {
            if let Some(rest) = key
                .strip_prefix(section)
                .and_then(|k| k.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key.to_string().into()
    })
}
