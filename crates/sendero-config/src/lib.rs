// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Sendero follow-up engine.
//!
//! TOML files merged across the XDG hierarchy, `SENDERO_*` environment
//! overrides, strict models (`deny_unknown_fields`), semantic
//! validation, and miette-rendered diagnostics.
//!
//! # Usage
//!
//! ```no_run
//! let config = sendero_config::load_and_validate()
//!     .unwrap_or_else(|errors| panic!("{} config errors", errors.len()));
//! println!("dispatch every {}s", config.dispatcher.interval_secs);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{DeliveryConfig, DispatcherConfig, LogConfig, SenderoConfig, StorageConfig};

/// Loads from the XDG hierarchy, then validates.
///
/// Deserialization failures come back as converted figment diagnostics,
/// semantic failures as the validator's collected list. Either way the
/// caller gets every problem at once, not just the first.
pub fn load_and_validate() -> Result<SenderoConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

/// Loads one explicit file, then validates. Backs `--config <path>`.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<SenderoConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

/// Loads from a TOML string, then validates. Test-oriented.
pub fn load_and_validate_str(toml_content: &str) -> Result<SenderoConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}
