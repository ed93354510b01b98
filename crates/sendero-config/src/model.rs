// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! Every struct carries `#[serde(deny_unknown_fields)]` so a typoed key
//! fails the load instead of being silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level Sendero configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SenderoConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// SQLite settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound delivery gateway settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Dispatch loop settings.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Minimum level emitted: trace, debug, info, warn, or error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SQLite configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Database file location; parent directories are created on open.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Journal in WAL mode so status reads never block the dispatcher.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("sendero").join("sendero.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("sendero.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Outbound delivery gateway configuration.
///
/// Delivery is opt-in. With `enabled = false` the engine still accepts
/// travelers, schedules follow-ups, and processes opt-outs; it just never
/// contacts the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Master switch for outbound delivery.
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the HTTP delivery gateway. Required when enabled.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Sender account identifier passed to the gateway. Required when enabled.
    #[serde(default)]
    pub sender_id: Option<String>,

    /// Country code stripped from fully qualified phone numbers before send.
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Per-request timeout for gateway calls, in seconds.
    #[serde(default = "default_delivery_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            sender_id: None,
            country_code: default_country_code(),
            timeout_secs: default_delivery_timeout_secs(),
        }
    }
}

fn default_country_code() -> String {
    "91".to_string()
}

fn default_delivery_timeout_secs() -> u64 {
    12
}

/// Dispatch loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Seconds between dispatch runs.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Maximum queue rows claimed per run.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    /// Maximum in-flight deliveries within one run.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Seconds after which an unfinished claim counts as abandoned.
    #[serde(default = "default_claim_timeout_secs")]
    pub claim_timeout_secs: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            batch_limit: default_batch_limit(),
            max_concurrency: default_max_concurrency(),
            claim_timeout_secs: default_claim_timeout_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    300
}

fn default_batch_limit() -> usize {
    50
}

fn default_max_concurrency() -> usize {
    4
}

fn default_claim_timeout_secs() -> u64 {
    900
}
