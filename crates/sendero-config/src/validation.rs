// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as URL shape, digit-only country codes, and timer bounds.

use crate::diagnostic::ConfigError;
use crate::model::SenderoConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &SenderoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate log level is a known tracing level
    let level = config.log.level.trim().to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of trace, debug, info, warn, error",
                config.log.level
            ),
        });
    }

    // Validate database_path is not empty
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Delivery settings are only binding when delivery is enabled
    if config.delivery.enabled {
        match config.delivery.endpoint.as_deref().map(str::trim) {
            None | Some("") => errors.push(ConfigError::Validation {
                message: "delivery.endpoint is required when delivery.enabled = true".to_string(),
            }),
            Some(endpoint) => match url::Url::parse(endpoint) {
                Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
                Ok(parsed) => errors.push(ConfigError::Validation {
                    message: format!(
                        "delivery.endpoint must use http or https, got `{}`",
                        parsed.scheme()
                    ),
                }),
                Err(err) => errors.push(ConfigError::Validation {
                    message: format!("delivery.endpoint `{endpoint}` is not a valid URL: {err}"),
                }),
            },
        }

        if config
            .delivery
            .sender_id
            .as_deref()
            .map(str::trim)
            .is_none_or(str::is_empty)
        {
            errors.push(ConfigError::Validation {
                message: "delivery.sender_id is required when delivery.enabled = true".to_string(),
            });
        }
    }

    let country_code = config.delivery.country_code.trim();
    if country_code.len() != 2 || !country_code.chars().all(|c| c.is_ascii_digit()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "delivery.country_code `{country_code}` must be exactly two digits"
            ),
        });
    }

    if config.delivery.timeout_secs == 0 || config.delivery.timeout_secs > 60 {
        errors.push(ConfigError::Validation {
            message: format!(
                "delivery.timeout_secs must be between 1 and 60, got {}",
                config.delivery.timeout_secs
            ),
        });
    }

    if config.dispatcher.interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatcher.interval_secs must be at least 1".to_string(),
        });
    }

    if config.dispatcher.batch_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatcher.batch_limit must be at least 1".to_string(),
        });
    }

    if config.dispatcher.max_concurrency == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatcher.max_concurrency must be at least 1".to_string(),
        });
    }

    // A claim must outlive at least one delivery attempt, otherwise the
    // sweep can fail messages that are still in flight.
    if config.dispatcher.claim_timeout_secs < config.delivery.timeout_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "dispatcher.claim_timeout_secs ({}) must not be smaller than delivery.timeout_secs ({})",
                config.dispatcher.claim_timeout_secs, config.delivery.timeout_secs
            ),
        });
    }

    if config.dispatcher.claim_timeout_secs < 60 {
        errors.push(ConfigError::Validation {
            message: format!(
                "dispatcher.claim_timeout_secs must be at least 60, got {}",
                config.dispatcher.claim_timeout_secs
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SenderoConfig;

    fn enabled_delivery_config() -> SenderoConfig {
        let mut config = SenderoConfig::default();
        config.delivery.enabled = true;
        config.delivery.endpoint = Some("https://gateway.example.com/send".to_string());
        config.delivery.sender_id = Some("agency-main".to_string());
        config
    }

    #[test]
    fn default_config_validates() {
        let config = SenderoConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn enabled_delivery_with_endpoint_and_sender_validates() {
        let config = enabled_delivery_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn enabled_delivery_without_endpoint_fails() {
        let mut config = enabled_delivery_config();
        config.delivery.endpoint = None;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("delivery.endpoint"))
        ));
    }

    #[test]
    fn enabled_delivery_without_sender_fails() {
        let mut config = enabled_delivery_config();
        config.delivery.sender_id = Some("   ".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("delivery.sender_id"))
        ));
    }

    #[test]
    fn non_http_endpoint_fails() {
        let mut config = enabled_delivery_config();
        config.delivery.endpoint = Some("ftp://gateway.example.com".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("http or https"))
        ));
    }

    #[test]
    fn alphabetic_country_code_fails() {
        let mut config = SenderoConfig::default();
        config.delivery.country_code = "IN".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("country_code"))
        ));
    }

    #[test]
    fn three_digit_country_code_fails() {
        let mut config = SenderoConfig::default();
        config.delivery.country_code = "971".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("exactly two digits"))
        ));
    }

    #[test]
    fn zero_timers_fail_and_all_errors_are_collected() {
        let mut config = SenderoConfig::default();
        config.dispatcher.interval_secs = 0;
        config.dispatcher.batch_limit = 0;
        config.dispatcher.max_concurrency = 0;
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        // Validation does not fail fast; every problem is reported.
        assert!(errors.len() >= 4);
    }

    #[test]
    fn claim_timeout_shorter_than_delivery_timeout_fails() {
        let mut config = SenderoConfig::default();
        config.delivery.timeout_secs = 30;
        config.dispatcher.claim_timeout_secs = 10;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("claim_timeout_secs"))
        ));
    }

    #[test]
    fn bad_log_level_fails() {
        let mut config = SenderoConfig::default();
        config.log.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("log.level"))
        ));
    }
}
