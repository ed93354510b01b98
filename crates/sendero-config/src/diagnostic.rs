// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette-backed configuration diagnostics.
//!
//! Figment reports deserialization failures as a chain of serde errors;
//! this module flattens them into [`ConfigError`] values that render as
//! readable reports for `sendero config check` and startup.

use miette::Diagnostic;
use thiserror::Error;

/// One operator-facing configuration problem.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key the model does not know, usually a typo.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(sendero::config::unknown_key),
        help("valid keys: {valid_keys}")
    )]
    UnknownKey {
        key: String,
        /// Keys the enclosing section accepts.
        valid_keys: String,
    },

    /// A value that deserialized to the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(sendero::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A key the model requires but no layer ever set.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(sendero::config::missing_key),
        help("add `{key} = <value>` to your sendero.toml")
    )]
    MissingKey { key: String },

    /// A well-typed value that fails a semantic check.
    #[error("validation error: {message}")]
    #[diagnostic(code(sendero::config::validation))]
    Validation { message: String },

    /// Anything figment reports that has no dedicated variant.
    #[error("configuration error: {0}")]
    #[diagnostic(code(sendero::config::other))]
    Other(String),
}

/// Flattens a figment error into per-problem diagnostics.
///
/// Figment bundles several failures inside one error value; every one
/// is kept so the operator sees the full list in a single run.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => ConfigError::UnknownKey {
                key: field.clone(),
                valid_keys: expected.join(", "),
            },
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Renders every error to stderr through miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    let mut out = String::new();
    for error in errors {
        if handler
            .render_report(&mut out, error as &dyn Diagnostic)
            .is_err()
        {
            out.push_str(&format!("error: {error}\n"));
        }
    }
    eprint!("{out}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_field_maps_to_unknown_key() {
        let err = crate::loader::load_config_from_str("[delivery]\nendpont = \"x\"\n")
            .expect_err("unknown key must be rejected");
        let errors = figment_to_config_errors(err);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::UnknownKey { key, .. } if key == "endpont")));
    }

    #[test]
    fn invalid_type_maps_with_dotted_path() {
        let err = crate::loader::load_config_from_str("[dispatcher]\ninterval_secs = \"soon\"\n")
            .expect_err("string where integer expected must be rejected");
        let errors = figment_to_config_errors(err);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })));
    }
}
