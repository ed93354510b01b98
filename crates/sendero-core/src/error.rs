// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Sendero follow-up engine.

use thiserror::Error;

/// The error type shared by every Sendero crate and adapter seam.
#[derive(Debug, Error)]
pub enum SenderoError {
    /// The loaded configuration cannot be used as-is.
    #[error("configuration error: {0}")]
    Config(String),

    /// The SQLite layer failed (open, query, or migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A scheduling target referenced a traveler that does not exist.
    #[error("recipient not found: {traveler_id}")]
    RecipientNotFound { traveler_id: String },

    /// The recipient's phone number cannot be delivered to.
    #[error("invalid recipient: {reason}")]
    InvalidRecipient { reason: String },

    /// The rendered message body is not deliverable.
    #[error("invalid message: {reason}")]
    InvalidMessage { reason: String },

    /// The delivery gateway could not be reached (connect failure, timeout, non-2xx).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The delivery gateway answered but did not accept the message.
    #[error("gateway rejected message: {body}")]
    ProviderRejected { body: String },

    /// A failure with no better classification.
    #[error("internal error: {0}")]
    Internal(String),
}
