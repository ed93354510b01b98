// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Security event recording for the delivery path.
//!
//! Every rejected input and every failed send leaves a structured trace
//! event. Phones are always masked before they reach this module; the
//! full number never appears in log output.

use strum::Display;
use tracing::{error, warn};

/// What went wrong on the delivery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SecurityEventKind {
    /// Phone failed local validation; no request was made.
    InvalidRecipient,
    /// Message body failed local validation; no request was made.
    InvalidMessage,
    /// The gateway was unreachable, timed out, or answered non-2xx.
    TransportFailure,
    /// The gateway answered 2xx with a failure-shaped body.
    ProviderRejected,
}

impl SecurityEventKind {
    /// Validation rejections log at warn; wire-level failures at error.
    fn is_error(self) -> bool {
        matches!(
            self,
            SecurityEventKind::TransportFailure | SecurityEventKind::ProviderRejected
        )
    }
}

/// Emits one structured security event.
///
/// `phone_masked` must already be masked via [`sendero_core::phone::mask`].
/// `detail` carries the validation reason or provider text; for warn-level
/// events it must not contain the message body.
pub fn record_security_event(
    kind: SecurityEventKind,
    phone_masked: &str,
    endpoint: &str,
    detail: &str,
) {
    if kind.is_error() {
        error!(
            kind = %kind,
            phone = %phone_masked,
            endpoint = %endpoint,
            detail = %detail,
            "delivery security event"
        );
    } else {
        warn!(
            kind = %kind,
            phone = %phone_masked,
            endpoint = %endpoint,
            detail = %detail,
            "delivery security event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_snake_case() {
        assert_eq!(SecurityEventKind::InvalidRecipient.to_string(), "invalid_recipient");
        assert_eq!(SecurityEventKind::ProviderRejected.to_string(), "provider_rejected");
    }

    #[test]
    fn wire_failures_are_error_level() {
        assert!(SecurityEventKind::TransportFailure.is_error());
        assert!(SecurityEventKind::ProviderRejected.is_error());
        assert!(!SecurityEventKind::InvalidRecipient.is_error());
        assert!(!SecurityEventKind::InvalidMessage.is_error());
    }
}
