// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway adapter.
//!
//! Speaks the plain-text GET protocol most bulk WhatsApp gateways expose:
//! one request per message, parameters on the query string, and a text
//! body whose `S.` prefix signals acceptance.

use std::time::Duration;

use async_trait::async_trait;
use sendero_config::DeliveryConfig;
use sendero_core::phone;
use sendero_core::{DeliveryAdapter, DeliveryReceipt, DeliveryRequest, SenderoError};
use tracing::debug;

use crate::audit::{record_security_event, SecurityEventKind};

/// Longest message body the gateway accepts.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Deliverable phone numbers are 10 to 15 digits after normalization.
const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

/// Delivery adapter for a query-string HTTP gateway.
///
/// Constructed once at startup from the `[delivery]` config section and
/// shared across dispatcher workers. All validation happens before the
/// request is built; a message that fails validation never reaches the
/// wire.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: String,
    sender_id: String,
    country_code: String,
}

impl HttpGateway {
    /// Builds the gateway from the delivery config section.
    ///
    /// Requires `endpoint` and `sender_id` to be present; config
    /// validation reports their absence earlier with better diagnostics,
    /// this is the last line of defense.
    pub fn new(config: &DeliveryConfig) -> Result<Self, SenderoError> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            SenderoError::Config("delivery.endpoint must be set to build the HTTP gateway".into())
        })?;
        let sender_id = config.sender_id.clone().ok_or_else(|| {
            SenderoError::Config("delivery.sender_id must be set to build the HTTP gateway".into())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SenderoError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint,
            sender_id,
            country_code: config.country_code.clone(),
        })
    }

    /// Validates the request and returns the normalized phone digits.
    ///
    /// Rejections are recorded as security events and cost no network
    /// round trip.
    fn validate(&self, request: &DeliveryRequest) -> Result<String, SenderoError> {
        let digits = phone::digits_only(&request.phone);
        if digits.len() < MIN_PHONE_DIGITS || digits.len() > MAX_PHONE_DIGITS {
            let reason = format!(
                "phone has {} digits, expected {MIN_PHONE_DIGITS} to {MAX_PHONE_DIGITS}",
                digits.len()
            );
            record_security_event(
                SecurityEventKind::InvalidRecipient,
                &phone::mask(&request.phone),
                &self.endpoint,
                &reason,
            );
            return Err(SenderoError::InvalidRecipient { reason });
        }

        if request.message.trim().is_empty() {
            let reason = "message is empty".to_string();
            record_security_event(
                SecurityEventKind::InvalidMessage,
                &phone::mask(&request.phone),
                &self.endpoint,
                &reason,
            );
            return Err(SenderoError::InvalidMessage { reason });
        }

        let chars = request.message.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            let reason = format!("message has {chars} characters, limit is {MAX_MESSAGE_CHARS}");
            record_security_event(
                SecurityEventKind::InvalidMessage,
                &phone::mask(&request.phone),
                &self.endpoint,
                &reason,
            );
            return Err(SenderoError::InvalidMessage { reason });
        }

        Ok(phone::strip_country_prefix(&digits, &self.country_code).to_string())
    }
}

#[async_trait]
impl DeliveryAdapter for HttpGateway {
    fn name(&self) -> &str {
        "http-gateway"
    }

    async fn deliver(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, SenderoError> {
        let digits = self.validate(request)?;
        let masked = phone::mask(&request.phone);

        let message_type = if request.image_url.is_some() {
            "image"
        } else {
            "text"
        };
        let mut params = vec![
            ("phone", digits.as_str()),
            ("message", request.message.as_str()),
            ("sender", self.sender_id.as_str()),
            ("type", message_type),
        ];
        if let Some(ref image) = request.image_url {
            params.push(("image", image.as_str()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("gateway request timed out: {e}")
                } else {
                    format!("gateway request failed: {e}")
                };
                record_security_event(
                    SecurityEventKind::TransportFailure,
                    &masked,
                    &self.endpoint,
                    &message,
                );
                SenderoError::Transport {
                    message,
                    source: Some(Box::new(e)),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("gateway returned {status}: {body}");
            record_security_event(
                SecurityEventKind::TransportFailure,
                &masked,
                &self.endpoint,
                &message,
            );
            return Err(SenderoError::Transport {
                message,
                source: None,
            });
        }

        let body = response.text().await.map_err(|e| SenderoError::Transport {
            message: format!("failed to read gateway response: {e}"),
            source: Some(Box::new(e)),
        })?;
        let body = body.trim();

        // Gateway convention: "S." prefix means accepted, remainder is
        // the provider's message id. Anything else is a rejection text.
        match body.strip_prefix("S.") {
            Some(id) => {
                let provider_message_id = id.trim().to_string();
                debug!(phone = %masked, provider_message_id = %provider_message_id, "message accepted");
                Ok(DeliveryReceipt {
                    provider_message_id,
                })
            }
            None => {
                record_security_event(
                    SecurityEventKind::ProviderRejected,
                    &masked,
                    &self.endpoint,
                    body,
                );
                Err(SenderoError::ProviderRejected {
                    body: body.to_string(),
                })
            }
        }
    }
}
