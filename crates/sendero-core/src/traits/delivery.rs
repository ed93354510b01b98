// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery adapter trait for outbound message providers.

use async_trait::async_trait;

use crate::error::SenderoError;
use crate::types::{DeliveryRequest, DeliveryReceipt};

/// Adapter for a provider that delivers one outbound message at a time.
///
/// Implementations own recipient validation and provider response
/// classification. Callers hand over a rendered message and receive
/// either a receipt or a typed failure.
#[async_trait]
pub trait DeliveryAdapter: Send + Sync {
    /// Short provider name used in logs and reports.
    fn name(&self) -> &str;

    /// Delivers a single message, returning the provider's receipt.
    async fn deliver(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, SenderoError>;
}
