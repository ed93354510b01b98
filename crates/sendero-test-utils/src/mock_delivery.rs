// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock delivery adapter for deterministic testing.
//!
//! `MockDelivery` implements `DeliveryAdapter` with scriptable outcomes,
//! enabling fast, CI-runnable tests without a gateway.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use sendero_core::{DeliveryAdapter, DeliveryReceipt, DeliveryRequest, SenderoError};

/// A mock delivery adapter that returns pre-scripted outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty,
/// every delivery succeeds with a fresh provider message id. All
/// requests are captured for assertions, failed ones included.
pub struct MockDelivery {
    scripted: Arc<Mutex<VecDeque<Result<String, SenderoError>>>>,
    sent: Arc<Mutex<Vec<DeliveryRequest>>>,
}

impl MockDelivery {
    /// Create a mock adapter with an empty script; every send succeeds.
    pub fn new() -> Self {
        Self {
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script the next delivery to succeed with the given provider id.
    pub async fn script_success(&self, provider_message_id: &str) {
        self.scripted
            .lock()
            .await
            .push_back(Ok(provider_message_id.to_string()));
    }

    /// Script the next delivery to fail with the given error.
    pub async fn script_failure(&self, error: SenderoError) {
        self.scripted.lock().await.push_back(Err(error));
    }

    /// Every request handed to the adapter, in call order.
    pub async fn sent_requests(&self) -> Vec<DeliveryRequest> {
        self.sent.lock().await.clone()
    }

    /// How many requests the adapter has received.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Forget captured requests, keeping any remaining script.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockDelivery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryAdapter for MockDelivery {
    fn name(&self) -> &str {
        "mock-delivery"
    }

    async fn deliver(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, SenderoError> {
        self.sent.lock().await.push(request.clone());
        match self.scripted.lock().await.pop_front() {
            Some(Ok(id)) => Ok(DeliveryReceipt {
                provider_message_id: id,
            }),
            Some(Err(e)) => Err(e),
            None => Ok(DeliveryReceipt {
                provider_message_id: format!("mock-{}", uuid::Uuid::new_v4()),
            }),
        }
    }
}
