// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound reply handling for opt-out requests.
//!
//! Matching is deliberately generous: any reply containing an opt-out
//! keyword counts, because a missed opt-out is a compliance problem
//! while a false positive merely silences marketing mail.

use std::sync::Arc;

use chrono::Utc;
use sendero_core::phone::{digits_only, mask, strip_country_prefix};
use sendero_core::{
    DeliveryAdapter, DeliveryRequest, FollowUpStore, OptOutOutcome, SenderoError, TravelerId,
};
use tracing::{debug, info, warn};

/// Keywords that mark a reply as an opt-out request. Matched as
/// substrings of the lowercased reply text.
pub const OPT_OUT_KEYWORDS: &[&str] = &[
    "stop",
    "unsubscribe",
    "opt out",
    "remove",
    "cancel",
    "no more",
    "quit",
    "end",
    "halt",
    "pause",
];

/// Sent back once when a phone number is first opted out.
const CONFIRMATION_TEXT: &str =
    "You have been unsubscribed and will not receive further messages from us.";

/// Whether the reply text asks to stop receiving messages.
pub fn is_opt_out_text(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    OPT_OUT_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Applies inbound opt-out replies to the directory and the queue.
///
/// Opt-out is keyed by phone number, not traveler: one reply flags
/// every traveler sharing the number, across agencies. The operation
/// is idempotent; replaying a reply changes nothing.
pub struct OptOutHandler {
    store: Arc<dyn FollowUpStore>,
    delivery: Option<Arc<dyn DeliveryAdapter>>,
    country_code: String,
}

impl OptOutHandler {
    pub fn new(
        store: Arc<dyn FollowUpStore>,
        delivery: Option<Arc<dyn DeliveryAdapter>>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            store,
            delivery,
            country_code: country_code.into(),
        }
    }

    /// Handles one inbound reply from `phone` with body `text`.
    ///
    /// Non-keyword replies and unknown numbers return without touching
    /// the store. Flagging and cancellation are durable before the
    /// confirmation send is attempted; a confirmation failure is
    /// reported in the outcome, never rolled back.
    pub async fn handle_inbound_reply(
        &self,
        phone: &str,
        text: &str,
    ) -> Result<OptOutOutcome, SenderoError> {
        if !is_opt_out_text(text) {
            return Ok(OptOutOutcome::NotOptOut);
        }

        let all_digits = digits_only(phone);
        let digits = strip_country_prefix(&all_digits, &self.country_code);
        let travelers = self.store.travelers_by_phone_digits(digits).await?;
        if travelers.is_empty() {
            debug!(phone = %mask(phone), "opt-out reply from a number with no travelers");
            return Ok(OptOutOutcome::NoMatch);
        }

        let traveler_ids: Vec<TravelerId> =
            travelers.iter().map(|t| t.id.clone()).collect();

        let travelers_flagged = self.store.flag_opt_out(digits, Utc::now()).await?;
        let messages_cancelled = self
            .store
            .cancel_pending_for_travelers(&traveler_ids)
            .await?;

        // Confirm only on the first opt-out for this number. A replayed
        // reply flags nothing and must not message an unsubscribed phone.
        let confirmation_sent = if travelers_flagged > 0 {
            self.send_confirmation(phone).await
        } else {
            false
        };

        info!(
            phone = %mask(phone),
            travelers_flagged,
            messages_cancelled,
            confirmation_sent,
            "opt-out applied"
        );

        Ok(OptOutOutcome::OptedOut {
            travelers_flagged,
            messages_cancelled,
            confirmation_sent,
        })
    }

    /// Best-effort confirmation send. Failures are logged and swallowed;
    /// the opt-out itself is already durable.
    async fn send_confirmation(&self, phone: &str) -> bool {
        let Some(delivery) = self.delivery.as_ref() else {
            debug!("delivery disabled, opt-out confirmation not sent");
            return false;
        };

        let request = DeliveryRequest {
            phone: phone.to_string(),
            message: CONFIRMATION_TEXT.to_string(),
            image_url: None,
        };
        match delivery.deliver(&request).await {
            Ok(_) => true,
            Err(e) => {
                warn!(phone = %mask(phone), error = %e, "opt-out confirmation failed");
                false
            }
        }
    }
}
