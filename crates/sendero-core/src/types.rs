// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Sendero workspace.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a travel agency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgencyId(pub String);

/// Unique identifier for a bus (a scheduled trip operated by an agency).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusId(pub String);

/// Unique identifier for a traveler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TravelerId(pub String);

/// Unique identifier for a follow-up message template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub String);

/// Lifecycle state of a queued follow-up message.
///
/// `Pending` and `Claimed` are live states. `Sent`, `Failed`, and
/// `Cancelled` are terminal; no transition leaves them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QueueState {
    /// Waiting for its scheduled send time.
    Pending,
    /// Claimed by a dispatch run, delivery in flight.
    Claimed,
    /// Accepted by the delivery gateway.
    Sent,
    /// Delivery failed or the claim expired.
    Failed,
    /// Suppressed before delivery (opt-out or operator action).
    Cancelled,
}

impl QueueState {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sent | Self::Failed | Self::Cancelled)
    }
}

// --- Directory types ---

/// A travel agency whose past passengers receive follow-ups.
#[derive(Debug, Clone, PartialEq)]
pub struct Agency {
    pub id: AgencyId,
    pub name: String,
    /// Agency-specific rebooking link substituted into templates.
    pub booking_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A bus trip operated by an agency.
#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    pub id: BusId,
    pub agency_id: AgencyId,
    pub name: String,
    pub route_from: Option<String>,
    pub route_to: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A past passenger eligible for follow-up messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Traveler {
    pub id: TravelerId,
    pub agency_id: AgencyId,
    pub bus_id: Option<BusId>,
    pub name: Option<String>,
    /// Phone number exactly as ingested, punctuation included.
    pub phone: String,
    /// Digit-only form of `phone`, used for matching inbound replies.
    pub phone_digits: String,
    pub travel_date: Option<NaiveDate>,
    pub coupon_code: Option<String>,
    /// When set, no further messages may be sent to this traveler.
    pub whatsapp_opt_out: bool,
    pub opt_out_at: Option<DateTime<Utc>>,
    /// Moment the traveler entered the system; anchors follow-up offsets.
    pub ingested_at: DateTime<Utc>,
}

// --- Template and queue types ---

/// A reusable follow-up message template.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTemplate {
    pub id: TemplateId,
    /// Days after ingestion at which this follow-up becomes due.
    pub day_trigger: i64,
    /// Template body with `{{variable}}` placeholders.
    pub body: String,
    /// Optional image attached to the message.
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A follow-up message materialized into the durable queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    pub id: i64,
    pub traveler_id: TravelerId,
    pub template_id: TemplateId,
    /// Phone snapshot taken at scheduling time.
    pub phone: String,
    /// Fully rendered body; templates edited later do not affect it.
    pub body: String,
    pub image_url: Option<String>,
    pub scheduled_for: DateTime<Utc>,
    pub state: QueueState,
    pub provider_message_id: Option<String>,
    pub failure_reason: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a queue row. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQueuedMessage {
    pub traveler_id: TravelerId,
    pub template_id: TemplateId,
    pub phone: String,
    pub body: String,
    pub image_url: Option<String>,
    pub scheduled_for: DateTime<Utc>,
}

// --- Delivery types ---

/// A single outbound message handed to a delivery adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRequest {
    /// Recipient phone number; the adapter normalizes and validates it.
    pub phone: String,
    pub message: String,
    pub image_url: Option<String>,
}

/// Provider acknowledgement for an accepted message.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    pub provider_message_id: String,
}

// --- Reports ---

/// Outcome of scheduling follow-ups for one traveler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleReport {
    /// Queue rows created by this call.
    pub queued: usize,
    /// Templates skipped because an equivalent row already existed.
    pub skipped: usize,
}

/// Outcome of scheduling follow-ups for every traveler on a bus.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub travelers: usize,
    pub queued: usize,
    pub skipped: usize,
    /// Travelers whose scheduling failed, with the failure rendered as text.
    pub failures: Vec<(TravelerId, String)>,
}

/// Outcome of one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunReport {
    /// Expired claims reset to failed before claiming.
    pub swept: usize,
    pub sent: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl RunReport {
    /// Messages the run actually processed after the sweep.
    pub fn processed(&self) -> usize {
        self.sent + self.failed + self.cancelled
    }

    pub fn is_empty(&self) -> bool {
        self.swept == 0 && self.processed() == 0
    }
}

/// Queue rows grouped by state, for operator status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub claimed: usize,
    pub sent: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl QueueCounts {
    pub fn total(&self) -> usize {
        self.pending + self.claimed + self.sent + self.failed + self.cancelled
    }
}

/// Outcome of handling one inbound reply through the opt-out path.
#[derive(Debug, Clone, PartialEq)]
pub enum OptOutOutcome {
    /// The reply contained no opt-out keyword; ignore it.
    NotOptOut,
    /// An opt-out keyword matched but no traveler shares the phone number.
    NoMatch,
    /// Opt-out applied.
    OptedOut {
        /// Travelers newly flagged by this reply.
        travelers_flagged: usize,
        /// Pending queue rows cancelled by this reply.
        messages_cancelled: usize,
        /// Whether the confirmation message was accepted by the gateway.
        confirmation_sent: bool,
    },
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn queue_state_display_round_trips() {
        let states = [
            QueueState::Pending,
            QueueState::Claimed,
            QueueState::Sent,
            QueueState::Failed,
            QueueState::Cancelled,
        ];
        for state in states {
            let text = state.to_string();
            assert_eq!(text, text.to_lowercase());
            assert_eq!(QueueState::from_str(&text).unwrap(), state);
        }
    }

    #[test]
    fn queue_state_terminality() {
        assert!(!QueueState::Pending.is_terminal());
        assert!(!QueueState::Claimed.is_terminal());
        assert!(QueueState::Sent.is_terminal());
        assert!(QueueState::Failed.is_terminal());
        assert!(QueueState::Cancelled.is_terminal());
    }

    #[test]
    fn queue_state_serializes_lowercase() {
        let json = serde_json::to_string(&QueueState::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let parsed: QueueState = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, QueueState::Cancelled);
    }

    #[test]
    fn run_report_tallies() {
        let report = RunReport {
            swept: 1,
            sent: 2,
            failed: 1,
            cancelled: 1,
        };
        assert_eq!(report.processed(), 4);
        assert!(!report.is_empty());
        assert!(RunReport::default().is_empty());
    }

    #[test]
    fn queue_counts_total() {
        let counts = QueueCounts {
            pending: 3,
            claimed: 1,
            sent: 10,
            failed: 2,
            cancelled: 4,
        };
        assert_eq!(counts.total(), 20);
    }
}
