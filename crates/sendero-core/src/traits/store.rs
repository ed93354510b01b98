// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage trait covering the directory, templates, and the message queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SenderoError;
use crate::types::{
    Agency, AgencyId, Bus, BusId, MessageTemplate, NewQueuedMessage, QueueCounts, QueuedMessage,
    Traveler, TravelerId,
};

/// Persistence contract for the follow-up engine.
///
/// One implementation backs production (SQLite); tests may substitute
/// their own. Every mutation is atomic with respect to concurrent
/// callers of the same store.
#[async_trait]
pub trait FollowUpStore: Send + Sync {
    // --- Directory lookups ---

    async fn get_agency(&self, id: &AgencyId) -> Result<Option<Agency>, SenderoError>;

    async fn get_bus(&self, id: &BusId) -> Result<Option<Bus>, SenderoError>;

    async fn get_traveler(&self, id: &TravelerId) -> Result<Option<Traveler>, SenderoError>;

    /// All travelers ingested from the given bus, in ingestion order.
    async fn travelers_on_bus(&self, bus_id: &BusId) -> Result<Vec<Traveler>, SenderoError>;

    /// Every traveler whose normalized phone equals `phone_digits`.
    /// A shared family phone may match travelers across agencies.
    async fn travelers_by_phone_digits(
        &self,
        phone_digits: &str,
    ) -> Result<Vec<Traveler>, SenderoError>;

    /// Sets the opt-out flag for every traveler sharing the phone number.
    /// Returns how many rows were newly flagged.
    async fn flag_opt_out(
        &self,
        phone_digits: &str,
        at: DateTime<Utc>,
    ) -> Result<usize, SenderoError>;

    // --- Templates ---

    /// Active templates ordered by ascending day trigger.
    async fn active_templates(&self) -> Result<Vec<MessageTemplate>, SenderoError>;

    // --- Queue ---

    /// Inserts a queue row unless a live row for the same traveler and
    /// template already exists. Returns the new row id, or `None` when
    /// the insert was suppressed.
    async fn enqueue_if_absent(
        &self,
        message: &NewQueuedMessage,
    ) -> Result<Option<i64>, SenderoError>;

    /// Atomically moves up to `limit` due pending rows to claimed and
    /// returns them, oldest schedule first.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<QueuedMessage>, SenderoError>;

    /// Fails every claim older than `cutoff`, freeing rows abandoned by
    /// a crashed dispatch run. Returns how many rows were swept.
    async fn sweep_expired_claims(&self, cutoff: DateTime<Utc>) -> Result<usize, SenderoError>;

    /// Marks a claimed row sent. Returns false when the row was not
    /// claimed, which leaves it untouched.
    async fn mark_sent(&self, id: i64, provider_message_id: &str) -> Result<bool, SenderoError>;

    /// Marks a claimed row failed with the given reason.
    async fn mark_failed(&self, id: i64, reason: &str) -> Result<bool, SenderoError>;

    /// Cancels a live (pending or claimed) row. Terminal rows are left
    /// untouched and false is returned.
    async fn cancel_message(&self, id: i64) -> Result<bool, SenderoError>;

    /// Cancels every pending row belonging to the given travelers in
    /// one statement. Returns how many rows changed.
    async fn cancel_pending_for_travelers(
        &self,
        traveler_ids: &[TravelerId],
    ) -> Result<usize, SenderoError>;

    /// Queue rows grouped by state.
    async fn queue_counts(&self) -> Result<QueueCounts, SenderoError>;
}
