// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the FollowUpStore trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use sendero_config::model::StorageConfig;
use sendero_core::types::{
    Agency, AgencyId, Bus, BusId, MessageTemplate, NewQueuedMessage, QueueCounts, QueuedMessage,
    Traveler, TravelerId,
};
use sendero_core::{FollowUpStore, SenderoError};

use crate::database::Database;
use crate::models::TemplateId;
use crate::queries;

/// SQLite-backed follow-up store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`SqliteStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: SqliteStore::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database, run migrations, and apply PRAGMA setup.
    pub async fn initialize(&self) -> Result<(), SenderoError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| SenderoError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    /// Checkpoint the WAL and release the store for shutdown.
    pub async fn close(&self) -> Result<(), SenderoError> {
        self.db()?.close().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, SenderoError> {
        self.db.get().ok_or_else(|| SenderoError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    // --- Ingestion operations (admin tooling and tests) ---

    pub async fn insert_agency(&self, agency: &Agency) -> Result<(), SenderoError> {
        queries::directory::insert_agency(self.db()?, agency).await
    }

    pub async fn insert_bus(&self, bus: &Bus) -> Result<(), SenderoError> {
        queries::directory::insert_bus(self.db()?, bus).await
    }

    pub async fn insert_traveler(&self, traveler: &Traveler) -> Result<(), SenderoError> {
        queries::travelers::insert_traveler(self.db()?, traveler).await
    }

    pub async fn insert_template(&self, template: &MessageTemplate) -> Result<(), SenderoError> {
        queries::templates::insert_template(self.db()?, template).await
    }

    pub async fn set_template_active(
        &self,
        id: &TemplateId,
        active: bool,
    ) -> Result<bool, SenderoError> {
        queries::templates::set_template_active(self.db()?, id, active).await
    }

    pub async fn get_queued_message(
        &self,
        id: i64,
    ) -> Result<Option<QueuedMessage>, SenderoError> {
        queries::queue::get_message(self.db()?, id).await
    }

    pub async fn messages_for_traveler(
        &self,
        traveler_id: &TravelerId,
    ) -> Result<Vec<QueuedMessage>, SenderoError> {
        queries::queue::messages_for_traveler(self.db()?, traveler_id).await
    }
}

#[async_trait]
impl FollowUpStore for SqliteStore {
    async fn get_agency(&self, id: &AgencyId) -> Result<Option<Agency>, SenderoError> {
        queries::directory::get_agency(self.db()?, id).await
    }

    async fn get_bus(&self, id: &BusId) -> Result<Option<Bus>, SenderoError> {
        queries::directory::get_bus(self.db()?, id).await
    }

    async fn get_traveler(&self, id: &TravelerId) -> Result<Option<Traveler>, SenderoError> {
        queries::travelers::get_traveler(self.db()?, id).await
    }

    async fn travelers_on_bus(&self, bus_id: &BusId) -> Result<Vec<Traveler>, SenderoError> {
        queries::travelers::travelers_on_bus(self.db()?, bus_id).await
    }

    async fn travelers_by_phone_digits(
        &self,
        phone_digits: &str,
    ) -> Result<Vec<Traveler>, SenderoError> {
        queries::travelers::travelers_by_phone_digits(self.db()?, phone_digits).await
    }

    async fn flag_opt_out(
        &self,
        phone_digits: &str,
        at: DateTime<Utc>,
    ) -> Result<usize, SenderoError> {
        queries::travelers::flag_opt_out(self.db()?, phone_digits, at).await
    }

    async fn active_templates(&self) -> Result<Vec<MessageTemplate>, SenderoError> {
        queries::templates::active_templates(self.db()?).await
    }

    async fn enqueue_if_absent(
        &self,
        message: &NewQueuedMessage,
    ) -> Result<Option<i64>, SenderoError> {
        queries::queue::enqueue_if_absent(self.db()?, message).await
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<QueuedMessage>, SenderoError> {
        queries::queue::claim_due(self.db()?, now, limit).await
    }

    async fn sweep_expired_claims(&self, cutoff: DateTime<Utc>) -> Result<usize, SenderoError> {
        queries::queue::sweep_expired_claims(self.db()?, cutoff).await
    }

    async fn mark_sent(&self, id: i64, provider_message_id: &str) -> Result<bool, SenderoError> {
        queries::queue::mark_sent(self.db()?, id, provider_message_id).await
    }

    async fn mark_failed(&self, id: i64, reason: &str) -> Result<bool, SenderoError> {
        queries::queue::mark_failed(self.db()?, id, reason).await
    }

    async fn cancel_message(&self, id: i64) -> Result<bool, SenderoError> {
        queries::queue::cancel_message(self.db()?, id).await
    }

    async fn cancel_pending_for_travelers(
        &self,
        traveler_ids: &[TravelerId],
    ) -> Result<usize, SenderoError> {
        queries::queue::cancel_pending_for_travelers(self.db()?, traveler_ids).await
    }

    async fn queue_counts(&self) -> Result<QueueCounts, SenderoError> {
        queries::queue::counts_by_state(self.db()?).await
    }
}
