// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared harness for integration tests.
//!
//! `TestHarness` assembles a real SQLite store in a temp directory with
//! migrations applied, plus a scriptable mock delivery adapter. Engine
//! pieces are constructed by the tests themselves so each test wires
//! exactly the components it exercises.

use std::sync::Arc;

use sendero_config::model::{DispatcherConfig, StorageConfig};
use sendero_core::{FollowUpStore, SenderoError};
use sendero_storage::SqliteStore;

use crate::mock_delivery::MockDelivery;

/// Configures and builds a [`TestHarness`].
pub struct TestHarnessBuilder {
    dispatcher: DispatcherConfig,
    keep_seeded_templates: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            dispatcher: DispatcherConfig::default(),
            keep_seeded_templates: false,
        }
    }

    /// Override the dispatcher settings handed to tests.
    pub fn with_dispatcher(mut self, config: DispatcherConfig) -> Self {
        self.dispatcher = config;
        self
    }

    /// Keep the migration-seeded follow-up templates active. By default
    /// the harness deactivates them so each test controls the template
    /// set exactly.
    pub fn keep_seeded_templates(mut self) -> Self {
        self.keep_seeded_templates = true;
        self
    }

    /// Build the test harness, creating the temp database.
    pub async fn build(self) -> Result<TestHarness, SenderoError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| SenderoError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let store = SqliteStore::new(storage_config);
        store.initialize().await?;
        let store = Arc::new(store);

        if !self.keep_seeded_templates {
            for template in store.active_templates().await? {
                store.set_template_active(&template.id, false).await?;
            }
        }

        Ok(TestHarness {
            store,
            delivery: Arc::new(MockDelivery::new()),
            dispatcher: self.dispatcher,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a temp SQLite store and mock delivery.
pub struct TestHarness {
    /// SQLite store (temp DB, migrations applied, cleaned up on drop).
    pub store: Arc<SqliteStore>,
    /// The scriptable delivery adapter.
    pub delivery: Arc<MockDelivery>,
    /// Dispatcher settings for tests that run dispatch cycles.
    pub dispatcher: DispatcherConfig,
    /// Holds the database directory open until the harness drops.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }
}
