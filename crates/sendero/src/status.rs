// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sendero status` command implementation.
//!
//! Opens the configured database and prints queue rows grouped by
//! state, either as a small table or as JSON for scripting.

use sendero_config::SenderoConfig;
use sendero_core::{FollowUpStore, QueueCounts, SenderoError};
use sendero_storage::SqliteStore;

/// Run the `sendero status` command.
pub async fn run_status(config: &SenderoConfig, json: bool) -> Result<(), SenderoError> {
    let store = SqliteStore::new(config.storage.clone());
    store.initialize().await?;
    let counts = store.queue_counts().await?;
    store.close().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&counts).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        print_counts(&config.storage.database_path, &counts);
    }
    Ok(())
}

fn print_counts(database_path: &str, counts: &QueueCounts) {
    println!();
    println!("  sendero queue status");
    println!("  {}", "-".repeat(35));
    println!("    Pending:    {}", counts.pending);
    println!("    Claimed:    {}", counts.claimed);
    println!("    Sent:       {}", counts.sent);
    println!("    Failed:     {}", counts.failed);
    println!("    Cancelled:  {}", counts.cancelled);
    println!("    Total:      {}", counts.total());
    println!();
    println!("  Database: {database_path}");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use sendero_config::model::StorageConfig;

    #[test]
    fn counts_serialize_for_json_mode() {
        let counts = QueueCounts {
            pending: 3,
            claimed: 0,
            sent: 12,
            failed: 1,
            cancelled: 2,
        };
        let json = serde_json::to_string(&counts).unwrap();
        assert!(json.contains("\"pending\":3"));
        assert!(json.contains("\"sent\":12"));
    }

    #[tokio::test]
    async fn status_runs_against_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = SenderoConfig {
            storage: StorageConfig {
                database_path: dir
                    .path()
                    .join("status.db")
                    .to_string_lossy()
                    .into_owned(),
                wal_mode: true,
            },
            ..SenderoConfig::default()
        };

        run_status(&config, true).await.unwrap();
    }
}
