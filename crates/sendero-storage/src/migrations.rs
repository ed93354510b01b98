// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema migrations, embedded at compile time.
//!
//! The SQL files under `migrations/` are baked into the binary and
//! applied on open, so a fresh database is usable without an install
//! step and `status` works before the first `serve`.

use sendero_core::SenderoError;
use tracing::debug;

mod embedded {
    refinery::embed_migrations!("migrations");
}

/// Applies every migration not yet recorded in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), SenderoError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| SenderoError::Storage { source: Box::new(e) })?;
    debug!(
        applied = report.applied_migrations().len(),
        "schema migrations applied"
    );
    Ok(())
}
