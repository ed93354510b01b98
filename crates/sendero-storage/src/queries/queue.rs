// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue operations for crash-safe follow-up dispatch.
//!
//! State machine: pending -> claimed -> sent | failed | cancelled, with
//! pending -> cancelled for opt-outs. Terminal states never change again;
//! every transition is a conditional UPDATE whose affected-row count tells
//! the caller whether it actually happened.

use chrono::{DateTime, Utc};
use rusqlite::params;
use sendero_core::SenderoError;
use std::str::FromStr;

use crate::database::{fmt_ts, parse_ts, Database};
use crate::models::{NewQueuedMessage, QueueCounts, QueueState, QueuedMessage, TemplateId, TravelerId};

const MESSAGE_COLUMNS: &str = "id, traveler_id, template_id, phone, body, image_url,
     scheduled_for, state, provider_message_id, failure_reason, claimed_at, created_at, updated_at";

/// Insert a queue row unless a non-cancelled row for the same traveler and
/// template already exists. Scheduling is idempotent through this guard:
/// re-running it never duplicates a follow-up.
///
/// Returns the new row id, or `None` when the insert was suppressed.
pub async fn enqueue_if_absent(
    db: &Database,
    message: &NewQueuedMessage,
) -> Result<Option<i64>, SenderoError> {
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO queued_messages
                     (traveler_id, template_id, phone, body, image_url, scheduled_for)
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6
                 WHERE NOT EXISTS (
                     SELECT 1 FROM queued_messages
                     WHERE traveler_id = ?1 AND template_id = ?2 AND state != 'cancelled'
                 )",
                params![
                    message.traveler_id.0,
                    message.template_id.0,
                    message.phone,
                    message.body,
                    message.image_url,
                    fmt_ts(&message.scheduled_for),
                ],
            )?;
            if inserted == 0 {
                Ok(None)
            } else {
                Ok(Some(conn.last_insert_rowid()))
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Atomically claim up to `limit` due pending rows.
///
/// Select and update run in one transaction, so two dispatch runs racing
/// over the same queue can never claim the same row. Returned rows carry
/// the post-claim state.
pub async fn claim_due(
    db: &Database,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<QueuedMessage>, SenderoError> {
    let now_text = fmt_ts(&now);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let mut claimed = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM queued_messages
                     WHERE state = 'pending' AND scheduled_for <= ?1
                     ORDER BY scheduled_for ASC, id ASC
                     LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![now_text, limit as i64], row_to_message)?;
                let mut claimed = Vec::new();
                for row in rows {
                    claimed.push(row?);
                }
                claimed
            };

            for message in &mut claimed {
                tx.execute(
                    "UPDATE queued_messages
                     SET state = 'claimed', claimed_at = ?2,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1",
                    params![message.id, now_text],
                )?;
                message.state = QueueState::Claimed;
                message.claimed_at = Some(now);
            }

            tx.commit()?;
            Ok(claimed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fail every claim older than `cutoff`.
///
/// A claim that old belongs to a dispatch run that crashed before
/// resolving it. Failing instead of re-pending keeps delivery at most
/// once: the original send may or may not have reached the gateway.
pub async fn sweep_expired_claims(
    db: &Database,
    cutoff: DateTime<Utc>,
) -> Result<usize, SenderoError> {
    let cutoff = fmt_ts(&cutoff);
    db.connection()
        .call(move |conn| {
            let swept = conn.execute(
                "UPDATE queued_messages
                 SET state = 'failed', failure_reason = 'claim expired',
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE state = 'claimed' AND claimed_at < ?1",
                params![cutoff],
            )?;
            Ok(swept)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a claimed row sent, recording the provider's message id.
pub async fn mark_sent(
    db: &Database,
    id: i64,
    provider_message_id: &str,
) -> Result<bool, SenderoError> {
    let provider_message_id = provider_message_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE queued_messages
                 SET state = 'sent', provider_message_id = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND state = 'claimed'",
                params![id, provider_message_id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a claimed row failed with a human-readable reason.
pub async fn mark_failed(db: &Database, id: i64, reason: &str) -> Result<bool, SenderoError> {
    let reason = reason.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE queued_messages
                 SET state = 'failed', failure_reason = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND state = 'claimed'",
                params![id, reason],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Cancel a live row. Terminal rows are left untouched.
pub async fn cancel_message(db: &Database, id: i64) -> Result<bool, SenderoError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE queued_messages
                 SET state = 'cancelled',
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND state IN ('pending', 'claimed')",
                params![id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Cancel every pending row for the given travelers in one statement.
///
/// Claimed rows are deliberately not touched here: the dispatch run that
/// claimed them re-checks the opt-out flag before sending.
pub async fn cancel_pending_for_travelers(
    db: &Database,
    traveler_ids: &[TravelerId],
) -> Result<usize, SenderoError> {
    if traveler_ids.is_empty() {
        return Ok(0);
    }
    let ids: Vec<String> = traveler_ids.iter().map(|t| t.0.clone()).collect();
    db.connection()
        .call(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let sql = format!(
                "UPDATE queued_messages
                 SET state = 'cancelled',
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE state = 'pending' AND traveler_id IN ({placeholders})"
            );
            let changed = conn.execute(&sql, rusqlite::params_from_iter(ids.iter()))?;
            Ok(changed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Queue rows grouped by state.
pub async fn counts_by_state(db: &Database) -> Result<QueueCounts, SenderoError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT state, COUNT(*) FROM queued_messages GROUP BY state")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            let mut counts = QueueCounts::default();
            for row in rows {
                let (state, n) = row?;
                let n = n as usize;
                match state.as_str() {
                    "pending" => counts.pending = n,
                    "claimed" => counts.claimed = n,
                    "sent" => counts.sent = n,
                    "failed" => counts.failed = n,
                    "cancelled" => counts.cancelled = n,
                    _ => {}
                }
            }
            Ok(counts)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a queue row by id.
pub async fn get_message(db: &Database, id: i64) -> Result<Option<QueuedMessage>, SenderoError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM queued_messages WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_message);
            match result {
                Ok(message) => Ok(Some(message)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All queue rows for a traveler, oldest schedule first.
pub async fn messages_for_traveler(
    db: &Database,
    traveler_id: &TravelerId,
) -> Result<Vec<QueuedMessage>, SenderoError> {
    let traveler_id = traveler_id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM queued_messages
                 WHERE traveler_id = ?1 ORDER BY scheduled_for ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![traveler_id], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueuedMessage> {
    let scheduled_for: String = row.get(6)?;
    let state: String = row.get(7)?;
    let claimed_at: Option<String> = row.get(10)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;
    Ok(QueuedMessage {
        id: row.get(0)?,
        traveler_id: TravelerId(row.get(1)?),
        template_id: TemplateId(row.get(2)?),
        phone: row.get(3)?,
        body: row.get(4)?,
        image_url: row.get(5)?,
        scheduled_for: parse_ts(&scheduled_for, 6)?,
        state: QueueState::from_str(&state).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?,
        provider_message_id: row.get(8)?,
        failure_reason: row.get(9)?,
        claimed_at: claimed_at.as_deref().map(|t| parse_ts(t, 10)).transpose()?,
        created_at: parse_ts(&created_at, 11)?,
        updated_at: parse_ts(&updated_at, 12)?,
    })
}
