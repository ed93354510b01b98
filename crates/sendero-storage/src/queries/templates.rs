// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message template operations.

use rusqlite::params;
use sendero_core::SenderoError;

use crate::database::{fmt_ts, parse_ts, Database};
use crate::models::{MessageTemplate, TemplateId};

/// Insert a new template.
pub async fn insert_template(db: &Database, template: &MessageTemplate) -> Result<(), SenderoError> {
    let template = template.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO message_templates (id, day_trigger, body, image_url, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    template.id.0,
                    template.day_trigger,
                    template.body,
                    template.image_url,
                    template.is_active,
                    fmt_ts(&template.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Active templates ordered by ascending day trigger.
pub async fn active_templates(db: &Database) -> Result<Vec<MessageTemplate>, SenderoError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, day_trigger, body, image_url, is_active, created_at
                 FROM message_templates WHERE is_active = 1
                 ORDER BY day_trigger ASC, id ASC",
            )?;
            let rows = stmt.query_map([], row_to_template)?;
            let mut templates = Vec::new();
            for row in rows {
                templates.push(row?);
            }
            Ok(templates)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Activate or deactivate a template. Affects future scheduling only;
/// already queued messages keep their rendered body.
pub async fn set_template_active(
    db: &Database,
    id: &TemplateId,
    active: bool,
) -> Result<bool, SenderoError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE message_templates SET is_active = ?2 WHERE id = ?1",
                params![id, active],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn row_to_template(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageTemplate> {
    let created_at: String = row.get(5)?;
    Ok(MessageTemplate {
        id: TemplateId(row.get(0)?),
        day_trigger: row.get(1)?,
        body: row.get(2)?,
        image_url: row.get(3)?,
        is_active: row.get(4)?,
        created_at: parse_ts(&created_at, 5)?,
    })
}
