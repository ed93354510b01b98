// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Traveler CRUD and opt-out operations.

use chrono::{DateTime, Utc};
use rusqlite::params;
use sendero_core::SenderoError;

use crate::database::{fmt_date, fmt_ts, parse_date, parse_ts, Database};
use crate::models::{AgencyId, BusId, Traveler, TravelerId};

const TRAVELER_COLUMNS: &str = "id, agency_id, bus_id, name, phone, phone_digits, travel_date,
     coupon_code, whatsapp_opt_out, opt_out_at, ingested_at";

/// Insert a new traveler. `phone_digits` must already be normalized by the
/// caller; the store does not re-derive it.
pub async fn insert_traveler(db: &Database, traveler: &Traveler) -> Result<(), SenderoError> {
    let traveler = traveler.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO travelers (id, agency_id, bus_id, name, phone, phone_digits,
                     travel_date, coupon_code, whatsapp_opt_out, opt_out_at, ingested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    traveler.id.0,
                    traveler.agency_id.0,
                    traveler.bus_id.as_ref().map(|b| b.0.clone()),
                    traveler.name,
                    traveler.phone,
                    traveler.phone_digits,
                    traveler.travel_date.as_ref().map(fmt_date),
                    traveler.coupon_code,
                    traveler.whatsapp_opt_out,
                    traveler.opt_out_at.as_ref().map(fmt_ts),
                    fmt_ts(&traveler.ingested_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a traveler by ID.
pub async fn get_traveler(
    db: &Database,
    id: &TravelerId,
) -> Result<Option<Traveler>, SenderoError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRAVELER_COLUMNS} FROM travelers WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_traveler);
            match result {
                Ok(traveler) => Ok(Some(traveler)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All travelers on the given bus, in ingestion order.
pub async fn travelers_on_bus(db: &Database, bus_id: &BusId) -> Result<Vec<Traveler>, SenderoError> {
    let bus_id = bus_id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRAVELER_COLUMNS} FROM travelers
                 WHERE bus_id = ?1 ORDER BY ingested_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![bus_id], row_to_traveler)?;
            let mut travelers = Vec::new();
            for row in rows {
                travelers.push(row?);
            }
            Ok(travelers)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every traveler whose normalized phone equals `phone_digits`.
pub async fn travelers_by_phone_digits(
    db: &Database,
    phone_digits: &str,
) -> Result<Vec<Traveler>, SenderoError> {
    let phone_digits = phone_digits.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRAVELER_COLUMNS} FROM travelers
                 WHERE phone_digits = ?1 ORDER BY ingested_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![phone_digits], row_to_traveler)?;
            let mut travelers = Vec::new();
            for row in rows {
                travelers.push(row?);
            }
            Ok(travelers)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Flag every traveler sharing the phone number as opted out.
///
/// One set-based UPDATE; already-flagged rows keep their original
/// opt_out_at. Returns the number of newly flagged rows.
pub async fn flag_opt_out(
    db: &Database,
    phone_digits: &str,
    at: DateTime<Utc>,
) -> Result<usize, SenderoError> {
    let phone_digits = phone_digits.to_string();
    let at = fmt_ts(&at);
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE travelers SET whatsapp_opt_out = 1, opt_out_at = ?2
                 WHERE phone_digits = ?1 AND whatsapp_opt_out = 0",
                params![phone_digits, at],
            )?;
            Ok(changed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn row_to_traveler(row: &rusqlite::Row<'_>) -> rusqlite::Result<Traveler> {
    let travel_date: Option<String> = row.get(6)?;
    let opt_out_at: Option<String> = row.get(9)?;
    let ingested_at: String = row.get(10)?;
    Ok(Traveler {
        id: TravelerId(row.get(0)?),
        agency_id: AgencyId(row.get(1)?),
        bus_id: row.get::<_, Option<String>>(2)?.map(BusId),
        name: row.get(3)?,
        phone: row.get(4)?,
        phone_digits: row.get(5)?,
        travel_date: travel_date.as_deref().map(|d| parse_date(d, 6)).transpose()?,
        coupon_code: row.get(7)?,
        whatsapp_opt_out: row.get(8)?,
        opt_out_at: opt_out_at.as_deref().map(|t| parse_ts(t, 9)).transpose()?,
        ingested_at: parse_ts(&ingested_at, 10)?,
    })
}
