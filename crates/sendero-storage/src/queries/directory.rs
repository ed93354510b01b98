// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agency and bus directory operations.
//!
//! The directory is reference data for the context builder; the engine
//! only ever reads it. Inserts exist for ingestion tooling and tests.

use rusqlite::params;
use sendero_core::SenderoError;

use crate::database::{fmt_ts, parse_ts, Database};
use crate::models::{Agency, AgencyId, Bus, BusId};

/// Insert a new agency.
pub async fn insert_agency(db: &Database, agency: &Agency) -> Result<(), SenderoError> {
    let agency = agency.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO agencies (id, name, booking_url, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    agency.id.0,
                    agency.name,
                    agency.booking_url,
                    fmt_ts(&agency.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get an agency by ID.
pub async fn get_agency(db: &Database, id: &AgencyId) -> Result<Option<Agency>, SenderoError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, booking_url, created_at FROM agencies WHERE id = ?1",
            )?;
            let result = stmt.query_row(params![id], row_to_agency);
            match result {
                Ok(agency) => Ok(Some(agency)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a new bus.
pub async fn insert_bus(db: &Database, bus: &Bus) -> Result<(), SenderoError> {
    let bus = bus.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO buses (id, agency_id, name, route_from, route_to, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    bus.id.0,
                    bus.agency_id.0,
                    bus.name,
                    bus.route_from,
                    bus.route_to,
                    fmt_ts(&bus.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a bus by ID.
pub async fn get_bus(db: &Database, id: &BusId) -> Result<Option<Bus>, SenderoError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, agency_id, name, route_from, route_to, created_at
                 FROM buses WHERE id = ?1",
            )?;
            let result = stmt.query_row(params![id], row_to_bus);
            match result {
                Ok(bus) => Ok(Some(bus)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn row_to_agency(row: &rusqlite::Row<'_>) -> rusqlite::Result<Agency> {
    let created_at: String = row.get(3)?;
    Ok(Agency {
        id: AgencyId(row.get(0)?),
        name: row.get(1)?,
        booking_url: row.get(2)?,
        created_at: parse_ts(&created_at, 3)?,
    })
}

fn row_to_bus(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bus> {
    let created_at: String = row.get(5)?;
    Ok(Bus {
        id: BusId(row.get(0)?),
        agency_id: AgencyId(row.get(1)?),
        name: row.get(2)?,
        route_from: row.get(3)?,
        route_to: row.get(4)?,
        created_at: parse_ts(&created_at, 5)?,
    })
}
