// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Sendero follow-up engine.
//!
//! One writer connection behind `tokio-rusqlite`, WAL journaling, and
//! refinery migrations applied on open. Typed query modules cover the
//! agency directory, message templates, and the crash-safe queue;
//! [`SqliteStore`] ties them together behind the `FollowUpStore` trait.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

pub use database::Database;
pub use models::*;
pub use store::SqliteStore;
