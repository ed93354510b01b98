// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test utilities for the Sendero workspace.
//!
//! Provides deterministic directory fixtures, a scriptable mock delivery
//! adapter, and a `TestHarness` that assembles a real migrated SQLite
//! store in a temp directory.

pub mod fixtures;
pub mod harness;
pub mod mock_delivery;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_delivery::MockDelivery;
