// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Sendero engine.
//!
//! Traits use `#[async_trait]` so implementations can be held behind
//! `Arc<dyn ...>` and swapped for mocks in tests.

pub mod delivery;
pub mod store;

// Re-export all traits at the traits module level for convenience.
pub use delivery::DeliveryAdapter;
pub use store::FollowUpStore;
