// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `sendero-core::types` for use across
//! adapter trait boundaries. This module re-exports them for convenience
//! within the storage crate.

pub use sendero_core::types::{
    Agency, AgencyId, Bus, BusId, MessageTemplate, NewQueuedMessage, QueueCounts, QueueState,
    QueuedMessage, TemplateId, Traveler, TravelerId,
};
