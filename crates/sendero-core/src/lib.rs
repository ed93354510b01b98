// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Sendero follow-up engine.
//!
//! This crate provides the foundational trait definitions, error types,
//! and domain types used throughout the Sendero workspace. The storage
//! and delivery crates implement the traits defined here.

pub mod error;
pub mod phone;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SenderoError;
pub use types::{
    Agency, AgencyId, BatchReport, Bus, BusId, DeliveryReceipt, DeliveryRequest, MessageTemplate,
    NewQueuedMessage, OptOutOutcome, QueueCounts, QueueState, QueuedMessage, RunReport,
    ScheduleReport, TemplateId, Traveler, TravelerId,
};

// Re-export the adapter traits at crate root.
pub use traits::{DeliveryAdapter, FollowUpStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sendero_error_has_all_variants() {
        // Verify all 8 error variants exist and can be constructed.
        let _config = SenderoError::Config("test".into());
        let _storage = SenderoError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _not_found = SenderoError::RecipientNotFound {
            traveler_id: "t-1".into(),
        };
        let _recipient = SenderoError::InvalidRecipient {
            reason: "too short".into(),
        };
        let _message = SenderoError::InvalidMessage {
            reason: "empty body".into(),
        };
        let _transport = SenderoError::Transport {
            message: "connect refused".into(),
            source: None,
        };
        let _rejected = SenderoError::ProviderRejected {
            body: "E.401".into(),
        };
        let _internal = SenderoError::Internal("test".into());
    }

    #[test]
    fn error_display_is_prefixed() {
        let err = SenderoError::InvalidRecipient {
            reason: "3 digits".into(),
        };
        assert_eq!(err.to_string(), "invalid recipient: 3 digits");

        let err = SenderoError::ProviderRejected {
            body: "E.no-credit".into(),
        };
        assert_eq!(err.to_string(), "gateway rejected message: E.no-credit");
    }

    #[test]
    fn trait_objects_are_constructible() {
        // The traits must stay object-safe; both are held behind
        // Arc<dyn ...> throughout the engine.
        fn _assert_delivery(_: &dyn DeliveryAdapter) {}
        fn _assert_store(_: &dyn FollowUpStore) {}
    }
}
