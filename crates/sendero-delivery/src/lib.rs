// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message delivery for Sendero.
//!
//! [`HttpGateway`] implements [`sendero_core::DeliveryAdapter`] against a
//! plain-text HTTP gateway: phone and message validation happens locally
//! (rejections never touch the network), the send itself is a GET with
//! query parameters, and the gateway's `S.`-prefixed body convention is
//! classified into success or [`sendero_core::SenderoError::ProviderRejected`].
//!
//! Validation and transport failures are recorded as structured security
//! events with the phone masked to its last four digits.

pub mod audit;
pub mod gateway;

pub use gateway::HttpGateway;
