// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Sendero follow-up engine.
//!
//! Three cooperating pieces around the queue store:
//! - [`Scheduler`]: fans one traveler (or a whole bus) out over the
//!   active templates, rendering bodies and inserting queue rows
//!   idempotently.
//! - [`Dispatcher`]: the periodic loop that claims due rows, re-checks
//!   opt-out, calls the delivery adapter, and records terminal outcomes.
//! - [`OptOutHandler`]: turns inbound free-text replies into permanent
//!   suppression, cancelling whatever is still pending.
//!
//! All pieces take the store (and optionally a delivery adapter) as
//! injected `Arc`s; nothing here holds global state.

pub mod dispatcher;
pub mod optout;
pub mod scheduler;
pub mod shutdown;

pub use dispatcher::Dispatcher;
pub use optout::OptOutHandler;
pub use scheduler::Scheduler;
pub use shutdown::install_signal_handler;
