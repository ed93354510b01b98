// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template rendering for Sendero follow-up messages.
//!
//! Two pieces, both pure:
//! - [`RecipientContext`]: resolves the per-recipient variable table
//!   (names, route, dates, coupon) with documented fallbacks.
//! - [`render`]: substitutes `{{variable}}` tokens into a template body
//!   in a single pass and appends the opt-out instruction.
//!
//! Rendering happens once, at scheduling time. The rendered body is
//! materialized into the queue so later template edits never change a
//! message that has already been scheduled.

pub mod context;
pub mod renderer;

pub use context::RecipientContext;
pub use renderer::{render, OPT_OUT_SUFFIX};
