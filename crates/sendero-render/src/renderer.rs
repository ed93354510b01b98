// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-pass `{{variable}}` substitution.

use crate::context::RecipientContext;

/// Appended to every rendered message after substitution.
pub const OPT_OUT_SUFFIX: &str =
    "\n\nReply STOP or UNSUBSCRIBE to stop receiving these messages.";

/// Renders a template body against a recipient context.
///
/// The body is scanned left to right exactly once. Each known
/// `{{variable}}` token is replaced with its resolved value; unknown
/// tokens and unterminated `{{` openers are copied through verbatim.
/// Resolved values are never rescanned, so a value that happens to
/// contain `{{...}}`-shaped text cannot trigger a second substitution.
///
/// Pure function: no I/O, byte-deterministic for a given input pair.
pub fn render(body: &str, ctx: &RecipientContext) -> String {
    let mut out = String::with_capacity(body.len() + OPT_OUT_SUFFIX.len());
    let mut rest = body;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find("}}") {
            Some(end) => {
                let token = after[..end].trim();
                match ctx.resolve(token) {
                    Some(value) => {
                        out.push_str(value);
                        rest = &after[end + 2..];
                    }
                    None => {
                        // Unknown token: emit the opener and keep scanning
                        // right after it, which leaves the token verbatim.
                        out.push_str("{{");
                        rest = after;
                    }
                }
            }
            None => {
                // No closing braces anywhere ahead of us.
                out.push_str("{{");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out.push_str(OPT_OUT_SUFFIX);
    out
}
