// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number normalization and masking helpers.
//!
//! Travelers are ingested with phones in whatever shape the agency's
//! spreadsheet had. Matching and delivery both work on the digit-only
//! form, so the rules live here rather than in any one adapter.

/// Strips every non-digit character from a raw phone number.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Drops a leading country code from an already digit-only number.
///
/// The prefix is removed only when the number is exactly the country
/// code followed by a ten digit subscriber number. Anything else is
/// returned unchanged rather than guessed at.
pub fn strip_country_prefix<'a>(digits: &'a str, country_code: &str) -> &'a str {
    if !country_code.is_empty()
        && digits.len() == country_code.len() + 10
        && digits.starts_with(country_code)
    {
        &digits[country_code.len()..]
    } else {
        digits
    }
}

/// Masks a phone number for log output, keeping only the last four digits.
pub fn mask(raw: &str) -> String {
    let digits = digits_only(raw);
    if digits.len() <= 4 {
        "*".repeat(digits.len())
    } else {
        let visible = &digits[digits.len() - 4..];
        format!("{}{}", "*".repeat(digits.len() - 4), visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_only_strips_punctuation() {
        assert_eq!(digits_only("+91 98765-43210"), "919876543210");
        assert_eq!(digits_only("(020) 555 0199"), "0205550199");
        assert_eq!(digits_only("no digits"), "");
    }

    #[test]
    fn country_prefix_stripped_only_for_exact_shape() {
        assert_eq!(strip_country_prefix("919876543210", "91"), "9876543210");
        // Ten digits already: nothing to strip.
        assert_eq!(strip_country_prefix("9876543210", "91"), "9876543210");
        // Twelve digits but a different prefix.
        assert_eq!(strip_country_prefix("449876543210", "91"), "449876543210");
        // Eleven digits: not the expected shape, leave alone.
        assert_eq!(strip_country_prefix("19876543210", "91"), "19876543210");
        assert_eq!(strip_country_prefix("9876543210", ""), "9876543210");
    }

    #[test]
    fn mask_keeps_last_four_digits() {
        assert_eq!(mask("+91 98765-43210"), "********3210");
        assert_eq!(mask("1234"), "****");
        assert_eq!(mask("12"), "**");
        assert_eq!(mask(""), "");
    }
}
