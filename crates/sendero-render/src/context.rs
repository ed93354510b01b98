// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipient context: the variable table one rendered message draws from.

use chrono::{DateTime, Utc};
use sendero_core::{Agency, Bus, Traveler};

/// Fallback shown when a traveler row has no name.
pub const DEFAULT_TRAVELER_NAME: &str = "Traveler";
/// Fallback shown when an agency row has no usable name.
pub const DEFAULT_AGENCY_NAME: &str = "Travel Agency";
/// Fallback shown when the traveler is not linked to a bus.
pub const DEFAULT_BUS_NAME: &str = "Bus Service";
/// Fallback shown when either route endpoint is missing.
pub const DEFAULT_ROUTE: &str = "Route";
/// Fallback shown when the traveler has no recorded travel date.
pub const DEFAULT_TRAVEL_DATE: &str = "Travel Date";
/// Coupon offered when the traveler row carries none of its own.
pub const DEFAULT_COUPON_CODE: &str = "WELCOME10";
/// Booking link used when the agency has not configured its own.
pub const DEFAULT_BOOKING_LINK: &str = "https://sendero.travel/book";

/// Resolved variable values for one recipient.
///
/// Built once per (traveler, template) scheduling operation and handed
/// to [`crate::render`]. Every field is already a display-ready string;
/// fallbacks have been applied, so resolution never fails downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientContext {
    pub traveler_name: String,
    pub agency_name: String,
    pub bus_name: String,
    /// `"{from} to {to}"` when both endpoints are known.
    pub route: String,
    /// Travel date formatted as `05 Mar 2024`.
    pub travel_date: String,
    pub coupon_code: String,
    pub booking_link: String,
    /// Stored phone, unmodified.
    pub phone: String,
    /// Whole days elapsed since the travel date, never negative.
    pub days_since_travel: String,
}

impl RecipientContext {
    /// Assembles the variable table for one recipient.
    ///
    /// The caller is responsible for loading the traveler and agency
    /// rows (and failing with `RecipientNotFound` if either is gone);
    /// a missing bus only triggers the bus-related fallbacks here.
    pub fn build(
        traveler: &Traveler,
        agency: &Agency,
        bus: Option<&Bus>,
        now: DateTime<Utc>,
    ) -> Self {
        let traveler_name = non_empty(traveler.name.as_deref())
            .unwrap_or(DEFAULT_TRAVELER_NAME)
            .to_string();

        let agency_name = non_empty(Some(agency.name.as_str()))
            .unwrap_or(DEFAULT_AGENCY_NAME)
            .to_string();

        let bus_name = non_empty(bus.map(|b| b.name.as_str()))
            .unwrap_or(DEFAULT_BUS_NAME)
            .to_string();

        let route = match bus {
            Some(b) => match (
                non_empty(b.route_from.as_deref()),
                non_empty(b.route_to.as_deref()),
            ) {
                (Some(from), Some(to)) => format!("{from} to {to}"),
                _ => DEFAULT_ROUTE.to_string(),
            },
            None => DEFAULT_ROUTE.to_string(),
        };

        let travel_date = match traveler.travel_date {
            Some(date) => date.format("%d %b %Y").to_string(),
            None => DEFAULT_TRAVEL_DATE.to_string(),
        };

        let coupon_code = non_empty(traveler.coupon_code.as_deref())
            .unwrap_or(DEFAULT_COUPON_CODE)
            .to_string();

        let booking_link = non_empty(agency.booking_url.as_deref())
            .unwrap_or(DEFAULT_BOOKING_LINK)
            .to_string();

        let days_since_travel = match traveler.travel_date {
            Some(date) => {
                let days = now.date_naive().signed_duration_since(date).num_days();
                // Future travel dates clamp to zero rather than going negative.
                days.max(0).to_string()
            }
            None => "0".to_string(),
        };

        Self {
            traveler_name,
            agency_name,
            bus_name,
            route,
            travel_date,
            coupon_code,
            booking_link,
            phone: traveler.phone.clone(),
            days_since_travel,
        }
    }

    /// Looks up the resolved value for a template variable name.
    ///
    /// Returns `None` for names outside the fixed variable table; the
    /// renderer leaves those tokens in the output verbatim.
    pub fn resolve(&self, variable: &str) -> Option<&str> {
        let value = match variable {
            "traveler_name" => &self.traveler_name,
            "agency_name" => &self.agency_name,
            "bus_name" => &self.bus_name,
            "route" => &self.route,
            "travel_date" => &self.travel_date,
            "coupon_code" => &self.coupon_code,
            "booking_link" => &self.booking_link,
            "phone" => &self.phone,
            "days_since_travel" => &self.days_since_travel,
            _ => return None,
        };
        Some(value)
    }
}

/// Trims and returns the string if it has visible content.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
