// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic directory fixtures.
//!
//! Dates are fixed so scheduling arithmetic in tests is exact: the
//! traveler rode on 5 Mar 2024 and was ingested the next morning.
//! Callers override individual fields where a test needs to.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sendero_core::phone::{digits_only, strip_country_prefix};
use sendero_core::{
    Agency, AgencyId, Bus, BusId, MessageTemplate, NewQueuedMessage, TemplateId, Traveler,
    TravelerId,
};

fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

pub fn agency(id: &str) -> Agency {
    Agency {
        id: AgencyId(id.to_string()),
        name: "Ghat Roadways".to_string(),
        booking_url: Some("https://ghatroadways.example/book".to_string()),
        created_at: created_at(),
    }
}

pub fn bus(id: &str, agency_id: &str) -> Bus {
    Bus {
        id: BusId(id.to_string()),
        agency_id: AgencyId(agency_id.to_string()),
        name: "Night Deluxe".to_string(),
        route_from: Some("Pune".to_string()),
        route_to: Some("Goa".to_string()),
        created_at: created_at(),
    }
}

/// A traveler named Asha, not yet assigned to a bus. `phone_digits` is
/// derived from `phone` the same way ingestion derives it.
pub fn traveler(id: &str, agency_id: &str, phone: &str) -> Traveler {
    let digits = digits_only(phone);
    Traveler {
        id: TravelerId(id.to_string()),
        agency_id: AgencyId(agency_id.to_string()),
        bus_id: None,
        name: Some("Asha".to_string()),
        phone: phone.to_string(),
        phone_digits: strip_country_prefix(&digits, "91").to_string(),
        travel_date: NaiveDate::from_ymd_opt(2024, 3, 5),
        coupon_code: None,
        whatsapp_opt_out: false,
        opt_out_at: None,
        ingested_at: Utc.with_ymd_and_hms(2024, 3, 6, 8, 0, 0).unwrap(),
    }
}

pub fn template(id: &str, day_trigger: i64, body: &str) -> MessageTemplate {
    MessageTemplate {
        id: TemplateId(id.to_string()),
        day_trigger,
        body: body.to_string(),
        image_url: None,
        is_active: true,
        created_at: created_at(),
    }
}

/// A pre-rendered queue row due on the morning of 8 Mar 2024.
pub fn queued_message(traveler_id: &str, template_id: &str, phone: &str) -> NewQueuedMessage {
    NewQueuedMessage {
        traveler_id: TravelerId(traveler_id.to_string()),
        template_id: TemplateId(template_id.to_string()),
        phone: phone.to_string(),
        body: "Hello Asha, how was the trip?".to_string(),
        image_url: None,
        scheduled_for: Utc.with_ymd_and_hms(2024, 3, 8, 8, 0, 0).unwrap(),
    }
}
