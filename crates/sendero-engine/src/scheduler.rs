// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Follow-up scheduling: one traveler fans out over the active templates.
//!
//! Scheduling renders the message body immediately and materializes it
//! into the queue row, so a template edited next week never changes a
//! message scheduled today. Inserts are keyed on (traveler, template);
//! repeating a scheduling call is a no-op for rows that already exist.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sendero_core::{
    BatchReport, BusId, FollowUpStore, NewQueuedMessage, ScheduleReport, SenderoError, TravelerId,
};
use sendero_render::{render, RecipientContext};
use tracing::{debug, info, warn};

/// Fans travelers out over the active follow-up templates.
pub struct Scheduler {
    store: Arc<dyn FollowUpStore>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn FollowUpStore>) -> Self {
        Self { store }
    }

    /// Schedules every active template for one traveler.
    ///
    /// Loads the traveler and agency first and fails with
    /// `RecipientNotFound` before any write when either row is gone.
    /// Per template, the send time is the traveler's ingestion time plus
    /// the template's day trigger; the rendered body is fixed at this
    /// moment. Already-queued (traveler, template) pairs are skipped.
    pub async fn schedule_for_traveler(
        &self,
        traveler_id: &TravelerId,
    ) -> Result<ScheduleReport, SenderoError> {
        let traveler = self
            .store
            .get_traveler(traveler_id)
            .await?
            .ok_or_else(|| SenderoError::RecipientNotFound {
                traveler_id: traveler_id.0.clone(),
            })?;

        let agency = self
            .store
            .get_agency(&traveler.agency_id)
            .await?
            .ok_or_else(|| {
                warn!(
                    traveler = %traveler_id.0,
                    agency = %traveler.agency_id.0,
                    "traveler references a missing agency"
                );
                SenderoError::RecipientNotFound {
                    traveler_id: traveler_id.0.clone(),
                }
            })?;

        let bus = match &traveler.bus_id {
            Some(bus_id) => self.store.get_bus(bus_id).await?,
            None => None,
        };

        if traveler.whatsapp_opt_out {
            debug!(traveler = %traveler_id.0, "traveler opted out, nothing scheduled");
            return Ok(ScheduleReport::default());
        }

        let ctx = RecipientContext::build(&traveler, &agency, bus.as_ref(), Utc::now());
        let templates = self.store.active_templates().await?;

        let mut report = ScheduleReport::default();
        for template in templates {
            let scheduled_for = traveler.ingested_at + Duration::days(template.day_trigger);
            let message = NewQueuedMessage {
                traveler_id: traveler.id.clone(),
                template_id: template.id.clone(),
                phone: traveler.phone.clone(),
                body: render(&template.body, &ctx),
                image_url: template.image_url.clone(),
                scheduled_for,
            };

            match self.store.enqueue_if_absent(&message).await? {
                Some(id) => {
                    debug!(
                        traveler = %traveler.id.0,
                        template = %template.id.0,
                        message_id = id,
                        scheduled_for = %scheduled_for,
                        "follow-up queued"
                    );
                    report.queued += 1;
                }
                None => report.skipped += 1,
            }
        }

        info!(
            traveler = %traveler.id.0,
            queued = report.queued,
            skipped = report.skipped,
            "scheduling complete"
        );
        Ok(report)
    }

    /// Schedules follow-ups for every traveler ingested from a bus.
    ///
    /// One traveler's failure is recorded in the report and the batch
    /// continues with the rest.
    pub async fn schedule_for_bus(&self, bus_id: &BusId) -> Result<BatchReport, SenderoError> {
        let travelers = self.store.travelers_on_bus(bus_id).await?;

        let mut report = BatchReport {
            travelers: travelers.len(),
            ..BatchReport::default()
        };
        for traveler in travelers {
            match self.schedule_for_traveler(&traveler.id).await {
                Ok(one) => {
                    report.queued += one.queued;
                    report.skipped += one.skipped;
                }
                Err(e) => {
                    warn!(
                        traveler = %traveler.id.0,
                        error = %e,
                        "scheduling failed, continuing with the rest of the bus"
                    );
                    report.failures.push((traveler.id.clone(), e.to_string()));
                }
            }
        }

        info!(
            bus = %bus_id.0,
            travelers = report.travelers,
            queued = report.queued,
            skipped = report.skipped,
            failures = report.failures.len(),
            "bus scheduling complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use sendero_core::{
        Agency, AgencyId, Bus, MessageTemplate, QueueCounts, QueueState, QueuedMessage, Traveler,
    };
    use sendero_render::OPT_OUT_SUFFIX;
    use sendero_test_utils::fixtures;
    use sendero_test_utils::TestHarness;

    #[tokio::test]
    async fn one_row_per_active_template() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.store.insert_agency(&fixtures::agency("ag-1")).await.unwrap();
        let traveler = fixtures::traveler("tr-1", "ag-1", "98-7654-3210");
        harness.store.insert_traveler(&traveler).await.unwrap();
        harness
            .store
            .insert_template(&fixtures::template("day-1", 1, "Hi {{traveler_name}}"))
            .await
            .unwrap();
        harness
            .store
            .insert_template(&fixtures::template("day-7", 7, "A week already, {{traveler_name}}"))
            .await
            .unwrap();

        let scheduler = Scheduler::new(harness.store.clone());
        let report = scheduler.schedule_for_traveler(&traveler.id).await.unwrap();
        assert_eq!(report, ScheduleReport { queued: 2, skipped: 0 });

        let counts = harness.store.queue_counts().await.unwrap();
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.total(), 2);
    }

    #[tokio::test]
    async fn repeat_scheduling_is_idempotent() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.store.insert_agency(&fixtures::agency("ag-1")).await.unwrap();
        let traveler = fixtures::traveler("tr-1", "ag-1", "98-7654-3210");
        harness.store.insert_traveler(&traveler).await.unwrap();
        harness
            .store
            .insert_template(&fixtures::template("day-1", 1, "Hello"))
            .await
            .unwrap();

        let scheduler = Scheduler::new(harness.store.clone());
        let first = scheduler.schedule_for_traveler(&traveler.id).await.unwrap();
        let second = scheduler.schedule_for_traveler(&traveler.id).await.unwrap();

        assert_eq!(first, ScheduleReport { queued: 1, skipped: 0 });
        assert_eq!(second, ScheduleReport { queued: 0, skipped: 1 });
        assert_eq!(harness.store.queue_counts().await.unwrap().pending, 1);
    }

    #[tokio::test]
    async fn send_time_is_ingestion_plus_day_trigger() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.store.insert_agency(&fixtures::agency("ag-1")).await.unwrap();
        let mut traveler = fixtures::traveler("tr-1", "ag-1", "98-7654-3210");
        traveler.ingested_at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        harness.store.insert_traveler(&traveler).await.unwrap();
        harness
            .store
            .insert_template(&fixtures::template("day-30", 30, "A month on"))
            .await
            .unwrap();

        let scheduler = Scheduler::new(harness.store.clone());
        scheduler.schedule_for_traveler(&traveler.id).await.unwrap();

        let rows = harness.store.messages_for_traveler(&traveler.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].scheduled_for,
            Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap()
        );
        assert_eq!(rows[0].state, QueueState::Pending);
    }

    #[tokio::test]
    async fn body_is_rendered_at_scheduling_time() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.store.insert_agency(&fixtures::agency("ag-1")).await.unwrap();
        harness.store.insert_bus(&fixtures::bus("bus-1", "ag-1")).await.unwrap();
        let mut traveler = fixtures::traveler("tr-1", "ag-1", "98-7654-3210");
        traveler.bus_id = Some(BusId("bus-1".into()));
        harness.store.insert_traveler(&traveler).await.unwrap();
        harness
            .store
            .insert_template(&fixtures::template(
                "day-1",
                1,
                "Hi {{traveler_name}}, how was {{route}}?",
            ))
            .await
            .unwrap();

        let scheduler = Scheduler::new(harness.store.clone());
        scheduler.schedule_for_traveler(&traveler.id).await.unwrap();

        let rows = harness.store.messages_for_traveler(&traveler.id).await.unwrap();
        assert_eq!(
            rows[0].body,
            format!("Hi Asha, how was Pune to Goa?{OPT_OUT_SUFFIX}")
        );
        assert_eq!(rows[0].phone, "98-7654-3210");
    }

    #[tokio::test]
    async fn unknown_traveler_is_recipient_not_found() {
        let harness = TestHarness::builder().build().await.unwrap();
        let scheduler = Scheduler::new(harness.store.clone());

        let err = scheduler
            .schedule_for_traveler(&TravelerId("ghost".into()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SenderoError::RecipientNotFound { ref traveler_id } if traveler_id == "ghost"
        ));
        assert_eq!(harness.store.queue_counts().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn opted_out_traveler_gets_nothing_scheduled() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.store.insert_agency(&fixtures::agency("ag-1")).await.unwrap();
        let mut traveler = fixtures::traveler("tr-1", "ag-1", "98-7654-3210");
        traveler.whatsapp_opt_out = true;
        harness.store.insert_traveler(&traveler).await.unwrap();
        harness
            .store
            .insert_template(&fixtures::template("day-1", 1, "Hello"))
            .await
            .unwrap();

        let scheduler = Scheduler::new(harness.store.clone());
        let report = scheduler.schedule_for_traveler(&traveler.id).await.unwrap();
        assert_eq!(report, ScheduleReport::default());
        assert_eq!(harness.store.queue_counts().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn bus_batch_sums_per_traveler_reports() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.store.insert_agency(&fixtures::agency("ag-1")).await.unwrap();
        harness.store.insert_bus(&fixtures::bus("bus-1", "ag-1")).await.unwrap();
        for (id, phone) in [("tr-1", "9876543210"), ("tr-2", "9876501234")] {
            let mut traveler = fixtures::traveler(id, "ag-1", phone);
            traveler.bus_id = Some(BusId("bus-1".into()));
            harness.store.insert_traveler(&traveler).await.unwrap();
        }
        harness
            .store
            .insert_template(&fixtures::template("day-1", 1, "Hello"))
            .await
            .unwrap();

        let scheduler = Scheduler::new(harness.store.clone());
        let report = scheduler.schedule_for_bus(&BusId("bus-1".into())).await.unwrap();

        assert_eq!(report.travelers, 2);
        assert_eq!(report.queued, 2);
        assert_eq!(report.skipped, 0);
        assert!(report.failures.is_empty());
    }

    /// Store wrapper that lists one traveler the directory does not have,
    /// reproducing a row that vanished mid-batch.
    struct PhantomStore {
        inner: Arc<dyn FollowUpStore>,
        phantom: Traveler,
    }

    #[async_trait]
    impl FollowUpStore for PhantomStore {
        async fn get_agency(&self, id: &AgencyId) -> Result<Option<Agency>, SenderoError> {
            self.inner.get_agency(id).await
        }
        async fn get_bus(&self, id: &BusId) -> Result<Option<Bus>, SenderoError> {
            self.inner.get_bus(id).await
        }
        async fn get_traveler(&self, id: &TravelerId) -> Result<Option<Traveler>, SenderoError> {
            if *id == self.phantom.id {
                return Ok(None);
            }
            self.inner.get_traveler(id).await
        }
        async fn travelers_on_bus(&self, bus_id: &BusId) -> Result<Vec<Traveler>, SenderoError> {
            let mut travelers = self.inner.travelers_on_bus(bus_id).await?;
            travelers.insert(0, self.phantom.clone());
            Ok(travelers)
        }
        async fn travelers_by_phone_digits(
            &self,
            phone_digits: &str,
        ) -> Result<Vec<Traveler>, SenderoError> {
            self.inner.travelers_by_phone_digits(phone_digits).await
        }
        async fn flag_opt_out(
            &self,
            phone_digits: &str,
            at: DateTime<Utc>,
        ) -> Result<usize, SenderoError> {
            self.inner.flag_opt_out(phone_digits, at).await
        }
        async fn active_templates(&self) -> Result<Vec<MessageTemplate>, SenderoError> {
            self.inner.active_templates().await
        }
        async fn enqueue_if_absent(
            &self,
            message: &NewQueuedMessage,
        ) -> Result<Option<i64>, SenderoError> {
            self.inner.enqueue_if_absent(message).await
        }
        async fn claim_due(
            &self,
            now: DateTime<Utc>,
            limit: usize,
        ) -> Result<Vec<QueuedMessage>, SenderoError> {
            self.inner.claim_due(now, limit).await
        }
        async fn sweep_expired_claims(&self, cutoff: DateTime<Utc>) -> Result<usize, SenderoError> {
            self.inner.sweep_expired_claims(cutoff).await
        }
        async fn mark_sent(&self, id: i64, provider_message_id: &str) -> Result<bool, SenderoError> {
            self.inner.mark_sent(id, provider_message_id).await
        }
        async fn mark_failed(&self, id: i64, reason: &str) -> Result<bool, SenderoError> {
            self.inner.mark_failed(id, reason).await
        }
        async fn cancel_message(&self, id: i64) -> Result<bool, SenderoError> {
            self.inner.cancel_message(id).await
        }
        async fn cancel_pending_for_travelers(
            &self,
            traveler_ids: &[TravelerId],
        ) -> Result<usize, SenderoError> {
            self.inner.cancel_pending_for_travelers(traveler_ids).await
        }
        async fn queue_counts(&self) -> Result<QueueCounts, SenderoError> {
            self.inner.queue_counts().await
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_bus_batch() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.store.insert_agency(&fixtures::agency("ag-1")).await.unwrap();
        harness.store.insert_bus(&fixtures::bus("bus-1", "ag-1")).await.unwrap();
        let mut healthy = fixtures::traveler("tr-1", "ag-1", "9876543210");
        healthy.bus_id = Some(BusId("bus-1".into()));
        harness.store.insert_traveler(&healthy).await.unwrap();
        harness
            .store
            .insert_template(&fixtures::template("day-1", 1, "Hello"))
            .await
            .unwrap();

        let mut phantom = fixtures::traveler("tr-gone", "ag-1", "9876509999");
        phantom.bus_id = Some(BusId("bus-1".into()));
        let store: Arc<dyn FollowUpStore> = Arc::new(PhantomStore {
            inner: harness.store.clone(),
            phantom,
        });

        let scheduler = Scheduler::new(store);
        let report = scheduler.schedule_for_bus(&BusId("bus-1".into())).await.unwrap();

        assert_eq!(report.travelers, 2);
        assert_eq!(report.queued, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, TravelerId("tr-gone".into()));
        assert!(report.failures[0].1.contains("recipient not found"));
    }
}
