// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The periodic queue processor.
//!
//! Each run sweeps abandoned claims, atomically claims a batch of due
//! rows, and processes them with bounded concurrency. Every message
//! ends the run in a terminal state or cancelled; failures are never
//! retried, which keeps delivery at-most-once.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use sendero_config::DispatcherConfig;
use sendero_core::{
    DeliveryAdapter, DeliveryRequest, FollowUpStore, QueuedMessage, RunReport, SenderoError,
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What happened to one claimed message.
enum DispatchOutcome {
    Sent,
    Failed,
    Cancelled,
}

/// Claims due queue rows and hands them to the delivery adapter.
///
/// Holds no mutable state; the store serializes all row transitions.
/// `delivery` is `None` when outbound delivery is disabled in config,
/// in which case every run is a no-op that leaves the queue untouched.
pub struct Dispatcher {
    store: Arc<dyn FollowUpStore>,
    delivery: Option<Arc<dyn DeliveryAdapter>>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn FollowUpStore>,
        delivery: Option<Arc<dyn DeliveryAdapter>>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            store,
            delivery,
            config,
        }
    }

    /// Runs the dispatch loop until the cancellation token fires.
    ///
    /// Ticks never overlap: the loop body awaits run completion, and a
    /// tick that lands mid-run is skipped rather than queued. The first
    /// run starts immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(StdDuration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.interval_secs,
            batch_limit = self.config.batch_limit,
            "dispatcher loop running"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_once(Utc::now()).await {
                        Ok(report) if report.is_empty() => {
                            debug!("dispatch run found nothing due");
                        }
                        Ok(report) => {
                            info!(
                                swept = report.swept,
                                sent = report.sent,
                                failed = report.failed,
                                cancelled = report.cancelled,
                                "dispatch run complete"
                            );
                        }
                        Err(e) => error!(error = %e, "dispatch run failed"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping dispatcher loop");
                    break;
                }
            }
        }
    }

    /// Executes one dispatch cycle against the queue.
    ///
    /// `now` is the logical clock for both the stale-claim cutoff and
    /// the due check, so runs are reproducible under test.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<RunReport, SenderoError> {
        let Some(delivery) = self.delivery.as_ref() else {
            debug!("delivery disabled, dispatch run skipped");
            return Ok(RunReport::default());
        };

        let cutoff = now - Duration::seconds(self.config.claim_timeout_secs as i64);
        let swept = self.store.sweep_expired_claims(cutoff).await?;
        if swept > 0 {
            warn!(swept, "abandoned claims failed before this run");
        }

        let claimed = self.store.claim_due(now, self.config.batch_limit).await?;
        if claimed.is_empty() {
            return Ok(RunReport {
                swept,
                ..RunReport::default()
            });
        }
        debug!(claimed = claimed.len(), "processing due messages");

        let report = stream::iter(claimed)
            .map(|message| self.process_message(delivery, message))
            .buffer_unordered(self.config.max_concurrency.max(1))
            .fold(
                RunReport {
                    swept,
                    ..RunReport::default()
                },
                |mut report, outcome| async move {
                    match outcome {
                        DispatchOutcome::Sent => report.sent += 1,
                        DispatchOutcome::Failed => report.failed += 1,
                        DispatchOutcome::Cancelled => report.cancelled += 1,
                    }
                    report
                },
            )
            .await;

        Ok(report)
    }

    /// Processes one claimed message to a terminal state.
    ///
    /// Never returns an error: each message is independent, and whatever
    /// goes wrong is recorded against that row alone.
    async fn process_message(
        &self,
        delivery: &Arc<dyn DeliveryAdapter>,
        message: QueuedMessage,
    ) -> DispatchOutcome {
        // Opt-out wins over a stale queue entry: re-check the flag
        // between claim and send. A vanished traveler row also suppresses
        // the send, since consent can no longer be verified.
        let suppress = match self.store.get_traveler(&message.traveler_id).await {
            Ok(Some(traveler)) => traveler.whatsapp_opt_out,
            Ok(None) => true,
            Err(e) => {
                error!(
                    message_id = message.id,
                    error = %e,
                    "traveler re-check failed, leaving the claim for the sweep"
                );
                return DispatchOutcome::Failed;
            }
        };

        if suppress {
            match self.store.cancel_message(message.id).await {
                Ok(true) => {
                    debug!(message_id = message.id, "cancelled at dispatch, traveler opted out");
                }
                Ok(false) => {
                    warn!(message_id = message.id, "claimed row was no longer cancellable");
                }
                Err(e) => error!(message_id = message.id, error = %e, "cancel failed"),
            }
            return DispatchOutcome::Cancelled;
        }

        let request = DeliveryRequest {
            phone: message.phone.clone(),
            message: message.body.clone(),
            image_url: message.image_url.clone(),
        };

        match delivery.deliver(&request).await {
            Ok(receipt) => {
                match self
                    .store
                    .mark_sent(message.id, &receipt.provider_message_id)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => warn!(
                        message_id = message.id,
                        "delivered message was no longer claimed when marking sent"
                    ),
                    Err(e) => error!(
                        message_id = message.id,
                        error = %e,
                        "delivered but failed to record the sent state"
                    ),
                }
                DispatchOutcome::Sent
            }
            Err(e) => {
                // No retry: any delivery failure is terminal for the row.
                let reason = e.to_string();
                match self.store.mark_failed(message.id, &reason).await {
                    Ok(true) => debug!(message_id = message.id, reason = %reason, "message failed"),
                    Ok(false) => warn!(
                        message_id = message.id,
                        "failed message was no longer claimed when marking failed"
                    ),
                    Err(store_err) => error!(
                        message_id = message.id,
                        error = %store_err,
                        "failed to record the failed state"
                    ),
                }
                DispatchOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sendero_core::QueueState;
    use sendero_test_utils::fixtures;
    use sendero_test_utils::TestHarness;

    /// Inserts agency, traveler, one template row, and one due queue row.
    async fn seed_one_due_message(harness: &TestHarness) -> i64 {
        harness.store.insert_agency(&fixtures::agency("ag-1")).await.unwrap();
        let traveler = fixtures::traveler("tr-1", "ag-1", "98-7654-3210");
        harness.store.insert_traveler(&traveler).await.unwrap();
        harness
            .store
            .insert_template(&fixtures::template("day-1", 1, "Hello {{traveler_name}}"))
            .await
            .unwrap();

        let message = fixtures::queued_message("tr-1", "day-1", "98-7654-3210");
        harness
            .store
            .enqueue_if_absent(&message)
            .await
            .unwrap()
            .expect("row should be new")
    }

    fn due_now() -> DateTime<Utc> {
        // Later than the fixture's scheduled_for.
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn disabled_delivery_skips_the_run_entirely() {
        let harness = TestHarness::builder().build().await.unwrap();
        seed_one_due_message(&harness).await;

        let dispatcher = Dispatcher::new(harness.store.clone(), None, harness.dispatcher.clone());
        let report = dispatcher.run_once(due_now()).await.unwrap();

        assert!(report.is_empty());
        // The queue was not touched, not even claimed.
        assert_eq!(harness.store.queue_counts().await.unwrap().pending, 1);
    }

    #[tokio::test]
    async fn due_message_is_sent_and_recorded() {
        let harness = TestHarness::builder().build().await.unwrap();
        let id = seed_one_due_message(&harness).await;

        let dispatcher = Dispatcher::new(
            harness.store.clone(),
            Some(harness.delivery.clone()),
            harness.dispatcher.clone(),
        );
        let report = dispatcher.run_once(due_now()).await.unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(report.processed(), 1);

        let row = harness.store.get_queued_message(id).await.unwrap().unwrap();
        assert_eq!(row.state, QueueState::Sent);
        assert!(row.provider_message_id.is_some());

        let sent = harness.delivery.sent_requests().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].phone, "98-7654-3210");
        assert!(sent[0].message.starts_with("Hello"));
    }

    #[tokio::test]
    async fn not_yet_due_rows_stay_pending() {
        let harness = TestHarness::builder().build().await.unwrap();
        seed_one_due_message(&harness).await;

        let dispatcher = Dispatcher::new(
            harness.store.clone(),
            Some(harness.delivery.clone()),
            harness.dispatcher.clone(),
        );
        // A moment before the fixture's scheduled_for.
        let early = Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).unwrap();
        let report = dispatcher.run_once(early).await.unwrap();

        assert!(report.is_empty());
        assert_eq!(harness.delivery.sent_count().await, 0);
        assert_eq!(harness.store.queue_counts().await.unwrap().pending, 1);
    }

    #[tokio::test]
    async fn delivery_failure_is_terminal() {
        let harness = TestHarness::builder().build().await.unwrap();
        let id = seed_one_due_message(&harness).await;
        harness
            .delivery
            .script_failure(SenderoError::ProviderRejected {
                body: "no credit".into(),
            })
            .await;

        let dispatcher = Dispatcher::new(
            harness.store.clone(),
            Some(harness.delivery.clone()),
            harness.dispatcher.clone(),
        );
        let report = dispatcher.run_once(due_now()).await.unwrap();
        assert_eq!(report.failed, 1);

        let row = harness.store.get_queued_message(id).await.unwrap().unwrap();
        assert_eq!(row.state, QueueState::Failed);
        assert!(row.failure_reason.unwrap().contains("no credit"));

        // A later run finds nothing: failed rows are never retried.
        let again = dispatcher.run_once(due_now()).await.unwrap();
        assert!(again.is_empty());
        assert_eq!(harness.delivery.sent_count().await, 1);
    }

    #[tokio::test]
    async fn opt_out_set_after_scheduling_cancels_at_dispatch() {
        let harness = TestHarness::builder().build().await.unwrap();
        let id = seed_one_due_message(&harness).await;
        // The flag lands after the row was queued; the queue row itself
        // is stale.
        harness
            .store
            .flag_opt_out("9876543210", due_now())
            .await
            .unwrap();

        let dispatcher = Dispatcher::new(
            harness.store.clone(),
            Some(harness.delivery.clone()),
            harness.dispatcher.clone(),
        );
        let report = dispatcher.run_once(due_now()).await.unwrap();

        assert_eq!(report.cancelled, 1);
        assert_eq!(report.sent, 0);
        assert_eq!(harness.delivery.sent_count().await, 0);

        let row = harness.store.get_queued_message(id).await.unwrap().unwrap();
        assert_eq!(row.state, QueueState::Cancelled);
    }

    #[tokio::test]
    async fn batch_limit_bounds_each_run() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.store.insert_agency(&fixtures::agency("ag-1")).await.unwrap();
        let traveler = fixtures::traveler("tr-1", "ag-1", "98-7654-3210");
        harness.store.insert_traveler(&traveler).await.unwrap();
        for (template_id, day) in [("day-1", 1), ("day-2", 2), ("day-3", 3)] {
            harness
                .store
                .insert_template(&fixtures::template(template_id, day, "Hello"))
                .await
                .unwrap();
            let message = fixtures::queued_message("tr-1", template_id, "98-7654-3210");
            harness.store.enqueue_if_absent(&message).await.unwrap();
        }

        let mut config = harness.dispatcher.clone();
        config.batch_limit = 2;
        let dispatcher = Dispatcher::new(
            harness.store.clone(),
            Some(harness.delivery.clone()),
            config,
        );

        let first = dispatcher.run_once(due_now()).await.unwrap();
        assert_eq!(first.sent, 2);
        assert_eq!(harness.store.queue_counts().await.unwrap().pending, 1);

        let second = dispatcher.run_once(due_now()).await.unwrap();
        assert_eq!(second.sent, 1);
        assert_eq!(harness.store.queue_counts().await.unwrap().sent, 3);
    }

    #[tokio::test]
    async fn abandoned_claims_are_swept_not_resent() {
        let harness = TestHarness::builder().build().await.unwrap();
        let id = seed_one_due_message(&harness).await;

        // A previous run claimed the row and crashed before recording an
        // outcome.
        let crash_time = due_now();
        let claimed = harness.store.claim_due(crash_time, 10).await.unwrap();
        assert_eq!(claimed.len(), 1);

        let dispatcher = Dispatcher::new(
            harness.store.clone(),
            Some(harness.delivery.clone()),
            harness.dispatcher.clone(),
        );
        // Well past the claim timeout.
        let later = crash_time + Duration::seconds(harness.dispatcher.claim_timeout_secs as i64 + 60);
        let report = dispatcher.run_once(later).await.unwrap();

        assert_eq!(report.swept, 1);
        assert_eq!(report.sent, 0);
        assert_eq!(harness.delivery.sent_count().await, 0);

        let row = harness.store.get_queued_message(id).await.unwrap().unwrap();
        assert_eq!(row.state, QueueState::Failed);
        assert_eq!(row.failure_reason.as_deref(), Some("claim expired"));
    }

    #[tokio::test]
    async fn run_loop_stops_on_cancellation() {
        let harness = TestHarness::builder().build().await.unwrap();
        let dispatcher = Arc::new(Dispatcher::new(
            harness.store.clone(),
            Some(harness.delivery.clone()),
            harness.dispatcher.clone(),
        ));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn({
            let dispatcher = dispatcher.clone();
            let cancel = cancel.clone();
            async move { dispatcher.run(cancel).await }
        });

        cancel.cancel();
        tokio::time::timeout(StdDuration::from_secs(5), handle)
            .await
            .expect("loop should stop promptly")
            .unwrap();
    }
}
