//! Discovery → enrichment → scoring → dispatch, repeated forever.
//!
//! Cycles never overlap. After each cycle the loop sleeps a fixed interval
//! (fixed delay between cycle ends, not fixed rate). Shutdown is observed
//! during the sleep only; an in-flight cycle always runs to completion.

use crate::alert::{AlertDispatcher, AlertTransport, DispatchOutcome};
use crate::config::Config;
use crate::deduplication::DedupStore;
use crate::discovery::Discovery;
use crate::enrichment::EnrichmentClient;
use crate::scoring::Scorer;
use crate::sources::{CandidateSource, SourceAdapter};
use crate::types::{CycleReport, SchedulerState};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Snapshot served by the status endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub cycles_completed: u64,
    pub identifiers_alerted: usize,
    pub alerts_sent: u64,
    pub last_cycle: Option<CycleReport>,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

pub type SharedStatus = Arc<RwLock<SchedulerStatus>>;

pub struct Scheduler {
    discovery: Discovery,
    enrichment: EnrichmentClient,
    scorer: Scorer,
    dispatcher: AlertDispatcher,
    dedup: DedupStore,
    poll_interval: Duration,
    status: SharedStatus,
}

impl Scheduler {
    pub fn new(
        discovery: Discovery,
        enrichment: EnrichmentClient,
        scorer: Scorer,
        dispatcher: AlertDispatcher,
        poll_interval: Duration,
    ) -> Self {
        Self {
            discovery,
            enrichment,
            scorer,
            dispatcher,
            dedup: DedupStore::new(),
            poll_interval,
            status: SharedStatus::default(),
        }
    }

    pub fn from_config(config: &Config, client: Client, transport: Arc<dyn AlertTransport>) -> Self {
        let adapters = config
            .sources
            .iter()
            .cloned()
            .map(|source| {
                Box::new(SourceAdapter::new(client.clone(), source, &config.chain_namespace))
                    as Box<dyn CandidateSource>
            })
            .collect();
        let enrichment = EnrichmentClient::new(
            client,
            &config.enrichment_base_url,
            &config.chain_namespace,
            &config.default_link,
        )
        .with_batch_size(config.batch_size)
        .with_concurrency(config.enrichment_concurrency);

        Self::new(
            Discovery::new(adapters),
            enrichment,
            config.scorer,
            AlertDispatcher::new(transport, config.alert_webhook_url.clone()),
            config.poll_interval,
        )
    }

    pub fn status(&self) -> SharedStatus {
        Arc::clone(&self.status)
    }

    pub fn dedup(&self) -> &DedupStore {
        &self.dedup
    }

    /// Runs until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            "[Scheduler] Starting: {} source(s), batch size {}, policy {}, interval {}s",
            self.discovery.source_count(),
            self.enrichment.batch_size(),
            self.scorer.policy.name(),
            self.poll_interval.as_secs()
        );

        while !shutdown.is_cancelled() {
            self.set_state(SchedulerState::CycleRunning).await;
            let report = self.run_cycle().await;
            self.record_cycle(report).await;

            self.set_state(SchedulerState::Sleeping).await;
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        self.set_state(SchedulerState::Stopped).await;
        info!("[Scheduler] Stopped after {} alerted identifier(s)", self.dedup.len());
    }

    /// One full pass. Identifiers are marked alerted before the send, so a
    /// failed send is never retried.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let started = Instant::now();

        let candidates = self.discovery.discover(&self.dedup).await;
        let records = self.enrichment.enrich(&candidates).await;

        let mut report = CycleReport {
            discovered: candidates.len(),
            enriched: records.len(),
            ..Default::default()
        };

        for record in &records {
            // Pair lists repeat the same base token; the first alert wins.
            if self.dedup.contains(&record.identifier) {
                continue;
            }
            let verdict = self.scorer.score(record);
            if !verdict.triggered {
                continue;
            }

            report.triggered += 1;
            self.dedup.mark_alerted(&record.identifier);
            match self.dispatcher.dispatch(&verdict).await {
                DispatchOutcome::Sent => report.dispatched += 1,
                DispatchOutcome::Failed => report.failed += 1,
                DispatchOutcome::Unresolved => report.unresolved += 1,
                DispatchOutcome::Skipped => {}
            }
        }

        report.duration = started.elapsed();
        info!(
            "[Scheduler] Cycle done in {:.1}s: {} discovered, {} enriched, {} triggered, {} sent, {} failed, {} unresolved",
            report.duration.as_secs_f64(),
            report.discovered,
            report.enriched,
            report.triggered,
            report.dispatched,
            report.failed,
            report.unresolved
        );
        report
    }

    async fn set_state(&self, state: SchedulerState) {
        self.status.write().await.state = state;
    }

    async fn record_cycle(&self, report: CycleReport) {
        let mut status = self.status.write().await;
        status.cycles_completed += 1;
        status.identifiers_alerted = self.dedup.len();
        status.alerts_sent += report.dispatched as u64;
        status.last_cycle = Some(report);
        status.last_cycle_at = Some(Utc::now());
    }
}
