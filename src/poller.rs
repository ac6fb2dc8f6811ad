// Background poll loop: fetch -> aggregate -> publish on a fixed interval.
// A failed cycle is logged and leaves the previously published gauges untouched.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use futures_util::{StreamExt, stream};
use tokio::time::{Duration, Instant, interval};
use tracing::{Instrument, instrument};

use crate::aggregation;
use crate::config::{CapacitySource, NexusConfig};
use crate::error::CollectError;
use crate::metrics_store::MetricsStore;
use crate::models::{Blobstore, BlobstoreSummary};
use crate::nexus_client::NexusClient;

/// Cycle outcome counters, shared with the /health route.
#[derive(Debug, Default)]
pub struct PollStats {
    pub cycles_ok: AtomicU64,
    pub cycles_failed: AtomicU64,
}

/// What one successful cycle saw.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSummary {
    pub repositories: usize,
    pub blobstores: usize,
    /// Blobstores whose capacity lookup failed and were left out of the per-name gauges.
    pub skipped_blobstores: usize,
    pub assets: usize,
    pub pages: usize,
    pub duration: Duration,
}

/// Store, stats and shutdown for the poller.
pub struct PollerDeps {
    pub nexus: NexusConfig,
    pub store: Arc<MetricsStore>,
    pub stats: Arc<PollStats>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

pub struct PollerConfig {
    pub interval_secs: u64,
    /// How often to log exporter stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Runs one full fetch-aggregate-publish pass.
///
/// Repository listing, blobstore listing and asset pagination are prerequisites: any of
/// them failing aborts the cycle before anything is published.
#[instrument(skip_all, fields(capacity_source = ?nexus.capacity_source))]
pub async fn run_cycle(
    nexus: &NexusConfig,
    store: &MetricsStore,
) -> Result<CycleSummary, CollectError> {
    let started = Instant::now();
    let credentials = nexus.credentials()?;
    let client = NexusClient::new(credentials, Duration::from_secs(nexus.request_timeout_secs))?;

    let repositories = client.list_repositories().await?;
    let listing = client.list_blobstores().await?;
    let blobstores = resolve_capacity(
        &client,
        listing,
        nexus.capacity_source,
        nexus.capacity_concurrency,
    )
    .await;
    let assets = client.collect_all_assets().await?;

    let poll_time = Utc::now();
    let metrics = aggregation::aggregate(
        &repositories,
        &blobstores,
        &assets.items,
        poll_time,
        nexus.repository_size_policy,
    );
    store.publish(metrics, poll_time).await?;

    Ok(CycleSummary {
        repositories: repositories.len(),
        blobstores: blobstores.len(),
        skipped_blobstores: blobstores.iter().filter(|b| b.capacity.is_none()).count(),
        assets: assets.items.len(),
        pages: assets.pages,
        duration: started.elapsed(),
    })
}

/// Attaches capacity to each listed blobstore. With [`CapacitySource::Endpoint`] the
/// lookups run up to `concurrency` at a time; a failed lookup is logged and that
/// blobstore keeps `capacity: None`. Listing order is preserved.
pub async fn resolve_capacity(
    client: &NexusClient,
    listing: Vec<BlobstoreSummary>,
    source: CapacitySource,
    concurrency: usize,
) -> Vec<Blobstore> {
    match source {
        CapacitySource::Inline => listing
            .into_iter()
            .map(BlobstoreSummary::with_inline_capacity)
            .collect(),
        CapacitySource::Endpoint => {
            stream::iter(listing)
                .map(|summary| async move {
                    let capacity = match client.blobstore_capacity(&summary.name).await {
                        Ok(c) => Some(c),
                        Err(e) => {
                            tracing::warn!(
                                blobstore = %summary.name,
                                error = %e,
                                operation = "blobstore_capacity",
                                "capacity lookup failed; skipping blobstore"
                            );
                            None
                        }
                    };
                    Blobstore {
                        name: summary.name,
                        capacity,
                    }
                })
                .buffered(concurrency.max(1))
                .collect()
                .await
        }
    }
}

pub fn spawn(deps: PollerDeps, config: PollerConfig) -> tokio::task::JoinHandle<()> {
    let PollerDeps {
        nexus,
        store,
        stats,
        mut shutdown_rx,
    } = deps;
    let PollerConfig {
        interval_secs,
        stats_log_interval_secs,
    } = config;

    let span = tracing::span!(tracing::Level::DEBUG, "poller", interval_secs);
    tokio::spawn(
        async move {
            let mut tick = interval(Duration::from_secs(interval_secs));
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
            stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        // Shutdown is not held up by the remaining pages of a long cycle.
                        let result = tokio::select! {
                            result = run_cycle(&nexus, &store) => result,
                            _ = &mut shutdown_rx => {
                                tracing::debug!("Poller shutting down mid-cycle");
                                break;
                            }
                        };
                        match result {
                            Ok(summary) => {
                                stats.cycles_ok.fetch_add(1, Ordering::Relaxed);
                                tracing::info!(
                                    repositories = summary.repositories,
                                    blobstores = summary.blobstores,
                                    skipped_blobstores = summary.skipped_blobstores,
                                    assets = summary.assets,
                                    pages = summary.pages,
                                    duration_ms = summary.duration.as_millis() as u64,
                                    "poll cycle complete"
                                );
                            }
                            Err(e @ CollectError::ConfigurationMissing(_)) => {
                                stats.cycles_failed.fetch_add(1, Ordering::Relaxed);
                                tracing::warn!(error = %e, "poll cycle skipped");
                            }
                            Err(e) => {
                                stats.cycles_failed.fetch_add(1, Ordering::Relaxed);
                                tracing::warn!(
                                    error = %e,
                                    transport = e.is_transport(),
                                    "poll cycle failed; keeping previous metrics"
                                );
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Poller shutting down");
                        break;
                    }
                    _ = stats_log_tick.tick() => {
                        tracing::info!(
                            cycles_ok = stats.cycles_ok.load(Ordering::Relaxed),
                            cycles_failed = stats.cycles_failed.load(Ordering::Relaxed),
                            "exporter stats"
                        );
                    }
                }
            }
        }
        .instrument(span),
    )
}
