// Published gauges. The poll cycle is the only writer; /metrics scrapes are readers.
// Each publish builds a fresh registry and swaps it in whole, so a scrape never sees
// two cycles mixed together, and a failed cycle simply leaves the last one in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use tokio::sync::RwLock;

use crate::aggregation::MetricSet;

/// One cycle's worth of published state.
#[derive(Default)]
pub struct Published {
    pub metrics: MetricSet,
    pub registry: Registry,
    /// Poll time of the cycle; `None` before the first successful cycle.
    pub at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct MetricsStore {
    current: RwLock<Arc<Published>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces everything previously published.
    pub async fn publish(&self, metrics: MetricSet, at: DateTime<Utc>) -> prometheus::Result<()> {
        let registry = build_registry(&metrics)?;
        let next = Arc::new(Published {
            metrics,
            registry,
            at: Some(at),
        });
        *self.current.write().await = next;
        Ok(())
    }

    pub async fn current(&self) -> Arc<Published> {
        self.current.read().await.clone()
    }

    /// Prometheus text exposition of the last published cycle (empty before the first).
    pub async fn render(&self) -> prometheus::Result<String> {
        let published = self.current().await;
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&published.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn gauge(registry: &Registry, name: &str, help: &str, value: f64) -> prometheus::Result<()> {
    let g = Gauge::with_opts(Opts::new(name, help))?;
    g.set(value);
    registry.register(Box::new(g))
}

fn gauge_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    label: &str,
) -> prometheus::Result<GaugeVec> {
    let g = GaugeVec::new(Opts::new(name, help), &[label])?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn build_registry(m: &MetricSet) -> prometheus::Result<Registry> {
    let registry = Registry::new();

    gauge(
        &registry,
        "nexus_repositories_count",
        "Total number of repositories",
        m.repository_count as f64,
    )?;
    gauge(
        &registry,
        "nexus_blobstores_count",
        "Total number of blobstores",
        m.blobstore_count as f64,
    )?;

    let repo_size = gauge_vec(
        &registry,
        "nexus_repositories_size_bytes",
        "Total size of repository assets in bytes",
        "repository",
    )?;
    let repo_assets = gauge_vec(
        &registry,
        "nexus_repositories_assets_count",
        "Number of assets in repository",
        "repository",
    )?;
    let repo_age = gauge_vec(
        &registry,
        "nexus_repositories_last_download_age_days",
        "Average days since last download over assets that were downloaded",
        "repository",
    )?;
    for (name, stats) in &m.repositories {
        repo_size.with_label_values(&[name.as_str()]).set(stats.size_bytes);
        repo_assets
            .with_label_values(&[name.as_str()])
            .set(stats.asset_count as f64);
        if let Some(age) = stats.avg_download_age_days {
            repo_age.with_label_values(&[name.as_str()]).set(age);
        }
    }

    let bs_size = gauge_vec(
        &registry,
        "nexus_blobstores_size_bytes",
        "Size of blobstore in bytes",
        "name",
    )?;
    let bs_used = gauge_vec(
        &registry,
        "nexus_blobstores_used_space_bytes",
        "Used space of blobstore in bytes",
        "name",
    )?;
    let bs_usage = gauge_vec(
        &registry,
        "nexus_blobstores_usage_percent",
        "Usage of blobstore in percent",
        "name",
    )?;
    let bs_files = gauge_vec(
        &registry,
        "nexus_blobstores_file_count",
        "Number of files stored in each blobstore",
        "name",
    )?;
    for (name, stats) in &m.blobstores {
        bs_size.with_label_values(&[name.as_str()]).set(stats.size_bytes);
        bs_used.with_label_values(&[name.as_str()]).set(stats.used_bytes);
        bs_usage.with_label_values(&[name.as_str()]).set(stats.usage_percent);
        bs_files.with_label_values(&[name.as_str()]).set(stats.file_count);
    }

    Ok(registry)
}
