// Pure aggregation: one cycle's listings + assets -> the full metric set.
// No I/O; poll time is passed in so results are reproducible.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::config::RepositorySizePolicy;
use crate::models::{Asset, Blobstore, BlobstoreCapacity, Repository};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Everything published for one poll cycle. Rebuilt from scratch every time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSet {
    pub repository_count: usize,
    pub blobstore_count: usize,
    pub repositories: BTreeMap<String, RepositoryStats>,
    pub blobstores: BTreeMap<String, BlobstoreStats>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryStats {
    pub size_bytes: f64,
    pub asset_count: u64,
    /// Mean days since `lastDownloaded`; `None` when no asset has a timestamp.
    pub avg_download_age_days: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlobstoreStats {
    pub size_bytes: f64,
    pub used_bytes: f64,
    pub usage_percent: f64,
    pub file_count: f64,
}

impl BlobstoreStats {
    pub fn from_capacity(c: &BlobstoreCapacity) -> Self {
        Self {
            size_bytes: c.total_bytes,
            used_bytes: c.used_bytes,
            usage_percent: usage_percent(c.used_bytes, c.total_bytes),
            file_count: c.item_count,
        }
    }
}

/// `used / total * 100`, clamped to 0..=100; 0 when total is zero, negative or NaN.
pub fn usage_percent(used: f64, total: f64) -> f64 {
    if total > 0.0 {
        (used / total * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Running sums for one repository.
#[derive(Debug, Default)]
struct RepositoryAccumulator {
    size_sum: f64,
    asset_count: u64,
    age_days_sum: f64,
    age_samples: u64,
}

impl RepositoryAccumulator {
    fn add(&mut self, asset: &Asset, poll_time: DateTime<Utc>) {
        self.size_sum += asset.size;
        self.asset_count += 1;
        if let Some(ts) = asset.last_downloaded {
            self.age_days_sum += (poll_time - ts).num_milliseconds() as f64 / MS_PER_DAY;
            self.age_samples += 1;
        }
    }

    fn finish(self) -> RepositoryStats {
        RepositoryStats {
            size_bytes: self.size_sum,
            asset_count: self.asset_count,
            avg_download_age_days: (self.age_samples > 0)
                .then(|| self.age_days_sum / self.age_samples as f64),
        }
    }
}

/// Builds the metric set for one cycle.
///
/// Assets whose repository is not in `repositories` are ignored. Blobstores without
/// capacity count toward `blobstore_count` only. With [`RepositorySizePolicy::Observed`]
/// a repository gets stats only if at least one asset refers to it; with
/// [`RepositorySizePolicy::ZeroFill`] every listed repository does.
pub fn aggregate(
    repositories: &[Repository],
    blobstores: &[Blobstore],
    assets: &[Asset],
    poll_time: DateTime<Utc>,
    policy: RepositorySizePolicy,
) -> MetricSet {
    let mut accumulators: HashMap<&str, Option<RepositoryAccumulator>> = repositories
        .iter()
        .map(|r| (r.name.as_str(), None))
        .collect();

    for asset in assets {
        if let Some(slot) = accumulators.get_mut(asset.repository.as_str()) {
            slot.get_or_insert_with(RepositoryAccumulator::default)
                .add(asset, poll_time);
        }
    }

    let repository_stats = accumulators
        .into_iter()
        .filter_map(|(name, acc)| {
            let acc = match (acc, policy) {
                (Some(acc), _) => acc,
                (None, RepositorySizePolicy::ZeroFill) => RepositoryAccumulator::default(),
                (None, RepositorySizePolicy::Observed) => return None,
            };
            Some((name.to_string(), acc.finish()))
        })
        .collect();

    let blobstore_stats = blobstores
        .iter()
        .filter_map(|b| {
            b.capacity
                .as_ref()
                .map(|c| (b.name.clone(), BlobstoreStats::from_capacity(c)))
        })
        .collect();

    MetricSet {
        repository_count: repositories.len(),
        blobstore_count: blobstores.len(),
        repositories: repository_stats,
        blobstores: blobstore_stats,
    }
}
