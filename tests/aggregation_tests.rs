// Aggregation rules: counts, per-repository sums and average age, blobstore ratios

use chrono::{DateTime, Duration, TimeZone, Utc};
use nexus_exporter::aggregation::{BlobstoreStats, aggregate, usage_percent};
use nexus_exporter::config::RepositorySizePolicy;
use nexus_exporter::models::*;

fn poll_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn repo(name: &str) -> Repository {
    Repository { name: name.into() }
}

fn asset(repository: &str, size: f64, days_ago: Option<i64>) -> Asset {
    Asset {
        repository: repository.into(),
        size,
        last_downloaded: days_ago.map(|d| poll_time() - Duration::days(d)),
    }
}

fn blobstore(name: &str, total: f64, used: f64, items: f64) -> Blobstore {
    Blobstore {
        name: name.into(),
        capacity: Some(BlobstoreCapacity {
            total_bytes: total,
            used_bytes: used,
            item_count: items,
        }),
    }
}

#[test]
fn counts_come_from_listings() {
    let out = aggregate(
        &[repo("a"), repo("b"), repo("c")],
        &[blobstore("default", 1.0, 0.0, 0.0)],
        &[],
        poll_time(),
        RepositorySizePolicy::Observed,
    );
    assert_eq!(out.repository_count, 3);
    assert_eq!(out.blobstore_count, 1);
}

#[test]
fn repositories_without_assets_emit_nothing_when_observed() {
    let out = aggregate(
        &[repo("releases"), repo("snapshots")],
        &[],
        &[],
        poll_time(),
        RepositorySizePolicy::Observed,
    );
    assert_eq!(out.repository_count, 2);
    assert!(out.repositories.is_empty());
}

#[test]
fn repositories_without_assets_are_zero_filled_when_configured() {
    let out = aggregate(
        &[repo("releases"), repo("snapshots")],
        &[],
        &[],
        poll_time(),
        RepositorySizePolicy::ZeroFill,
    );
    assert_eq!(out.repository_count, 2);
    assert_eq!(out.repositories.len(), 2);
    for stats in out.repositories.values() {
        assert_eq!(stats.size_bytes, 0.0);
        assert_eq!(stats.asset_count, 0);
        assert!(stats.avg_download_age_days.is_none());
    }
}

#[test]
fn sizes_are_summed_per_repository_and_unknown_repositories_ignored() {
    let assets = vec![
        asset("releases", 100.0, None),
        asset("releases", 250.0, None),
        asset("snapshots", 40.0, None),
        asset("not-listed", 9999.0, None),
    ];
    let out = aggregate(
        &[repo("releases"), repo("snapshots"), repo("empty")],
        &[],
        &assets,
        poll_time(),
        RepositorySizePolicy::Observed,
    );

    assert_eq!(out.repositories["releases"].size_bytes, 350.0);
    assert_eq!(out.repositories["releases"].asset_count, 2);
    assert_eq!(out.repositories["snapshots"].size_bytes, 40.0);
    assert!(!out.repositories.contains_key("not-listed"));
    assert!(!out.repositories.contains_key("empty"));

    let published: f64 = out.repositories.values().map(|s| s.size_bytes).sum();
    let total: f64 = assets.iter().map(|a| a.size).sum();
    assert!(published <= total);
}

#[test]
fn size_sum_equals_asset_total_when_every_repository_is_known() {
    let assets = vec![
        asset("a", 1.5, None),
        asset("b", 2.5, Some(1)),
        asset("a", 3.0, Some(2)),
    ];
    let out = aggregate(
        &[repo("a"), repo("b")],
        &[],
        &assets,
        poll_time(),
        RepositorySizePolicy::Observed,
    );
    let published: f64 = out.repositories.values().map(|s| s.size_bytes).sum();
    assert_eq!(published, 7.0);
}

#[test]
fn average_age_uses_only_assets_with_timestamps() {
    let assets = vec![
        asset("releases", 1.0, Some(10)),
        asset("releases", 1.0, Some(2)),
        asset("releases", 1.0, None),
    ];
    let out = aggregate(
        &[repo("releases")],
        &[],
        &assets,
        poll_time(),
        RepositorySizePolicy::Observed,
    );
    let stats = &out.repositories["releases"];
    assert_eq!(stats.avg_download_age_days, Some(6.0));
    assert_eq!(stats.asset_count, 3);
    assert_eq!(stats.size_bytes, 3.0);
}

#[test]
fn average_age_counts_fractional_days() {
    let mut recent = asset("r", 0.0, None);
    recent.last_downloaded = Some(poll_time() - Duration::hours(12));
    let out = aggregate(
        &[repo("r")],
        &[],
        &[recent],
        poll_time(),
        RepositorySizePolicy::Observed,
    );
    assert_eq!(out.repositories["r"].avg_download_age_days, Some(0.5));
}

#[test]
fn average_age_absent_when_nothing_was_downloaded() {
    let out = aggregate(
        &[repo("releases")],
        &[],
        &[asset("releases", 5.0, None), asset("releases", 6.0, None)],
        poll_time(),
        RepositorySizePolicy::Observed,
    );
    let stats = &out.repositories["releases"];
    assert_eq!(stats.size_bytes, 11.0);
    assert!(stats.avg_download_age_days.is_none());
}

#[test]
fn blobstore_full_store_scenario() {
    let summary = BlobstoreSummary {
        name: "default".into(),
        total_size_in_bytes: 1000.0,
        available_space_in_bytes: 0.0,
        blob_count: 10.0,
    };
    let out = aggregate(
        &[],
        &[summary.with_inline_capacity()],
        &[],
        poll_time(),
        RepositorySizePolicy::Observed,
    );
    assert_eq!(
        out.blobstores["default"],
        BlobstoreStats {
            size_bytes: 1000.0,
            used_bytes: 1000.0,
            usage_percent: 100.0,
            file_count: 10.0,
        }
    );
}

#[test]
fn blobstore_with_zero_capacity_reports_zero_usage() {
    let out = aggregate(
        &[],
        &[blobstore("empty", 0.0, 0.0, 0.0)],
        &[],
        poll_time(),
        RepositorySizePolicy::Observed,
    );
    let stats = out.blobstores["empty"];
    assert_eq!(stats.usage_percent, 0.0);
    assert!(!stats.usage_percent.is_nan());
}

#[test]
fn blobstore_without_capacity_is_counted_but_not_reported() {
    let out = aggregate(
        &[],
        &[
            blobstore("default", 200.0, 50.0, 4.0),
            Blobstore {
                name: "archive".into(),
                capacity: None,
            },
        ],
        &[],
        poll_time(),
        RepositorySizePolicy::Observed,
    );
    assert_eq!(out.blobstore_count, 2);
    assert_eq!(out.blobstores.len(), 1);
    assert_eq!(out.blobstores["default"].usage_percent, 25.0);
    assert!(!out.blobstores.contains_key("archive"));
}

#[test]
fn usage_percent_stays_within_bounds() {
    assert_eq!(usage_percent(0.0, 0.0), 0.0);
    assert_eq!(usage_percent(10.0, 0.0), 0.0);
    assert_eq!(usage_percent(10.0, -5.0), 0.0);
    assert_eq!(usage_percent(0.0, 10.0), 0.0);
    assert_eq!(usage_percent(5.0, 10.0), 50.0);
    assert_eq!(usage_percent(15.0, 10.0), 100.0);
    for used in [0.0, 1.0, 333.0, 999.0, 1000.0] {
        let pct = usage_percent(used, 1000.0);
        assert!((0.0..=100.0).contains(&pct), "{pct} out of range");
    }
}
