//! Write-only sinks for per-cycle artifacts (spec §6). Paths and
//! atomic-replace discipline only; no algorithmic content here.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

use vigil_core::Record;
use vigil_dedup::DedupStats;
use vigil_quality::QualityReport;

#[derive(Debug, Serialize)]
struct SnapshotMetadata<'a> {
    source: &'a str,
    timestamp: DateTime<Utc>,
    total_items: usize,
    quality_score: f64,
    quality_metrics: &'a vigil_quality::QualityMetrics,
}

#[derive(Debug, Serialize)]
struct Snapshot<'a> {
    metadata: SnapshotMetadata<'a>,
    items: &'a [Record],
}

#[derive(Debug, Serialize)]
struct QualityReportArtifact<'a> {
    #[serde(flatten)]
    report: &'a QualityReport,
    deduplication_stats: &'a DedupStats,
}

fn timestamped_file_name(source: &str, timestamp: DateTime<Utc>, suffix: &str) -> String {
    format!("{source}_{}{suffix}", timestamp.format("%Y%m%d_%H%M%S"))
}

pub fn snapshot_path(data_dir: &Path, source: &str, timestamp: DateTime<Utc>) -> PathBuf {
    data_dir
        .join("processed")
        .join(source)
        .join(timestamped_file_name(source, timestamp, ".json"))
}

pub fn quality_report_path(data_dir: &Path, source: &str, timestamp: DateTime<Utc>) -> PathBuf {
    data_dir
        .join("quality_reports")
        .join(timestamped_file_name(source, timestamp, ".json"))
}

pub fn quality_history_path(data_dir: &Path) -> PathBuf {
    data_dir.join("quality_history.json")
}

pub fn write_snapshot(
    data_dir: &Path,
    source: &str,
    timestamp: DateTime<Utc>,
    items: &[Record],
    quality: &vigil_quality::QualityMetrics,
) -> std::io::Result<PathBuf> {
    let path = snapshot_path(data_dir, source, timestamp);
    let snapshot = Snapshot {
        metadata: SnapshotMetadata {
            source,
            timestamp,
            total_items: items.len(),
            quality_score: quality.overall,
            quality_metrics: quality,
        },
        items,
    };
    atomic_write_json(&path, &snapshot)?;
    Ok(path)
}

pub fn write_quality_report(
    data_dir: &Path,
    source: &str,
    timestamp: DateTime<Utc>,
    report: &QualityReport,
    dedup_stats: &DedupStats,
) -> std::io::Result<PathBuf> {
    let path = quality_report_path(data_dir, source, timestamp);
    let artifact = QualityReportArtifact {
        report,
        deduplication_stats: dedup_stats,
    };
    atomic_write_json(&path, &artifact)?;
    Ok(path)
}

fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    atomic_write(path, &bytes)
}

fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid file name"))?;
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let mut f = fs::File::create(&tmp_path)?;
        f.write_all(bytes)?;
        f.flush()?;
        let _ = f.sync_all();
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Smallest useful well-formedness check on a just-written snapshot,
/// used by tests that want to assert the sink actually wrote valid
/// JSON rather than inspecting private fields.
pub fn read_json(path: &Path) -> std::io::Result<JsonValue> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
