//! Durable per-source quality report history (spec §4.3, §6).

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::report::QualityReport;

/// Oldest reports are dropped first once a source exceeds this length.
pub const MAX_HISTORY_PER_SOURCE: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityHistory {
    reports: BTreeMap<String, Vec<QualityReport>>,
}

impl QualityHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let bytes = fs::read(path).map_err(|source| Error::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        atomic_write(path, &serde_json::to_vec_pretty(self)?)
    }

    /// Scores from oldest to newest, excluding the report about to be
    /// appended, for feeding into trend classification.
    pub fn overall_scores(&self, source: &str) -> Vec<f64> {
        self.reports
            .get(source)
            .map(|reports| reports.iter().map(|r| r.metrics.overall).collect())
            .unwrap_or_default()
    }

    pub fn append(&mut self, report: QualityReport) {
        let entry = self.reports.entry(report.source.clone()).or_default();
        entry.push(report);
        if entry.len() > MAX_HISTORY_PER_SOURCE {
            let overflow = entry.len() - MAX_HISTORY_PER_SOURCE;
            entry.drain(0..overflow);
        }
    }

    pub fn reports_for(&self, source: &str) -> &[QualityReport] {
        self.reports.get(source).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("quality_history.json");
    let tmp_path: PathBuf = path.with_file_name(format!("{file_name}.tmp"));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::Write {
            path: path.display().to_string(),
            source,
        })?;
    }

    let write = |tmp_path: &PathBuf| -> std::io::Result<()> {
        let mut f = fs::File::create(tmp_path)?;
        f.write_all(bytes)?;
        f.flush()?;
        let _ = f.sync_all();
        Ok(())
    };
    write(&tmp_path).map_err(|source| Error::Write {
        path: path.display().to_string(),
        source,
    })?;

    fs::rename(&tmp_path, path).map_err(|source| Error::Write {
        path: path.display().to_string(),
        source,
    })
}
