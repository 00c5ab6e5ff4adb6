//! The per-cycle orchestration algorithm (spec §4.5): enumerate enabled
//! sources, fetch them with bounded concurrency, then deduplicate,
//! score, and sink each source's batch serially as its fetch completes.
//!
//! Watermarks only advance after a source's sinks have committed (spec
//! §9, open question 2) so a crash between fetch and sink re-fetches
//! the same window next cycle instead of silently skipping it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use vigil_adapters::SourceAdapter;
use vigil_dedup::Deduplicator;
use vigil_quality::{Analyzer, DataTypeHint, QualityHistory};
use vigil_runtime::{run_bounded, PipelineRuntime, ShutdownSignal};
use vigil_sync::SyncState;

use crate::config::PipelineConfig;
use crate::metrics::Metrics;
use crate::sinks;

/// Outcome of fetching and processing one source during a cycle, kept
/// for the CLI's human-readable summary and for integration tests.
#[derive(Debug, Clone)]
pub struct SourceCycleResult {
    pub source: String,
    pub fetched: usize,
    pub unique: usize,
    pub duplicates_removed: usize,
    pub quality_score: f64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub sources: Vec<SourceCycleResult>,
}

impl CycleReport {
    pub fn total_vulnerabilities(&self) -> u64 {
        self.sources.iter().map(|s| s.unique as u64).sum()
    }
}

fn data_type_hint_for(hint: Option<&str>) -> Option<DataTypeHint> {
    match hint {
        Some("vulnerability") => Some(DataTypeHint::Vulnerability),
        Some("threat_intelligence") => Some(DataTypeHint::ThreatIntelligence),
        Some("malware") => Some(DataTypeHint::Malware),
        _ => None,
    }
}

pub struct Orchestrator<R: PipelineRuntime> {
    config: PipelineConfig,
    adapters: BTreeMap<String, Arc<dyn SourceAdapter>>,
    dedup: Deduplicator,
    analyzer: Analyzer,
    history: QualityHistory,
    metrics: Arc<Metrics>,
    runtime: R,
    shutdown: ShutdownSignal,
}

impl<R: PipelineRuntime> Orchestrator<R> {
    pub fn new(
        config: PipelineConfig,
        adapters: BTreeMap<String, Arc<dyn SourceAdapter>>,
        metrics: Arc<Metrics>,
        runtime: R,
    ) -> Self {
        let history_path = sinks::quality_history_path(&config.data_dir);
        let history = QualityHistory::load(&history_path).unwrap_or_else(|err| {
            warn!(error = %err, "failed to load quality history, starting empty");
            QualityHistory::new()
        });

        Self {
            config,
            adapters,
            dedup: Deduplicator::new(),
            analyzer: Analyzer::new(),
            history,
            metrics,
            runtime,
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn stop(&self) {
        self.shutdown.request();
    }

    /// Run cycles on `cycle_interval_minutes` spacing until `stop()` is
    /// called. The between-cycle wait is cancellable; an in-progress
    /// cycle always runs to completion.
    pub async fn run_forever(&mut self) {
        let interval = Duration::from_secs(self.config.cycle_interval_minutes * 60);
        loop {
            if self.shutdown.is_requested() {
                return;
            }
            self.run_cycle().await;
            if self.shutdown.wait_or(&self.runtime, interval).await {
                return;
            }
        }
    }

    /// Fetch every enabled source with at most `max_concurrent_sources`
    /// in flight, then dedup/score/sink each completed fetch serially.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let enabled: Vec<(String, Arc<dyn SourceAdapter>)> = self
            .adapters
            .iter()
            .filter(|(name, _)| self.config.source_config(name).enabled)
            .map(|(name, adapter)| (name.clone(), Arc::clone(adapter)))
            .collect();

        self.metrics.set_active_sources(enabled.len() as u64);

        let data_dir = self.config.data_dir.clone();
        let mut fetch_tasks = Vec::with_capacity(enabled.len());
        for (name, adapter) in &enabled {
            let name = name.clone();
            let adapter = Arc::clone(adapter);
            let sync_state = SyncState::load(&data_dir, &name).unwrap_or_else(|err| {
                warn!(source = %name, error = %err, "failed to load sync state, treating as first run");
                SyncState::default()
            });
            fetch_tasks.push(async move {
                let started = Instant::now();
                let outcome = adapter.fetch_incremental(&sync_state).await;
                (name, sync_state, outcome, started.elapsed())
            });
        }

        let fetch_results = run_bounded(fetch_tasks, self.config.max_concurrent_sources).await;

        let mut report = CycleReport::default();
        for joined in fetch_results {
            let (source, sync_state, outcome, elapsed) = match joined {
                Ok(v) => v,
                Err(join_err) => {
                    warn!(error = %join_err, "fetch task panicked");
                    continue;
                }
            };

            match outcome {
                Ok(fetch_result) => {
                    self.metrics.record_fetch(&source, "success");
                    self.metrics.observe_fetch_duration(&source, "success", elapsed.as_secs_f64());
                    let result = self.process_source(&source, sync_state, fetch_result);
                    report.sources.push(result);
                }
                Err(err) => {
                    self.metrics.record_fetch(&source, "error");
                    self.metrics.observe_fetch_duration(&source, "error", elapsed.as_secs_f64());
                    self.metrics.record_error(&source, err.kind());
                    warn!(source = %source, error = %err, "fetch failed, skipping this source for this cycle");
                    report.sources.push(SourceCycleResult {
                        source,
                        fetched: 0,
                        unique: 0,
                        duplicates_removed: 0,
                        quality_score: 0.0,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        let history_path = sinks::quality_history_path(&self.config.data_dir);
        if let Err(err) = self.history.save(&history_path) {
            warn!(error = %err, "failed to persist quality history");
        }

        self.metrics.set_total_vulnerabilities(report.total_vulnerabilities());
        info!(sources = report.sources.len(), "cycle complete");
        report
    }

    fn process_source(&mut self, source: &str, sync_state: SyncState, fetch_result: vigil_adapters::FetchResult) -> SourceCycleResult {
        let source_cfg = self.config.source_config(source);
        let fetched = fetch_result.records.len();

        let dedup_started = Instant::now();
        let dedup_out = self.dedup.process(fetch_result.records, &source_cfg.merge_strategy);
        self.metrics
            .observe_dedup_duration(dedup_label(&source_cfg.merge_strategy), dedup_started.elapsed().as_secs_f64());
        self.metrics.record_duplicates_removed(source, dedup_out.stats.duplicates_removed as u64);
        self.metrics.set_dedup_ratio(source, dedup_out.stats.reduction_ratio);

        let quality_started = Instant::now();
        let hint = data_type_hint_for(source_cfg.data_type_hint.as_deref());
        let report = self.analyzer.analyze(source, &dedup_out.unique, hint, &mut self.history);
        self.metrics.observe_quality_duration(source, quality_started.elapsed().as_secs_f64());
        for (dimension, value) in [
            ("freshness", report.metrics.freshness),
            ("completeness", report.metrics.completeness),
            ("uniqueness", report.metrics.uniqueness),
            ("consistency", report.metrics.consistency),
            ("accuracy", report.metrics.accuracy),
            ("overall", report.metrics.overall),
        ] {
            self.metrics.set_quality_score(source, dimension, value);
        }

        let timestamp = self.runtime.now();
        if let Err(err) = sinks::write_snapshot(&self.config.data_dir, source, timestamp, &dedup_out.unique, &report.metrics) {
            warn!(source = %source, error = %err, "failed to write snapshot");
        }
        if let Err(err) = sinks::write_quality_report(&self.config.data_dir, source, timestamp, &report, &dedup_out.stats) {
            warn!(source = %source, error = %err, "failed to write quality report");
        }

        let advanced = sync_state.advance(fetch_result.new_watermark, dedup_out.unique.len() as u64);
        if let Err(err) = advanced.save(&self.config.data_dir, source) {
            warn!(source = %source, error = %err, "failed to persist sync state");
        }

        SourceCycleResult {
            source: source.to_string(),
            fetched,
            unique: dedup_out.unique.len(),
            duplicates_removed: dedup_out.stats.duplicates_removed,
            quality_score: report.metrics.overall,
            error: None,
        }
    }
}

fn dedup_label(strategy: &vigil_core::MergeStrategy) -> &'static str {
    if strategy.merge_fields {
        "merge"
    } else {
        "discard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_adapters::MockAdapter;
    use vigil_core::Record;

    fn sample_record(id: &str) -> Record {
        Record {
            source: "nvd".into(),
            cve_id: Some(id.into()),
            description: Some("A real vulnerability in a web server".into()),
            published: Some(chrono::Utc::now()),
            cvss_v3_score: Some(7.5),
            ..Default::default()
        }
    }

    fn orchestrator_with(
        data_dir: &std::path::Path,
        adapter: MockAdapter,
    ) -> Orchestrator<vigil_runtime::TokioRuntime> {
        let mut config = PipelineConfig {
            data_dir: data_dir.to_path_buf(),
            ..PipelineConfig::default()
        };
        config.max_concurrent_sources = 2;

        let mut adapters: BTreeMap<String, Arc<dyn SourceAdapter>> = BTreeMap::new();
        adapters.insert("nvd".to_string(), Arc::new(adapter));

        Orchestrator::new(config, adapters, Arc::new(Metrics::new()), vigil_runtime::TokioRuntime::new())
    }

    #[tokio::test]
    async fn run_cycle_writes_snapshot_and_advances_watermark() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = MockAdapter::new("nvd").with_cycle(vec![sample_record("CVE-2024-1"), sample_record("CVE-2024-2")]);
        let mut orchestrator = orchestrator_with(dir.path(), adapter);

        let report = orchestrator.run_cycle().await;
        assert_eq!(report.sources.len(), 1);
        assert_eq!(report.sources[0].unique, 2);
        assert!(report.sources[0].error.is_none());

        let sync_state = SyncState::load(dir.path(), "nvd").unwrap();
        assert_eq!(sync_state.total_processed, 2);
    }

    #[tokio::test]
    async fn fetch_failure_is_recorded_but_does_not_abort_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = MockAdapter::new("nvd")
            .with_failure(vigil_adapters::AdapterError::Transient { source: "nvd".into(), detail: "timeout".into() });
        let mut orchestrator = orchestrator_with(dir.path(), adapter);

        let report = orchestrator.run_cycle().await;
        assert_eq!(report.sources.len(), 1);
        assert!(report.sources[0].error.is_some());
    }

    #[tokio::test]
    async fn run_forever_with_mock_runtime_does_not_block_on_the_cycle_interval() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = MockAdapter::new("nvd").with_cycle(vec![sample_record("CVE-2024-1")]);

        let mut config = PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        config.max_concurrent_sources = 2;
        config.cycle_interval_minutes = 60;

        let mut adapters: BTreeMap<String, Arc<dyn SourceAdapter>> = BTreeMap::new();
        adapters.insert("nvd".to_string(), Arc::new(adapter));

        let runtime = vigil_runtime::MockRuntime::new(chrono::Utc::now());
        let mut orchestrator = Orchestrator::new(config, adapters, Arc::new(Metrics::new()), runtime);
        let shutdown = orchestrator.shutdown_signal();

        // A real hour-long interval would never elapse within this
        // timeout; MockRuntime's sleep resolves instantly, so the loop
        // keeps rechecking the shutdown flag instead of actually
        // waiting, and stops as soon as it's requested.
        let requester = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            shutdown.request();
        });

        tokio::time::timeout(std::time::Duration::from_millis(500), orchestrator.run_forever())
            .await
            .expect("run_forever should return promptly once shutdown is requested");
        requester.await.unwrap();
    }

    #[tokio::test]
    async fn second_cycle_over_overlapping_records_reports_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = MockAdapter::new("nvd")
            .with_cycle(vec![sample_record("CVE-2024-1")])
            .with_cycle(vec![sample_record("CVE-2024-1"), sample_record("CVE-2024-2")]);
        let mut orchestrator = orchestrator_with(dir.path(), adapter);

        let first = orchestrator.run_cycle().await;
        assert_eq!(first.sources[0].unique, 1);

        let second = orchestrator.run_cycle().await;
        assert_eq!(second.sources[0].unique, 1);
        assert_eq!(second.sources[0].duplicates_removed, 1);
    }
}
