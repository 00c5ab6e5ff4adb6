//! End-to-end cycle behavior against scripted adapters and a scratch
//! data directory, exercising the same path the CLI's `run` command
//! drives in production (spec §8).

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use vigil_adapters::{MockAdapter, SourceAdapter};
use vigil_core::Record;
use vigil_pipeline::{Metrics, Orchestrator, PipelineConfig};
use vigil_runtime::TokioRuntime;

fn vuln(source: &str, id: &str, cvss: f64) -> Record {
    Record {
        source: source.into(),
        cve_id: Some(id.into()),
        description: Some(format!("Remote code execution vulnerability {id}")),
        published: Some(Utc::now()),
        cvss_v3_score: Some(cvss),
        ..Default::default()
    }
}

fn single_source_orchestrator(
    data_dir: &std::path::Path,
    adapter: MockAdapter,
) -> Orchestrator<TokioRuntime> {
    let config = PipelineConfig {
        data_dir: data_dir.to_path_buf(),
        max_concurrent_sources: 2,
        ..PipelineConfig::default()
    };
    let mut adapters: BTreeMap<String, Arc<dyn SourceAdapter>> = BTreeMap::new();
    adapters.insert("nvd".to_string(), Arc::new(adapter));
    Orchestrator::new(config, adapters, Arc::new(Metrics::new()), TokioRuntime::new())
}

#[tokio::test]
async fn full_cycle_writes_snapshot_report_and_sync_state() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = MockAdapter::new("nvd").with_cycle(vec![
        vuln("nvd", "CVE-2024-100", 9.8),
        vuln("nvd", "CVE-2024-101", 5.0),
    ]);
    let mut orchestrator = single_source_orchestrator(dir.path(), adapter);

    let report = orchestrator.run_cycle().await;
    assert_eq!(report.sources.len(), 1);
    assert_eq!(report.sources[0].unique, 2);
    assert_eq!(report.total_vulnerabilities(), 2);

    let processed_dir = dir.path().join("processed").join("nvd");
    let entries: Vec<_> = std::fs::read_dir(&processed_dir).unwrap().collect();
    assert_eq!(entries.len(), 1);

    let reports_dir = dir.path().join("quality_reports");
    let report_entries: Vec<_> = std::fs::read_dir(&reports_dir).unwrap().collect();
    assert_eq!(report_entries.len(), 1);

    assert!(dir.path().join("quality_history.json").exists());
    assert!(dir.path().join("nvd_sync_state.json").exists());
}

#[tokio::test]
async fn running_two_cycles_with_no_new_records_detects_full_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let batch = vec![vuln("nvd", "CVE-2024-1", 7.0), vuln("nvd", "CVE-2024-2", 6.0)];
    let adapter = MockAdapter::new("nvd").with_cycle(batch.clone()).with_cycle(batch);
    let mut orchestrator = single_source_orchestrator(dir.path(), adapter);

    let first = orchestrator.run_cycle().await;
    assert_eq!(first.sources[0].unique, 2);
    assert_eq!(first.sources[0].duplicates_removed, 0);

    let second = orchestrator.run_cycle().await;
    assert_eq!(second.sources[0].unique, 0);
    assert_eq!(second.sources[0].duplicates_removed, 2);
}

#[tokio::test]
async fn disabled_source_is_skipped_entirely() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = MockAdapter::new("nvd").with_cycle(vec![vuln("nvd", "CVE-2024-1", 7.0)]);
    let mut config = PipelineConfig {
        data_dir: dir.path().to_path_buf(),
        ..PipelineConfig::default()
    };
    config.sources.insert(
        "nvd".to_string(),
        vigil_pipeline::SourceConfig {
            enabled: false,
            ..Default::default()
        },
    );
    let mut adapters: BTreeMap<String, Arc<dyn SourceAdapter>> = BTreeMap::new();
    adapters.insert("nvd".to_string(), Arc::new(adapter));
    let mut orchestrator = Orchestrator::new(config, adapters, Arc::new(Metrics::new()), TokioRuntime::new());

    let report = orchestrator.run_cycle().await;
    assert!(report.sources.is_empty());
    assert!(!dir.path().join("processed").join("nvd").exists());
}
