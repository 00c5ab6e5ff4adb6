//! Multi-dimensional quality scoring for ingested source batches.
//!
//! [`Analyzer::analyze`] is the single entry point: given a source tag
//! and a batch of [`vigil_core::Record`]s, it computes the five
//! dimensions (§4.3), derives issues/recommendations from the
//! threshold table, classifies the trend against [`history::QualityHistory`],
//! and appends the resulting report to that history.

pub mod data_type;
pub mod dimensions;
pub mod error;
pub mod history;
pub mod report;
pub mod trend;

use chrono::{DateTime, Utc};

pub use data_type::DataTypeHint;
pub use error::{Error, Result};
pub use history::QualityHistory;
pub use report::{QualityMetrics, QualityReport};
pub use trend::Trend;

use vigil_core::Record;

#[derive(Debug, Default, Clone, Copy)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }

    /// Score `records` from `source`, append the report to `history`,
    /// and return it. Does not persist `history` to disk; callers
    /// decide when to call [`QualityHistory::save`].
    pub fn analyze(
        &self,
        source: &str,
        records: &[Record],
        hint: Option<DataTypeHint>,
        history: &mut QualityHistory,
    ) -> QualityReport {
        self.analyze_at(source, records, hint, history, Utc::now())
    }

    fn analyze_at(
        &self,
        source: &str,
        records: &[Record],
        hint: Option<DataTypeHint>,
        history: &mut QualityHistory,
        now: DateTime<Utc>,
    ) -> QualityReport {
        if records.is_empty() {
            let report = QualityReport::empty(source, now);
            history.append(report.clone());
            return report;
        }

        let metrics = QualityMetrics::new(
            dimensions::freshness(records, now),
            dimensions::completeness(records, hint),
            dimensions::uniqueness(source, records),
            dimensions::consistency(records),
            dimensions::accuracy(source, records),
        );

        let (issues, recommendations) = report::issues_and_recommendations(&metrics);
        let prior_scores = history.overall_scores(source);
        let trend = trend::classify(&prior_scores, metrics.overall);

        let report = QualityReport {
            source: source.to_string(),
            timestamp: now,
            metrics,
            issues,
            recommendations,
            trend,
            samples: records.len(),
        };

        history.append(report.clone());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_produces_canonical_report_and_no_trend() {
        let analyzer = Analyzer::new();
        let mut history = QualityHistory::new();
        let report = analyzer.analyze("nvd", &[], None, &mut history);
        assert_eq!(report.samples, 0);
        assert_eq!(report.trend, Trend::InsufficientData);
    }

    #[test]
    fn metrics_stay_within_unit_interval() {
        let analyzer = Analyzer::new();
        let mut history = QualityHistory::new();
        let records = vec![Record {
            source: "nvd".into(),
            cve_id: Some("CVE-2024-1".into()),
            description: Some("A real vulnerability".into()),
            published: Some(Utc::now()),
            cvss_v3_score: Some(7.5),
            ..Default::default()
        }];
        let report = analyzer.analyze("nvd", &records, Some(DataTypeHint::Vulnerability), &mut history);
        let m = report.metrics;
        for v in [m.freshness, m.completeness, m.uniqueness, m.consistency, m.accuracy, m.overall] {
            assert!((0.0..=1.0).contains(&v), "metric out of range: {v}");
        }
    }

    #[test]
    fn history_accumulates_across_calls() {
        let analyzer = Analyzer::new();
        let mut history = QualityHistory::new();
        let records = vec![Record {
            source: "nvd".into(),
            cve_id: Some("CVE-2024-1".into()),
            published: Some(Utc::now()),
            ..Default::default()
        }];
        for _ in 0..4 {
            analyzer.analyze("nvd", &records, None, &mut history);
        }
        assert_eq!(history.reports_for("nvd").len(), 4);
    }
}
