//! Quality report shape, weighting, and the issues/recommendations table
//! (spec §4.3, §7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::trend::Trend;

pub const FRESHNESS_WEIGHT: f64 = 0.25;
pub const COMPLETENESS_WEIGHT: f64 = 0.20;
pub const UNIQUENESS_WEIGHT: f64 = 0.20;
pub const CONSISTENCY_WEIGHT: f64 = 0.20;
pub const ACCURACY_WEIGHT: f64 = 0.15;

const FRESHNESS_THRESHOLD: f64 = 0.5;
const COMPLETENESS_THRESHOLD: f64 = 0.7;
const UNIQUENESS_THRESHOLD: f64 = 0.1;
const CONSISTENCY_THRESHOLD: f64 = 0.8;
const ACCURACY_THRESHOLD: f64 = 0.85;
const OVERALL_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub freshness: f64,
    pub completeness: f64,
    pub uniqueness: f64,
    pub consistency: f64,
    pub accuracy: f64,
    pub overall: f64,
}

impl QualityMetrics {
    pub fn new(freshness: f64, completeness: f64, uniqueness: f64, consistency: f64, accuracy: f64) -> Self {
        let overall = FRESHNESS_WEIGHT * freshness
            + COMPLETENESS_WEIGHT * completeness
            + UNIQUENESS_WEIGHT * uniqueness
            + CONSISTENCY_WEIGHT * consistency
            + ACCURACY_WEIGHT * accuracy;
        Self {
            freshness,
            completeness,
            uniqueness,
            consistency,
            accuracy,
            overall,
        }
    }

    pub fn zero() -> Self {
        Self {
            freshness: 0.0,
            completeness: 0.0,
            uniqueness: 0.0,
            consistency: 0.0,
            accuracy: 0.0,
            overall: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: QualityMetrics,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub trend: Trend,
    pub samples: usize,
}

impl QualityReport {
    /// The canonical empty-input report (spec §4.3: "Empty input").
    pub fn empty(source: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            source: source.to_string(),
            timestamp,
            metrics: QualityMetrics::zero(),
            issues: vec!["No data available from source".to_string()],
            recommendations: vec!["Check source connectivity and configuration".to_string()],
            trend: Trend::InsufficientData,
            samples: 0,
        }
    }
}

/// Deterministic issue/recommendation pairs driven by the threshold
/// table (spec §7). Order matches the table: dimension issues first,
/// then the overall-score issue, if any; a clean report gets a single
/// "performing well" recommendation instead.
pub fn issues_and_recommendations(metrics: &QualityMetrics) -> (Vec<String>, Vec<String>) {
    let mut issues = Vec::new();
    let mut recommendations = Vec::new();

    let checks: [(f64, f64, &str, &str); 5] = [
        (
            metrics.freshness,
            FRESHNESS_THRESHOLD,
            "Data freshness is below acceptable levels",
            "Increase update frequency or check source is active",
        ),
        (
            metrics.completeness,
            COMPLETENESS_THRESHOLD,
            "Data completeness below threshold",
            "Review field mapping",
        ),
        (
            metrics.uniqueness,
            UNIQUENESS_THRESHOLD,
            "High duplicate rate detected",
            "Improve deduplication upstream",
        ),
        (
            metrics.consistency,
            CONSISTENCY_THRESHOLD,
            "Inconsistent data structure detected",
            "Standardize parsing and add type validation",
        ),
        (
            metrics.accuracy,
            ACCURACY_THRESHOLD,
            "Potential accuracy issues detected",
            "Validate against authoritative sources",
        ),
    ];

    for (value, threshold, issue, recommendation) in checks {
        if value < threshold {
            issues.push(issue.to_string());
            recommendations.push(recommendation.to_string());
        }
    }

    if metrics.overall < OVERALL_THRESHOLD {
        issues.push("Overall quality below threshold".to_string());
    }

    if issues.is_empty() {
        recommendations.push("Performing well; no action needed".to_string());
    }

    (issues, recommendations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_is_weighted_sum() {
        let m = QualityMetrics::new(1.0, 1.0, 1.0, 1.0, 1.0);
        assert!((m.overall - 1.0).abs() < 1e-9);

        let m = QualityMetrics::new(0.0, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(m.overall, 0.0);
    }

    #[test]
    fn clean_report_gets_single_recommendation() {
        let m = QualityMetrics::new(0.9, 0.9, 0.9, 0.9, 0.9);
        let (issues, recs) = issues_and_recommendations(&m);
        assert!(issues.is_empty());
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn low_freshness_emits_matching_issue() {
        let m = QualityMetrics::new(0.2, 0.9, 0.9, 0.9, 0.9);
        let (issues, recs) = issues_and_recommendations(&m);
        assert!(issues.iter().any(|i| i.contains("freshness")));
        assert!(recs.iter().any(|r| r.contains("update frequency")));
    }

    #[test]
    fn empty_report_has_canonical_issue() {
        let report = QualityReport::empty("nvd", Utc::now());
        assert_eq!(report.samples, 0);
        assert_eq!(report.metrics.overall, 0.0);
        assert_eq!(report.issues, vec!["No data available from source"]);
    }
}
