//! In-memory counters/gauges/histograms for the Prometheus-style
//! collector that scrapes this process (spec §6). The collector and
//! HTTP endpoint are out of scope; [`Metrics::render_prometheus`] is a
//! pure string formatter an external exposer can call.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Default)]
struct DurationStats {
    count: u64,
    sum_seconds: f64,
}

#[derive(Debug, Default)]
pub struct Metrics {
    fetch_total: Mutex<BTreeMap<(String, String), u64>>,
    duplicates_removed_total: Mutex<BTreeMap<String, u64>>,
    errors_total: Mutex<BTreeMap<(String, String), u64>>,

    dedup_ratio: Mutex<BTreeMap<String, f64>>,
    quality_score: Mutex<BTreeMap<(String, String), f64>>,
    active_sources: AtomicU64,
    total_vulnerabilities: AtomicU64,

    fetch_duration: Mutex<BTreeMap<(String, String), DurationStats>>,
    dedup_duration: Mutex<BTreeMap<String, DurationStats>>,
    quality_duration: Mutex<BTreeMap<String, DurationStats>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetch(&self, source: &str, status: &str) {
        *self
            .fetch_total
            .lock()
            .unwrap()
            .entry((source.to_string(), status.to_string()))
            .or_insert(0) += 1;
    }

    pub fn record_duplicates_removed(&self, source: &str, count: u64) {
        *self
            .duplicates_removed_total
            .lock()
            .unwrap()
            .entry(source.to_string())
            .or_insert(0) += count;
    }

    pub fn record_error(&self, source: &str, error_kind: &str) {
        *self
            .errors_total
            .lock()
            .unwrap()
            .entry((source.to_string(), error_kind.to_string()))
            .or_insert(0) += 1;
    }

    pub fn set_dedup_ratio(&self, source: &str, ratio: f64) {
        self.dedup_ratio.lock().unwrap().insert(source.to_string(), ratio);
    }

    pub fn set_quality_score(&self, source: &str, dimension: &str, value: f64) {
        self.quality_score
            .lock()
            .unwrap()
            .insert((source.to_string(), dimension.to_string()), value);
    }

    pub fn set_active_sources(&self, count: u64) {
        self.active_sources.store(count, Ordering::SeqCst);
    }

    pub fn set_total_vulnerabilities(&self, count: u64) {
        self.total_vulnerabilities.store(count, Ordering::SeqCst);
    }

    pub fn observe_fetch_duration(&self, source: &str, status: &str, seconds: f64) {
        let mut map = self.fetch_duration.lock().unwrap();
        let entry = map.entry((source.to_string(), status.to_string())).or_default();
        entry.count += 1;
        entry.sum_seconds += seconds;
    }

    pub fn observe_dedup_duration(&self, strategy_label: &str, seconds: f64) {
        let mut map = self.dedup_duration.lock().unwrap();
        let entry = map.entry(strategy_label.to_string()).or_default();
        entry.count += 1;
        entry.sum_seconds += seconds;
    }

    pub fn observe_quality_duration(&self, source: &str, seconds: f64) {
        let mut map = self.quality_duration.lock().unwrap();
        let entry = map.entry(source.to_string()).or_default();
        entry.count += 1;
        entry.sum_seconds += seconds;
    }

    /// Render every counter/gauge/histogram as Prometheus text
    /// exposition format. Pure function over current state.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();

        render_counter2(&mut out, "source_fetch_total", ["source", "status"], &self.fetch_total.lock().unwrap());
        render_counter1(
            &mut out,
            "duplicates_removed_total",
            "source",
            &self.duplicates_removed_total.lock().unwrap(),
        );
        render_counter2(&mut out, "errors_total", ["source", "error_type"], &self.errors_total.lock().unwrap());

        render_gauge1(&mut out, "deduplication_ratio", "source", &self.dedup_ratio.lock().unwrap());
        render_gauge2(&mut out, "source_quality_score", ["source", "dimension"], &self.quality_score.lock().unwrap());

        out.push_str("# TYPE active_sources gauge\n");
        out.push_str(&format!("active_sources {}\n", self.active_sources.load(Ordering::SeqCst)));
        out.push_str("# TYPE total_vulnerabilities gauge\n");
        out.push_str(&format!("total_vulnerabilities {}\n", self.total_vulnerabilities.load(Ordering::SeqCst)));

        render_histogram2(
            &mut out,
            "source_fetch_duration_seconds",
            ["source", "status"],
            &self.fetch_duration.lock().unwrap(),
        );
        render_histogram1(
            &mut out,
            "deduplication_duration_seconds",
            "strategy",
            &self.dedup_duration.lock().unwrap(),
        );
        render_histogram1(
            &mut out,
            "quality_analysis_duration_seconds",
            "source",
            &self.quality_duration.lock().unwrap(),
        );

        out
    }
}

fn render_counter1(out: &mut String, name: &str, label: &str, values: &BTreeMap<String, u64>) {
    out.push_str(&format!("# TYPE {name} counter\n"));
    for (k, v) in values {
        out.push_str(&format!("{name}{{{label}=\"{k}\"}} {v}\n"));
    }
}

fn render_counter2(out: &mut String, name: &str, labels: [&str; 2], values: &BTreeMap<(String, String), u64>) {
    out.push_str(&format!("# TYPE {name} counter\n"));
    for ((a, b), v) in values {
        out.push_str(&format!("{name}{{{}=\"{a}\",{}=\"{b}\"}} {v}\n", labels[0], labels[1]));
    }
}

fn render_gauge1(out: &mut String, name: &str, label: &str, values: &BTreeMap<String, f64>) {
    out.push_str(&format!("# TYPE {name} gauge\n"));
    for (k, v) in values {
        out.push_str(&format!("{name}{{{label}=\"{k}\"}} {v}\n"));
    }
}

fn render_gauge2(out: &mut String, name: &str, labels: [&str; 2], values: &BTreeMap<(String, String), f64>) {
    out.push_str(&format!("# TYPE {name} gauge\n"));
    for ((a, b), v) in values {
        out.push_str(&format!("{name}{{{}=\"{a}\",{}=\"{b}\"}} {v}\n", labels[0], labels[1]));
    }
}

fn render_histogram1(out: &mut String, name: &str, label: &str, values: &BTreeMap<String, DurationStats>) {
    out.push_str(&format!("# TYPE {name} histogram\n"));
    for (k, stats) in values {
        out.push_str(&format!("{name}_count{{{label}=\"{k}\"}} {}\n", stats.count));
        out.push_str(&format!("{name}_sum{{{label}=\"{k}\"}} {}\n", stats.sum_seconds));
    }
}

fn render_histogram2(out: &mut String, name: &str, labels: [&str; 2], values: &BTreeMap<(String, String), DurationStats>) {
    out.push_str(&format!("# TYPE {name} histogram\n"));
    for ((a, b), stats) in values {
        out.push_str(&format!(
            "{name}_count{{{}=\"{a}\",{}=\"{b}\"}} {}\n",
            labels[0], labels[1], stats.count
        ));
        out.push_str(&format!(
            "{name}_sum{{{}=\"{a}\",{}=\"{b}\"}} {}\n",
            labels[0], labels[1], stats.sum_seconds
        ));
    }
}
