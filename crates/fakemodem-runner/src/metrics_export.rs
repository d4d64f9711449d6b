//! In-memory metrics recorder and JSON export.
//!
//! [`InMemoryRecorder`] keeps every counter, gauge and histogram the emulator
//! records. [`InMemoryRecorder::snapshot`] folds them into a
//! [`MetricsSnapshot`]: one entry per metric name with its total and a
//! per-label breakdown, serialized as JSON by the `--metrics-output` option.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use metrics::{
    Counter, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Recorder
// ============================================================================

/// Samples recorded by one histogram.
#[derive(Debug, Default)]
struct HistogramCell {
    samples: Mutex<Vec<f64>>,
}

impl HistogramFn for HistogramCell {
    fn record(&self, value: f64) {
        self.samples.lock().push(value);
    }
}

/// A [`Recorder`] that keeps every metric in memory.
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    counters: Mutex<HashMap<Key, Arc<AtomicU64>>>,
    /// Gauge values stored as `f64` bits.
    gauges: Mutex<HashMap<Key, Arc<AtomicU64>>>,
    histograms: Mutex<HashMap<Key, Arc<HistogramCell>>>,
}

impl InMemoryRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold everything recorded so far into a snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut metrics = BTreeMap::new();

        for (key, cell) in self.counters.lock().iter() {
            let value = cell.load(Ordering::Relaxed);
            let entry = metrics
                .entry(key.name().to_string())
                .or_insert_with(|| MetricValue::Counter(CounterValue::default()));
            if let MetricValue::Counter(counter) = entry {
                counter.total += value;
                for label in key.labels() {
                    *counter
                        .labels
                        .entry(label.key().to_string())
                        .or_default()
                        .entry(label.value().to_string())
                        .or_default() += value;
                }
            }
        }

        for (key, cell) in self.gauges.lock().iter() {
            let value = f64::from_bits(cell.load(Ordering::Relaxed));
            let entry = metrics
                .entry(key.name().to_string())
                .or_insert_with(|| MetricValue::Gauge(GaugeValue::default()));
            if let MetricValue::Gauge(gauge) = entry {
                gauge.total += value;
                for label in key.labels() {
                    *gauge
                        .labels
                        .entry(label.key().to_string())
                        .or_default()
                        .entry(label.value().to_string())
                        .or_default() += value;
                }
            }
        }

        let mut samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (key, cell) in self.histograms.lock().iter() {
            samples
                .entry(key.name().to_string())
                .or_default()
                .extend(cell.samples.lock().iter().copied());
        }
        for (name, values) in samples {
            metrics.insert(name, MetricValue::Histogram(HistogramValue::from_samples(&values)));
        }

        MetricsSnapshot { metrics }
    }
}

impl Recorder for InMemoryRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {
    }

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        let cell = self.counters.lock().entry(key.clone()).or_default().clone();
        Counter::from_arc(cell)
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        let cell = self
            .gauges
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AtomicU64::new(0.0f64.to_bits())))
            .clone();
        Gauge::from_arc(cell)
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        let cell = self.histograms.lock().entry(key.clone()).or_default().clone();
        Histogram::from_arc(cell)
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Every recorded metric, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub metrics: BTreeMap<String, MetricValue>,
}

/// One metric's aggregated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricValue {
    Counter(CounterValue),
    Gauge(GaugeValue),
    Histogram(HistogramValue),
}

/// Counter total with a breakdown by label key, then label value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterValue {
    pub total: u64,
    #[serde(default)]
    pub labels: BTreeMap<String, BTreeMap<String, u64>>,
}

/// Gauge total with a breakdown by label key, then label value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GaugeValue {
    pub total: f64,
    #[serde(default)]
    pub labels: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Histogram summary across all label sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramValue {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl HistogramValue {
    fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let sum: f64 = samples.iter().sum();
        HistogramValue {
            count: samples.len() as u64,
            sum,
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean: sum / samples.len() as f64,
        }
    }
}

impl MetricsSnapshot {
    /// Total of a counter, zero if it was never recorded.
    pub fn counter(&self, name: &str) -> u64 {
        match self.metrics.get(name) {
            Some(MetricValue::Counter(counter)) => counter.total,
            _ => 0,
        }
    }

    /// Counter total restricted to one label value, zero if absent.
    pub fn counter_for(&self, name: &str, label: &str, value: &str) -> u64 {
        match self.metrics.get(name) {
            Some(MetricValue::Counter(counter)) => counter
                .labels
                .get(label)
                .and_then(|values| values.get(value))
                .copied()
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Current total of a gauge, if it was ever recorded.
    pub fn gauge(&self, name: &str) -> Option<f64> {
        match self.metrics.get(name) {
            Some(MetricValue::Gauge(gauge)) => Some(gauge.total),
            _ => None,
        }
    }

    /// Summary of a histogram, if it was ever recorded.
    pub fn histogram(&self, name: &str) -> Option<&HistogramValue> {
        match self.metrics.get(name) {
            Some(MetricValue::Histogram(histogram)) => Some(histogram),
            _ => None,
        }
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
