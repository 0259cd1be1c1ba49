//! Metric series registry
//!
//! Every wrapped resource kind owns one latency histogram vector labelled by
//! a destination (queue URL, operation name, exchange) and the call outcome.
//! The registry is constructed explicitly and shared by reference; series
//! registration is idempotent so each facade can register its series on
//! construction.
//!
//! Observation is lock-free once a label pair has been seen. Creating a new
//! label child takes the vector's write lock once.

pub mod prometheus;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

/// Default histogram bucket upper bounds, in seconds
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Label carrying the call outcome on every series
pub const SUCCESS_LABEL: &str = "success";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    #[error("Metric {name} already registered with label {existing:?}, requested {requested:?}")]
    LabelMismatch {
        name: String,
        existing: String,
        requested: String,
    },
    #[error("Invalid metric name: {0}")]
    InvalidName(String),
}

/// Registration options for a `(destination, success)` histogram series
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesOpts {
    pub namespace: String,
    pub subsystem: String,
    pub name: String,
    pub help: String,
    /// Name of the destination label, e.g. `queue`, `op`, `exchange`
    pub destination_label: String,
    pub buckets: Vec<f64>,
}

impl SeriesOpts {
    pub fn new(
        namespace: impl Into<String>,
        subsystem: impl Into<String>,
        name: impl Into<String>,
        help: impl Into<String>,
        destination_label: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            subsystem: subsystem.into(),
            name: name.into(),
            help: help.into(),
            destination_label: destination_label.into(),
            buckets: DEFAULT_BUCKETS.to_vec(),
        }
    }

    /// Override the bucket upper bounds
    #[must_use]
    pub fn with_buckets(mut self, buckets: impl Into<Vec<f64>>) -> Self {
        self.buckets = buckets.into();
        self
    }

    /// `<namespace>_<subsystem>_<name>`, skipping empty parts
    pub fn fully_qualified_name(&self) -> String {
        [&self.namespace, &self.subsystem, &self.name]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Point-in-time view of one histogram
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum: f64,
    /// Cumulative counts per upper bound; the `+Inf` bucket equals `count`
    pub buckets: Vec<(f64, u64)>,
}

struct HistogramCore {
    bounds: Arc<[f64]>,
    // Per-bucket (non-cumulative) counts; the last slot is `+Inf`
    counts: Box<[AtomicU64]>,
    count: AtomicU64,
    sum_bits: AtomicU64,
}

/// A single labelled histogram
#[derive(Clone)]
pub struct Histogram {
    name: Arc<str>,
    core: Arc<HistogramCore>,
}

impl Histogram {
    fn new(name: Arc<str>, bounds: Arc<[f64]>) -> Self {
        let counts = (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect();
        Self {
            name,
            core: Arc::new(HistogramCore {
                bounds,
                counts,
                count: AtomicU64::new(0),
                sum_bits: AtomicU64::new(0f64.to_bits()),
            }),
        }
    }

    /// Record an observation, in seconds
    pub fn observe(&self, value: f64) {
        let core = &self.core;
        let index = core
            .bounds
            .iter()
            .position(|bound| value <= *bound)
            .unwrap_or(core.bounds.len());
        core.counts[index].fetch_add(1, Ordering::Relaxed);
        // fetch_update retries until the CAS lands, so the closure never yields None
        let _ = core
            .sum_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + value).to_bits())
            });
        core.count.fetch_add(1, Ordering::Release);
    }

    pub fn count(&self) -> u64 {
        self.core.count.load(Ordering::Acquire)
    }

    pub fn sum(&self) -> f64 {
        f64::from_bits(self.core.sum_bits.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let core = &self.core;
        let count = self.count();
        let mut cumulative = 0;
        let buckets = core
            .bounds
            .iter()
            .zip(core.counts.iter())
            .map(|(bound, slot)| {
                cumulative += slot.load(Ordering::Relaxed);
                (*bound, cumulative)
            })
            .collect();
        HistogramSnapshot {
            count,
            sum: self.sum(),
            buckets,
        }
    }
}

impl fmt::Debug for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Histogram")
            .field("name", &self.name)
            .field("count", &self.count())
            .field("sum", &self.sum())
            .finish()
    }
}

type LabelKey = (String, bool);

struct VecInner {
    opts: SeriesOpts,
    name: Arc<str>,
    bounds: Arc<[f64]>,
    children: RwLock<HashMap<LabelKey, Histogram>>,
}

/// Histogram series keyed by `(destination, success)`
#[derive(Clone)]
pub struct HistogramVec {
    inner: Arc<VecInner>,
}

impl HistogramVec {
    fn new(opts: SeriesOpts) -> Self {
        let mut bounds = opts.buckets.clone();
        bounds.retain(|b| b.is_finite());
        bounds.sort_by(f64::total_cmp);
        bounds.dedup();
        Self {
            inner: Arc::new(VecInner {
                name: Arc::from(opts.fully_qualified_name()),
                bounds: Arc::from(bounds),
                opts,
                children: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn opts(&self) -> &SeriesOpts {
        &self.inner.opts
    }

    /// Get or create the histogram for one label pair
    pub fn with_labels(&self, destination: &str, success: bool) -> Histogram {
        let key = (destination.to_string(), success);
        if let Some(histogram) = self
            .inner
            .children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return histogram.clone();
        }

        let mut children = self
            .inner
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        children
            .entry(key)
            .or_insert_with(|| Histogram::new(self.inner.name.clone(), self.inner.bounds.clone()))
            .clone()
    }

    /// Record one observation for a label pair
    pub fn observe(&self, destination: &str, success: bool, seconds: f64) {
        self.with_labels(destination, success).observe(seconds);
        debug!(
            metric = "histogram",
            name = %self.inner.name,
            destination = destination,
            success = success,
            value = seconds,
            "Histogram observation recorded"
        );
    }

    /// Every label pair seen so far, sorted by destination then outcome
    pub fn children(&self) -> Vec<(String, bool, Histogram)> {
        let children = self
            .inner
            .children
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<_> = children
            .iter()
            .map(|((dest, success), h)| (dest.clone(), *success, h.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        out
    }
}

impl fmt::Debug for HistogramVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistogramVec")
            .field("name", &self.inner.name)
            .field("destination_label", &self.inner.opts.destination_label)
            .finish_non_exhaustive()
    }
}

/// Process-wide registry of histogram series
#[derive(Default)]
pub struct MetricsRegistry {
    series: RwLock<HashMap<String, HistogramVec>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a histogram series, or return the one already registered
    /// under the same name.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::LabelMismatch`] when the name is taken by a
    /// series with a different destination label, and
    /// [`MetricsError::InvalidName`] for names that are empty or not valid
    /// Prometheus identifiers.
    pub fn register_histogram(&self, opts: SeriesOpts) -> Result<HistogramVec, MetricsError> {
        let name = opts.fully_qualified_name();
        if !is_valid_name(&name) {
            return Err(MetricsError::InvalidName(name));
        }
        if !is_valid_name(&opts.destination_label) || opts.destination_label == SUCCESS_LABEL {
            return Err(MetricsError::InvalidName(opts.destination_label));
        }

        let mut series = self.series.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = series.get(&name) {
            if existing.opts().destination_label != opts.destination_label {
                return Err(MetricsError::LabelMismatch {
                    name,
                    existing: existing.opts().destination_label.clone(),
                    requested: opts.destination_label,
                });
            }
            return Ok(existing.clone());
        }

        debug!(metric = "histogram", name = %name, "Metric series registered");
        let vec = HistogramVec::new(opts);
        series.insert(name, vec.clone());
        Ok(vec)
    }

    /// Look up a registered series by its fully-qualified name
    pub fn get(&self, name: &str) -> Option<HistogramVec> {
        self.series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Record one observation into a registered series.
    ///
    /// # Panics
    ///
    /// Panics if no series named `name` was registered. Observing into an
    /// unregistered series is a programming error.
    pub fn observe(&self, name: &str, destination: &str, success: bool, seconds: f64) {
        match self.get(name) {
            Some(series) => series.observe(destination, success, seconds),
            None => panic!("metric series {name} observed before registration"),
        }
    }

    /// All registered series, sorted by name
    pub fn series(&self) -> Vec<HistogramVec> {
        let series = self.series.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<_> = series.values().cloned().collect();
        out.sort_by(|a, b| a.name().cmp(b.name()));
        out
    }
}

impl fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.series().iter().map(|s| s.name().to_string()).collect();
        f.debug_struct("MetricsRegistry")
            .field("series", &names)
            .finish()
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn opts() -> SeriesOpts {
        SeriesOpts::new(
            "client",
            "sqs",
            "publish_duration_seconds",
            "AWS SQS publish completed by the client.",
            "queue",
        )
    }

    #[test]
    fn test_fully_qualified_name() {
        assert_eq!(
            opts().fully_qualified_name(),
            "client_sqs_publish_duration_seconds"
        );
        let no_subsystem = SeriesOpts::new("client", "", "x_seconds", "", "op");
        assert_eq!(no_subsystem.fully_qualified_name(), "client_x_seconds");
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = MetricsRegistry::new();
        let first = registry.register_histogram(opts()).unwrap();
        let second = registry.register_histogram(opts()).unwrap();

        first.observe("q1", true, 0.2);
        assert_eq!(second.with_labels("q1", true).count(), 1);
        assert_eq!(registry.series().len(), 1);
    }

    #[test]
    fn test_register_label_mismatch() {
        let registry = MetricsRegistry::new();
        registry.register_histogram(opts()).unwrap();

        let mut conflicting = opts();
        conflicting.destination_label = "exchange".to_string();
        let err = registry.register_histogram(conflicting).unwrap_err();
        assert!(matches!(err, MetricsError::LabelMismatch { .. }));
    }

    #[test]
    fn test_register_rejects_invalid_names() {
        let registry = MetricsRegistry::new();
        let bad = SeriesOpts::new("client", "sqs", "publish-duration", "", "queue");
        assert!(matches!(
            registry.register_histogram(bad),
            Err(MetricsError::InvalidName(_))
        ));
        let reserved = SeriesOpts::new("client", "sqs", "x", "", SUCCESS_LABEL);
        assert!(registry.register_histogram(reserved).is_err());
    }

    #[test]
    fn test_labels_are_independent() {
        let registry = MetricsRegistry::new();
        let vec = registry.register_histogram(opts()).unwrap();

        vec.observe("q1", true, 0.1);
        vec.observe("q1", false, 0.1);
        vec.observe("q2", true, 0.1);
        vec.observe("q1", true, 0.3);

        assert_eq!(vec.with_labels("q1", true).count(), 2);
        assert_eq!(vec.with_labels("q1", false).count(), 1);
        assert_eq!(vec.with_labels("q2", true).count(), 1);
        assert_eq!(vec.with_labels("q2", false).count(), 0);
    }

    #[test]
    fn test_snapshot_buckets_are_cumulative() {
        let h = Histogram::new(Arc::from("h"), Arc::from(vec![0.1, 1.0]));
        h.observe(0.05);
        h.observe(0.5);
        h.observe(0.5);
        h.observe(30.0);

        let snapshot = h.snapshot();
        assert_eq!(snapshot.count, 4);
        assert!((snapshot.sum - 31.05).abs() < 1e-9);
        assert_eq!(snapshot.buckets, vec![(0.1, 1), (1.0, 3)]);
    }

    #[test]
    fn test_registry_observe() {
        let registry = MetricsRegistry::new();
        registry.register_histogram(opts()).unwrap();
        registry.observe("client_sqs_publish_duration_seconds", "q1", true, 0.01);

        let vec = registry.get("client_sqs_publish_duration_seconds").unwrap();
        assert_eq!(vec.with_labels("q1", true).count(), 1);
    }

    #[test]
    #[should_panic(expected = "observed before registration")]
    fn test_registry_observe_unregistered_panics() {
        MetricsRegistry::new().observe("client_nope_seconds", "q1", true, 0.01);
    }

    #[test]
    fn test_concurrent_observe() {
        let registry = Arc::new(MetricsRegistry::new());
        let vec = registry.register_histogram(opts()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let vec = vec.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        vec.observe("q1", true, 0.001);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = vec.with_labels("q1", true).snapshot();
        assert_eq!(snapshot.count, 8000);
        assert!((snapshot.sum - 8.0).abs() < 1e-6);
    }
}
