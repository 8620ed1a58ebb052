//! Lazily-created, name-keyed metric instruments.

use std::sync::Arc;

use dashmap::DashMap;
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Counter,
    Gauge, Histogram, Label, Unit,
};

/// Attribute pairs recorded alongside a measurement.
pub type MetricAttributes<'a> = &'a [(&'static str, String)];

/// Description and unit attached to an instrument on first registration.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstrumentOptions {
    pub description: Option<&'static str>,
    pub unit: Option<Unit>,
}

impl InstrumentOptions {
    pub fn described(description: &'static str) -> Self {
        Self {
            description: Some(description),
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }
}

type GaugeCallback = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Caches one instrument per fully-qualified name and kind.
///
/// Names are `{prefix}{logical name}`. Creation is lazy and idempotent
/// under concurrent access: the first writer installs the instrument and
/// every later caller receives a handle over the same one. When the pillar
/// is disabled all accessors return no-op instruments.
pub struct MetricRegistry {
    enabled: bool,
    prefix: String,
    counters: DashMap<String, Counter>,
    histograms: DashMap<String, Histogram>,
    up_down_counters: DashMap<String, Gauge>,
    gauges: DashMap<String, Gauge>,
    gauge_callbacks: DashMap<String, GaugeCallback>,
}

impl MetricRegistry {
    pub fn new(enabled: bool, prefix: impl Into<String>) -> Self {
        Self {
            enabled,
            prefix: prefix.into(),
            counters: DashMap::new(),
            histograms: DashMap::new(),
            up_down_counters: DashMap::new(),
            gauges: DashMap::new(),
            gauge_callbacks: DashMap::new(),
        }
    }

    /// A registry in no-op mode.
    pub fn disabled() -> Self {
        Self::new(false, "")
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The fully-qualified name for a logical instrument name.
    pub fn qualified(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Monotonic counter.
    pub fn counter(&self, name: &str) -> Counter {
        self.counter_with(name, InstrumentOptions::default())
    }

    pub fn counter_with(&self, name: &str, options: InstrumentOptions) -> Counter {
        if !self.enabled {
            return Counter::noop();
        }
        let key = self.qualified(name);
        self.counters
            .entry(key.clone())
            .or_insert_with(|| {
                describe(&key, options, DescribeKind::Counter);
                counter!(key.clone())
            })
            .clone()
    }

    /// Distribution of observed values.
    pub fn histogram(&self, name: &str) -> Histogram {
        self.histogram_with(name, InstrumentOptions::default())
    }

    pub fn histogram_with(&self, name: &str, options: InstrumentOptions) -> Histogram {
        if !self.enabled {
            return Histogram::noop();
        }
        let key = self.qualified(name);
        self.histograms
            .entry(key.clone())
            .or_insert_with(|| {
                describe(&key, options, DescribeKind::Histogram);
                histogram!(key.clone())
            })
            .clone()
    }

    /// Counter that can go both ways, expressed as a gauge driven by
    /// increment/decrement.
    pub fn up_down_counter(&self, name: &str) -> Gauge {
        self.up_down_counter_with(name, InstrumentOptions::default())
    }

    pub fn up_down_counter_with(&self, name: &str, options: InstrumentOptions) -> Gauge {
        if !self.enabled {
            return Gauge::noop();
        }
        let key = self.qualified(name);
        self.up_down_counters
            .entry(key.clone())
            .or_insert_with(|| {
                describe(&key, options, DescribeKind::Gauge);
                gauge!(key.clone())
            })
            .clone()
    }

    /// Gauge whose value is produced by a callback, sampled periodically by
    /// the collector task. Re-registering a name replaces the callback; the
    /// latest registration wins.
    pub fn observable_gauge(
        &self,
        name: &str,
        callback: impl Fn() -> f64 + Send + Sync + 'static,
        options: InstrumentOptions,
    ) -> Gauge {
        if !self.enabled {
            return Gauge::noop();
        }
        let handle = self.gauge_with(name, options);
        self.gauge_callbacks
            .insert(self.qualified(name), Arc::new(callback));
        handle
    }

    /// Directly-set gauge.
    pub fn gauge_with(&self, name: &str, options: InstrumentOptions) -> Gauge {
        if !self.enabled {
            return Gauge::noop();
        }
        let key = self.qualified(name);
        self.gauges
            .entry(key.clone())
            .or_insert_with(|| {
                describe(&key, options, DescribeKind::Gauge);
                gauge!(key.clone())
            })
            .clone()
    }

    /// Record onto a counter with attribute labels.
    pub fn increment_counter(&self, name: &str, value: u64, attributes: MetricAttributes) {
        if !self.enabled {
            return;
        }
        if attributes.is_empty() {
            self.counter(name).increment(value);
        } else {
            counter!(self.qualified(name), to_labels(attributes)).increment(value);
        }
    }

    /// Record onto a histogram with attribute labels.
    pub fn record_histogram(&self, name: &str, value: f64, attributes: MetricAttributes) {
        if !self.enabled {
            return;
        }
        if attributes.is_empty() {
            self.histogram(name).record(value);
        } else {
            histogram!(self.qualified(name), to_labels(attributes)).record(value);
        }
    }

    /// Set a gauge to a value; the latest write wins.
    pub fn set_gauge(&self, name: &str, value: f64, attributes: MetricAttributes) {
        if !self.enabled {
            return;
        }
        if attributes.is_empty() {
            self.gauge_with(name, InstrumentOptions::default()).set(value);
        } else {
            gauge!(self.qualified(name), to_labels(attributes)).set(value);
        }
    }

    /// Evaluate every registered observable-gauge callback once.
    pub(crate) fn sample_observable_gauges(&self) {
        for entry in self.gauge_callbacks.iter() {
            let value = (entry.value())();
            if let Some(handle) = self.gauges.get(entry.key()) {
                handle.set(value);
            }
        }
    }
}

enum DescribeKind {
    Counter,
    Histogram,
    Gauge,
}

fn describe(key: &str, options: InstrumentOptions, kind: DescribeKind) {
    let Some(description) = options.description else {
        return;
    };
    match (kind, options.unit) {
        (DescribeKind::Counter, Some(unit)) => {
            describe_counter!(key.to_string(), unit, description)
        }
        (DescribeKind::Counter, None) => describe_counter!(key.to_string(), description),
        (DescribeKind::Histogram, Some(unit)) => {
            describe_histogram!(key.to_string(), unit, description)
        }
        (DescribeKind::Histogram, None) => describe_histogram!(key.to_string(), description),
        (DescribeKind::Gauge, Some(unit)) => describe_gauge!(key.to_string(), unit, description),
        (DescribeKind::Gauge, None) => describe_gauge!(key.to_string(), description),
    }
}

fn to_labels(attributes: MetricAttributes) -> Vec<Label> {
    attributes
        .iter()
        .map(|(key, value)| Label::new(*key, value.clone()))
        .collect()
}
