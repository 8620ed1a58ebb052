//! Fixed-name recorders for HTTP traffic.

use metrics::Unit;

use crate::metrics::registry::{InstrumentOptions, MetricRegistry};

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_ERRORS_TOTAL: &str = "http_request_errors_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const HTTP_REQUEST_SIZE_BYTES: &str = "http_request_size_bytes";
pub const HTTP_RESPONSE_SIZE_BYTES: &str = "http_response_size_bytes";

/// Labels shared by the HTTP instruments.
pub struct HttpLabels {
    pub method: String,
    pub route: String,
    pub status: u16,
}

impl HttpLabels {
    fn as_attributes(&self) -> [(&'static str, String); 3] {
        [
            ("method", self.method.clone()),
            ("route", self.route.clone()),
            ("status", self.status.to_string()),
        ]
    }
}

impl MetricRegistry {
    /// Register descriptions and units for the HTTP instruments. Called once
    /// at startup so the scrape output carries help texts.
    pub(crate) fn describe_http_instruments(&self) {
        if !self.is_enabled() {
            return;
        }
        self.counter_with(
            HTTP_REQUESTS_TOTAL,
            InstrumentOptions::described("Completed HTTP requests"),
        );
        self.counter_with(
            HTTP_REQUEST_ERRORS_TOTAL,
            InstrumentOptions::described("Failed HTTP requests"),
        );
        self.histogram_with(
            HTTP_REQUEST_DURATION_SECONDS,
            InstrumentOptions::described("HTTP request latency").with_unit(Unit::Seconds),
        );
        self.histogram_with(
            HTTP_REQUEST_SIZE_BYTES,
            InstrumentOptions::described("HTTP request body size").with_unit(Unit::Bytes),
        );
        self.histogram_with(
            HTTP_RESPONSE_SIZE_BYTES,
            InstrumentOptions::described("HTTP response body size").with_unit(Unit::Bytes),
        );
    }

    /// Count one completed request.
    pub fn increment_http_requests(&self, labels: &HttpLabels) {
        self.increment_counter(HTTP_REQUESTS_TOTAL, 1, &labels.as_attributes());
    }

    /// Count one failed request.
    pub fn increment_http_errors(&self, labels: &HttpLabels) {
        self.increment_counter(HTTP_REQUEST_ERRORS_TOTAL, 1, &labels.as_attributes());
    }

    /// Record end-to-end request latency in seconds.
    pub fn record_http_request_duration(&self, seconds: f64, labels: &HttpLabels) {
        self.record_histogram(HTTP_REQUEST_DURATION_SECONDS, seconds, &labels.as_attributes());
    }

    /// Record the inbound body size in bytes.
    pub fn record_http_request_size(&self, bytes: f64, labels: &HttpLabels) {
        self.record_histogram(HTTP_REQUEST_SIZE_BYTES, bytes, &labels.as_attributes());
    }

    /// Record the outbound body size in bytes.
    pub fn record_http_response_size(&self, bytes: f64, labels: &HttpLabels) {
        self.record_histogram(HTTP_RESPONSE_SIZE_BYTES, bytes, &labels.as_attributes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    #[test]
    fn http_recorders_use_fixed_names_and_labels() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, || {
            let registry = MetricRegistry::new(true, "");
            let labels = HttpLabels {
                method: "GET".to_string(),
                route: "/orders/{id}".to_string(),
                status: 200,
            };
            registry.increment_http_requests(&labels);
            registry.record_http_request_duration(0.021, &labels);
        });

        let snapshot = snapshotter.snapshot().into_vec();
        let (key, _, _, value) = snapshot
            .iter()
            .find(|(key, _, _, _)| key.key().name() == HTTP_REQUESTS_TOTAL)
            .unwrap();
        assert_eq!(*value, DebugValue::Counter(1));
        assert!(key
            .key()
            .labels()
            .any(|label| label.key() == "route" && label.value() == "/orders/{id}"));
        assert!(snapshot
            .iter()
            .any(|(key, _, _, _)| key.key().name() == HTTP_REQUEST_DURATION_SECONDS));
    }
}
