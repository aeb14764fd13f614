//! Metrics and observability utilities
//!
//! Prometheus-style metrics with a shared `citagraph_` prefix.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// HTTP requests by method, route and status
pub const REQUESTS_TOTAL: &str = "citagraph_requests_total";
pub const REQUEST_DURATION: &str = "citagraph_request_duration_seconds";
/// Library mutations by operation
pub const MUTATIONS_TOTAL: &str = "citagraph_library_mutations_total";
pub const STORE_WRITE_DURATION: &str = "citagraph_store_write_duration_seconds";
pub const PAPERS: &str = "citagraph_papers";
pub const CITATIONS: &str = "citagraph_citations";
/// Graph renders by layout and output format
pub const RENDERS_TOTAL: &str = "citagraph_graph_renders_total";
pub const RENDER_DURATION: &str = "citagraph_graph_render_duration_seconds";
pub const LOGIN_ATTEMPTS_TOTAL: &str = "citagraph_login_attempts_total";
pub const METADATA_REQUESTS_TOTAL: &str = "citagraph_metadata_requests_total";
pub const METADATA_DURATION: &str = "citagraph_metadata_duration_seconds";

/// Latency buckets (seconds) for request and render histograms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(REQUESTS_TOTAL, Unit::Count, "Total number of HTTP requests");
    describe_histogram!(REQUEST_DURATION, Unit::Seconds, "HTTP request latency in seconds");

    describe_counter!(MUTATIONS_TOTAL, Unit::Count, "Library mutations persisted to disk");
    describe_histogram!(STORE_WRITE_DURATION, Unit::Seconds, "Time to lock, write and rename the library file");
    describe_gauge!(PAPERS, Unit::Count, "Papers in the library after the last load");
    describe_gauge!(CITATIONS, Unit::Count, "Citations in the library after the last load");

    describe_counter!(RENDERS_TOTAL, Unit::Count, "Graph renders");
    describe_histogram!(RENDER_DURATION, Unit::Seconds, "Layout plus drawing time in seconds");

    describe_counter!(LOGIN_ATTEMPTS_TOTAL, Unit::Count, "Admin login attempts by outcome");

    describe_counter!(METADATA_REQUESTS_TOTAL, Unit::Count, "DOI metadata lookups");
    describe_histogram!(METADATA_DURATION, Unit::Seconds, "DOI metadata lookup latency in seconds");

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            REQUESTS_TOTAL,
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            REQUEST_DURATION,
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record a persisted mutation
pub fn record_mutation(operation: &'static str, write_secs: f64) {
    counter!(MUTATIONS_TOTAL, "operation" => operation).increment(1);
    histogram!(STORE_WRITE_DURATION).record(write_secs);
}

/// Record library size
pub fn record_library_size(papers: usize, citations: usize) {
    gauge!(PAPERS).set(papers as f64);
    gauge!(CITATIONS).set(citations as f64);
}

/// Record a graph render
pub fn record_render(duration_secs: f64, layout: &str, format: &'static str) {
    counter!(
        RENDERS_TOTAL,
        "layout" => layout.to_string(),
        "format" => format
    )
    .increment(1);

    histogram!(RENDER_DURATION, "layout" => layout.to_string()).record(duration_secs);
}

/// Record an admin login attempt
pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "rejected" };
    counter!(LOGIN_ATTEMPTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a metadata lookup
pub fn record_metadata_lookup(duration_secs: f64, provider: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        METADATA_REQUESTS_TOTAL,
        "provider" => provider.to_string(),
        "status" => status
    )
    .increment(1);

    if success {
        histogram!(METADATA_DURATION, "provider" => provider.to_string()).record(duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_helpers_without_recorder() {
        // No recorder installed: every call is a no-op and must not panic
        let metrics = RequestMetrics::start("GET", "/v1/graph");
        metrics.finish(200);
        record_mutation("add_paper", 0.002);
        record_library_size(3, 2);
        record_render(0.01, "spring", "svg");
        record_login(false);
        record_metadata_lookup(0.3, "crossref", true);
    }
}
