//! Request metrics, scraped by Prometheus at `/metrics`. Named `telemetry`
//! rather than `metrics` to avoid shadowing the `metrics` crate itself.

use std::time::Duration;

pub fn init_metrics() -> metrics_exporter_prometheus::PrometheusHandle {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

pub fn record_query(mode: &str, duration: Duration) {
    metrics::counter!("txrag_queries_total", "mode" => mode.to_string()).increment(1);
    metrics::histogram!("txrag_query_duration_seconds", "mode" => mode.to_string())
        .record(duration.as_secs_f64());
}

pub fn record_ingest(document_count: usize) {
    metrics::counter!("txrag_ingests_total").increment(1);
    metrics::histogram!("txrag_ingest_document_count").record(document_count as f64);
}

pub fn record_error(error_kind: &str) {
    metrics::counter!("txrag_errors_total", "error_kind" => error_kind.to_string()).increment(1);
}
