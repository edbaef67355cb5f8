use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::LazyLock;

pub static SYNTH_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "voicegate_synthesis_total",
        "Synthesis requests by result",
        &["result"]
    )
    .unwrap()
});

pub static SYNTH_LATENCY: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "voicegate_synthesis_duration_seconds",
        "Provider round-trip latency in seconds",
        &["result"],
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap()
});

pub static TOKENS_RESERVED: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "voicegate_tokens_reserved_total",
        "Free-tier tokens reserved"
    )
    .unwrap()
});

pub static REFUNDS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "voicegate_refunds_total",
        "Compensating refunds after provider failure",
        &["result"]
    )
    .unwrap()
});

pub static PLAN_SYNCS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "voicegate_plan_sync_total",
        "Plan writes by source and plan",
        &["source", "plan"]
    )
    .unwrap()
});

pub static WEBHOOK_EVENTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "voicegate_webhook_events_total",
        "Billing webhook deliveries by outcome",
        &["outcome"]
    )
    .unwrap()
});

pub static SIGNATURE_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "voicegate_webhook_signature_failures_total",
        "Webhook deliveries rejected for a bad signature"
    )
    .unwrap()
});

/// Touch every metric so it shows up in `/metrics` before first use.
pub fn register_metrics() {
    LazyLock::force(&SYNTH_REQUESTS);
    LazyLock::force(&SYNTH_LATENCY);
    LazyLock::force(&TOKENS_RESERVED);
    LazyLock::force(&REFUNDS);
    LazyLock::force(&PLAN_SYNCS);
    LazyLock::force(&WEBHOOK_EVENTS);
    LazyLock::force(&SIGNATURE_FAILURES);
}

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
