use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};
use std::sync::LazyLock;

/// Callback deliveries by reply outcome:
/// `ok`, `duplicate`, `in_progress`, `bad_hash`, `ignored`, `handler_error`,
/// `ledger_error`.
pub static CALLBACKS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "paytr_callback_notifications_total",
        "Payment notifications received, by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Verified, first-time notifications by payment status.
pub static PAYMENT_EVENTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "paytr_callback_payment_events_total",
        "Payment events passed to the business handler",
        &["status"]
    )
    .unwrap()
});

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
