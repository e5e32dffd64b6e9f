use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static NOTES_ADDED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "user_notes_added_total",
        "Total notes appended to user note lists"
    )
    .expect("register notes_added_total")
});

pub static NOTES_REMOVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "user_notes_removed_total",
        "Total notes removed from user note lists"
    )
    .expect("register notes_removed_total")
});

pub static SYSTEM_NOTES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "user_notes_system_notes_total",
        "System notes generated from moderation events, by event kind",
        &["kind"]
    )
    .expect("register system_notes_total")
});

pub static EVENT_HANDLER_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "user_notes_event_handler_failures_total",
        "Moderation event handler invocations that returned an error"
    )
    .expect("register event_handler_failures_total")
});

/// Render the default registry in the Prometheus text format.
pub fn encode_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("metrics encode error: {e}"))?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}

/// Touch every counter so they appear in the first scrape, even at zero.
pub fn register_all() {
    Lazy::force(&NOTES_ADDED_TOTAL);
    Lazy::force(&NOTES_REMOVED_TOTAL);
    Lazy::force(&SYSTEM_NOTES_TOTAL);
    Lazy::force(&EVENT_HANDLER_FAILURES_TOTAL);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_counters_are_exported() {
        register_all();
        let text = encode_metrics().unwrap();
        assert!(text.contains("user_notes_added_total"));
        assert!(text.contains("user_notes_event_handler_failures_total"));
    }
}
