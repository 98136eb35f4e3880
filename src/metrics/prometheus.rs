use ::metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus HTTP exporter on `port`.
/// After this call, any metrics recorded via the `metrics` crate
/// macros (counter!, gauge!) are automatically exported at /metrics.
pub fn init_metrics_server(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()?;
    Ok(())
}

// ── Feed metrics ─────────────────────────────────────────────────

/// `kind` is one of `ticker`, `ignored`, `decode_error`.
pub fn record_feed_message(kind: &'static str) {
    counter!("feed_messages_total", "kind" => kind).increment(1);
}

pub fn record_reconnect() {
    counter!("feed_reconnects_total").increment(1);
}

pub fn record_link_state(code: f64) {
    gauge!("feed_link_state").set(code);
}

// ── Snapshot metrics ─────────────────────────────────────────────

pub fn record_update_applied(entity_id: &str) {
    counter!("snapshot_updates_total", "entity" => entity_id.to_string()).increment(1);
}

/// `reason` is `symbol` or `entity`.
pub fn record_unknown(reason: &'static str) {
    counter!("snapshot_unknown_total", "reason" => reason).increment(1);
}

pub fn record_persist(outcome: &'static str) {
    counter!("snapshot_persist_total", "outcome" => outcome).increment(1);
}
