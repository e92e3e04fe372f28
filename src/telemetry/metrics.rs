//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Install the Prometheus exporter on the given port
///
/// Metrics are served at `http://0.0.0.0:{port}/metrics`.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    describe();
    tracing::info!(port, "Metrics exporter listening");
    Ok(())
}

fn describe() {
    metrics::describe_counter!(
        "polymovement_book_updates_total",
        "Order book updates applied from the quote stream"
    );
    metrics::describe_counter!(
        "polymovement_signals_total",
        "Movement signals emitted by detectors"
    );
    metrics::describe_counter!(
        "polymovement_orders_filled_total",
        "Buy orders filled, including dry-run fills"
    );
    metrics::describe_gauge!(
        "polymovement_active_markets",
        "Markets under watch in the current session"
    );
    metrics::describe_gauge!(
        "polymovement_budget_remaining_usd",
        "Uncommitted session budget in dollars"
    );
}
