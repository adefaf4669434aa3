use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    // Checkout metrics
    pub static ref CHECKOUTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("checkouts_total", "Checkout attempts by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    pub static ref CHECKOUT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("checkout_duration_seconds", "Duration of the checkout atomic unit")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0])
    ).expect("metric can be created");

    pub static ref ORDER_VALUE: Histogram = Histogram::with_opts(
        HistogramOpts::new("order_value_distribution", "Distribution of committed order totals")
            .buckets(vec![500.0, 1000.0, 2500.0, 5000.0, 10000.0, 25000.0, 50000.0, 100000.0])
    ).expect("metric can be created");

    pub static ref DECLARED_TOTAL_MISMATCHES: IntCounter = IntCounter::new(
        "declared_total_mismatches_total",
        "Checkouts whose client-declared total differed from the computed total"
    ).expect("metric can be created");

    pub static ref IDEMPOTENT_REPLAYS: IntCounter = IntCounter::new(
        "checkout_idempotent_replays_total",
        "Checkouts answered from a stored idempotency record"
    ).expect("metric can be created");

    // Wallet metrics
    pub static ref LEDGER_ENTRIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("ledger_entries_total", "Ledger entries appended by kind"),
        &["kind"]
    ).expect("metric can be created");

    pub static ref TOPUPS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("topups_total", "Top-up attempts by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    // Notification metrics
    pub static ref NATS_MESSAGES_PUBLISHED: IntCounterVec = IntCounterVec::new(
        Opts::new("nats_messages_published_total", "Total NATS messages published"),
        &["subject", "status"]
    ).expect("metric can be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        register_metrics(&registry).expect("metrics can be registered");
        registry
    };
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(CHECKOUTS_TOTAL.clone()))?;
    registry.register(Box::new(CHECKOUT_DURATION.clone()))?;
    registry.register(Box::new(ORDER_VALUE.clone()))?;
    registry.register(Box::new(DECLARED_TOTAL_MISMATCHES.clone()))?;
    registry.register(Box::new(IDEMPOTENT_REPLAYS.clone()))?;

    registry.register(Box::new(LEDGER_ENTRIES_TOTAL.clone()))?;
    registry.register(Box::new(TOPUPS_TOTAL.clone()))?;

    registry.register(Box::new(NATS_MESSAGES_PUBLISHED.clone()))?;

    Ok(())
}

/// Generate metrics output in Prometheus text format
pub fn metrics_handler() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
