use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"]
    ).expect("metric can be created");

    pub static ref HTTP_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("http_request_duration_seconds", "HTTP request duration in seconds")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("metric can be created");

    // Contest metrics
    pub static ref CONTESTS_CREATED: IntCounter = IntCounter::new(
        "contests_created_total",
        "Total contests created"
    ).expect("metric can be created");

    pub static ref CONTESTS_ENDED: IntCounter = IntCounter::new(
        "contests_ended_total",
        "Total contests ended"
    ).expect("metric can be created");

    pub static ref SUBMISSIONS_ACCEPTED: IntCounter = IntCounter::new(
        "submissions_accepted_total",
        "Total submissions accepted"
    ).expect("metric can be created");

    pub static ref VOTES_RECORDED: IntCounter = IntCounter::new(
        "votes_recorded_total",
        "Total votes recorded"
    ).expect("metric can be created");

    pub static ref VOTES_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("votes_rejected_total", "Total votes rejected"),
        &["reason"]
    ).expect("metric can be created");

    // Upstream metrics
    pub static ref UPSTREAM_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("upstream_requests_total", "Total chain and pinning requests"),
        &["service", "status"]
    ).expect("metric can be created");
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    // HTTP metrics
    registry.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    registry.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;

    // Contest metrics
    registry.register(Box::new(CONTESTS_CREATED.clone()))?;
    registry.register(Box::new(CONTESTS_ENDED.clone()))?;
    registry.register(Box::new(SUBMISSIONS_ACCEPTED.clone()))?;
    registry.register(Box::new(VOTES_RECORDED.clone()))?;
    registry.register(Box::new(VOTES_REJECTED.clone()))?;

    // Upstream metrics
    registry.register(Box::new(UPSTREAM_REQUESTS.clone()))?;

    Ok(())
}

/// Register with the process registry once at startup
pub fn init() -> Result<(), prometheus::Error> {
    register_metrics(&REGISTRY)
}

/// Record one upstream call outcome
pub fn observe_upstream<T, E>(service: &str, result: &Result<T, E>) {
    let status = if result.is_ok() { "ok" } else { "error" };
    UPSTREAM_REQUESTS.with_label_values(&[service, status]).inc();
}

/// Generate metrics output in Prometheus text format
pub fn metrics_handler() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
