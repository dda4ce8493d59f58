use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub bookings_total: IntCounterVec,
    pub status_updates_total: IntCounterVec,
    pub backend_request_seconds: HistogramVec,
    pub active_wizards: IntGauge,
    pub active_sessions: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let bookings_total = IntCounterVec::new(
            Opts::new("bookings_total", "Booking submissions by outcome"),
            &["outcome"],
        )
        .expect("valid bookings_total metric");

        let status_updates_total = IntCounterVec::new(
            Opts::new("status_updates_total", "Admin order status changes by outcome"),
            &["outcome"],
        )
        .expect("valid status_updates_total metric");

        let backend_request_seconds = HistogramVec::new(
            HistogramOpts::new(
                "backend_request_seconds",
                "Latency of calls to the FreshPress backend in seconds",
            ),
            &["endpoint", "outcome"],
        )
        .expect("valid backend_request_seconds metric");

        let active_wizards = IntGauge::new("active_wizards", "Booking wizards currently held")
            .expect("valid active_wizards metric");

        let active_sessions = IntGauge::new("active_sessions", "Signed-in sessions currently held")
            .expect("valid active_sessions metric");

        registry
            .register(Box::new(bookings_total.clone()))
            .expect("register bookings_total");
        registry
            .register(Box::new(status_updates_total.clone()))
            .expect("register status_updates_total");
        registry
            .register(Box::new(backend_request_seconds.clone()))
            .expect("register backend_request_seconds");
        registry
            .register(Box::new(active_wizards.clone()))
            .expect("register active_wizards");
        registry
            .register(Box::new(active_sessions.clone()))
            .expect("register active_sessions");

        Self {
            registry,
            bookings_total,
            status_updates_total,
            backend_request_seconds,
            active_wizards,
            active_sessions,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
