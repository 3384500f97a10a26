use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub rides_created_total: IntCounterVec,
    pub assignments_total: IntCounterVec,
    pub matching_latency_seconds: HistogramVec,
    pub assignment_duration_seconds: HistogramVec,
    pub trips_ended_total: IntCounter,
    pub trip_end_duration_seconds: Histogram,
    pub payments_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let rides_created_total = IntCounterVec::new(
            Opts::new("rides_created_total", "Ride requests created by outcome"),
            &["outcome"],
        )
        .expect("valid rides_created_total metric");

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Assignment attempts by path and outcome"),
            &["path", "outcome"],
        )
        .expect("valid assignments_total metric");

        let matching_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "matching_latency_seconds",
                "Latency of nearest-driver matching in seconds",
            ),
            &["source"],
        )
        .expect("valid matching_latency_seconds metric");

        let assignment_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "assignment_duration_seconds",
                "Duration of the assignment transaction in seconds",
            ),
            &["path"],
        )
        .expect("valid assignment_duration_seconds metric");

        let trip_end_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "trip_end_duration_seconds",
            "Duration of the trip settlement transaction in seconds",
        ))
        .expect("valid trip_end_duration_seconds metric");

        let trips_ended_total = IntCounter::new("trips_ended_total", "Trips settled")
            .expect("valid trips_ended_total metric");

        let payments_total = IntCounterVec::new(
            Opts::new("payments_total", "Payment attempts by status"),
            &["status"],
        )
        .expect("valid payments_total metric");

        registry
            .register(Box::new(rides_created_total.clone()))
            .expect("register rides_created_total");
        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(matching_latency_seconds.clone()))
            .expect("register matching_latency_seconds");
        registry
            .register(Box::new(assignment_duration_seconds.clone()))
            .expect("register assignment_duration_seconds");
        registry
            .register(Box::new(trip_end_duration_seconds.clone()))
            .expect("register trip_end_duration_seconds");
        registry
            .register(Box::new(trips_ended_total.clone()))
            .expect("register trips_ended_total");
        registry
            .register(Box::new(payments_total.clone()))
            .expect("register payments_total");

        Self {
            registry,
            rides_created_total,
            assignments_total,
            matching_latency_seconds,
            assignment_duration_seconds,
            trips_ended_total,
            trip_end_duration_seconds,
            payments_total,
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
