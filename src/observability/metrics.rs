use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub suggestions_generated_total: IntCounter,
    pub suggestion_outcomes_total: IntCounterVec,
    pub status_transitions_total: IntCounterVec,
    pub location_updates_in_queue: IntGauge,
    pub technicians_tracked: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let suggestions_generated_total = IntCounter::new(
            "suggestions_generated_total",
            "Total ranked suggestions generated",
        )
        .expect("valid suggestions_generated_total metric");

        let suggestion_outcomes_total = IntCounterVec::new(
            Opts::new(
                "suggestion_outcomes_total",
                "Recorded suggestion outcomes by dispatcher decision",
            ),
            &["outcome"],
        )
        .expect("valid suggestion_outcomes_total metric");

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Technician status transitions by trigger and outcome",
            ),
            &["trigger", "outcome"],
        )
        .expect("valid status_transitions_total metric");

        let location_updates_in_queue = IntGauge::new(
            "location_updates_in_queue",
            "Current number of location updates awaiting the worker",
        )
        .expect("valid location_updates_in_queue metric");

        let technicians_tracked = IntGauge::new(
            "technicians_tracked",
            "Number of technicians in the registry",
        )
        .expect("valid technicians_tracked metric");

        registry
            .register(Box::new(suggestions_generated_total.clone()))
            .expect("register suggestions_generated_total");
        registry
            .register(Box::new(suggestion_outcomes_total.clone()))
            .expect("register suggestion_outcomes_total");
        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(location_updates_in_queue.clone()))
            .expect("register location_updates_in_queue");
        registry
            .register(Box::new(technicians_tracked.clone()))
            .expect("register technicians_tracked");

        Self {
            registry,
            suggestions_generated_total,
            suggestion_outcomes_total,
            status_transitions_total,
            location_updates_in_queue,
            technicians_tracked,
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
