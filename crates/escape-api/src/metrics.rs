//! Prometheus counters for answer submissions.
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
    write_conflicts: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new("escape_submissions_total", "Answer submissions by outcome"),
            &["outcome"],
        )?;
        let write_conflicts = IntCounter::new(
            "escape_write_conflicts_total",
            "Progress writes rejected by a concurrent update",
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(write_conflicts.clone()))?;

        Ok(Self {
            registry,
            submissions,
            write_conflicts,
        })
    }

    pub fn record_submission(&self, outcome: &str) {
        self.submissions.with_label_values(&[outcome]).inc();
    }

    pub fn record_conflict(&self) {
        self.write_conflicts.inc();
    }

    pub fn submissions(&self, outcome: &str) -> u64 {
        self.submissions.with_label_values(&[outcome]).get()
    }

    pub fn conflicts(&self) -> u64 {
        self.write_conflicts.get()
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
