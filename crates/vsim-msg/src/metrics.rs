//! ---
//! vsim_section: "02-messaging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Message bus producers and batch publishing."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::time::Duration;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

/// Prometheus metric handles for bus publishing, labelled by topic.
#[derive(Clone)]
pub struct MessagingMetrics {
    sent: IntCounterVec,
    failed: IntCounterVec,
    latency: HistogramVec,
}

impl MessagingMetrics {
    /// Register messaging metrics with the provided registry.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let sent = IntCounterVec::new(
            Opts::new("vsim_messages_sent_total", "Messages accepted by the producer"),
            &["topic"],
        )?;
        let failed = IntCounterVec::new(
            Opts::new(
                "vsim_messages_failed_total",
                "Messages the producer failed to deliver",
            ),
            &["topic"],
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new(
                "vsim_publish_latency_seconds",
                "Time spent publishing one batch",
            ),
            &["topic"],
        )?;

        registry.register(Box::new(sent.clone()))?;
        registry.register(Box::new(failed.clone()))?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            sent,
            failed,
            latency,
        })
    }

    /// Record delivered messages.
    pub fn observe_sent(&self, topic: &str, count: usize) {
        self.sent.with_label_values(&[topic]).inc_by(count as u64);
    }

    /// Record failed messages.
    pub fn observe_failed(&self, topic: &str, count: usize) {
        self.failed.with_label_values(&[topic]).inc_by(count as u64);
    }

    /// Record how long a batch took to publish.
    pub fn observe_latency(&self, topic: &str, duration: Duration) {
        self.latency
            .with_label_values(&[topic])
            .observe(duration.as_secs_f64());
    }

    /// Delivered message count for `topic`.
    pub fn sent_count(&self, topic: &str) -> u64 {
        self.sent.with_label_values(&[topic]).get()
    }

    /// Failed message count for `topic`.
    pub fn failed_count(&self, topic: &str) -> u64 {
        self.failed.with_label_values(&[topic]).get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_record_counts() {
        let registry = Registry::new();
        let metrics = MessagingMetrics::register(&registry).expect("register metrics");
        metrics.observe_sent("covsafe", 3);
        metrics.observe_failed("covsafe", 1);
        metrics.observe_latency("covsafe", Duration::from_millis(10));

        assert_eq!(metrics.sent_count("covsafe"), 3);
        assert_eq!(metrics.failed_count("covsafe"), 1);
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "vsim_messages_sent_total"));
    }

    #[test]
    fn double_registration_fails() {
        let registry = Registry::new();
        MessagingMetrics::register(&registry).unwrap();
        assert!(MessagingMetrics::register(&registry).is_err());
    }
}
