//! ---
//! vsim_section: "01-core-functionality"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Periodic emission scheduling and trigger handling."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use prometheus::{IntCounterVec, Opts, Registry};
use vsim_msg::MessagingMetrics;
use vsim_persistence::StoreMetrics;

use crate::Result;

/// Pass and event counters for the scheduler.
#[derive(Clone)]
pub struct EmissionMetrics {
    passes: IntCounterVec,
    events: IntCounterVec,
}

impl EmissionMetrics {
    pub fn register(registry: &Registry) -> std::result::Result<Self, prometheus::Error> {
        let passes = IntCounterVec::new(
            Opts::new("vsim_passes_total", "Emission passes by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(passes.clone()))?;

        let events = IntCounterVec::new(
            Opts::new(
                "vsim_events_generated_total",
                "Synthetic events generated per device type",
            ),
            &["device_type"],
        )?;
        registry.register(Box::new(events.clone()))?;

        Ok(Self { passes, events })
    }

    pub fn record_pass(&self, outcome: &str) {
        self.passes.with_label_values(&[outcome]).inc();
    }

    pub fn record_events(&self, device_type: &str, count: usize) {
        self.events
            .with_label_values(&[device_type])
            .inc_by(count as u64);
    }

    pub fn pass_count(&self, outcome: &str) -> u64 {
        self.passes.with_label_values(&[outcome]).get()
    }

    pub fn event_count(&self, device_type: &str) -> u64 {
        self.events.with_label_values(&[device_type]).get()
    }
}

impl std::fmt::Debug for EmissionMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmissionMetrics").finish_non_exhaustive()
    }
}

/// Every metric family of one trigger runner, registered together.
#[derive(Clone)]
pub struct CoreMetrics {
    pub emission: EmissionMetrics,
    pub messaging: MessagingMetrics,
    pub store: StoreMetrics,
}

impl CoreMetrics {
    pub fn register(registry: &Registry) -> Result<Self> {
        Ok(Self {
            emission: EmissionMetrics::register(registry)?,
            messaging: MessagingMetrics::register(registry)?,
            store: StoreMetrics::register(registry)?,
        })
    }
}

impl std::fmt::Debug for CoreMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreMetrics").finish_non_exhaustive()
    }
}
