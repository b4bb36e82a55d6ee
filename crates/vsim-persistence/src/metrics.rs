//! ---
//! vsim_section: "03-persistence-logging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Asset store abstractions and storage bindings."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use prometheus::{IntCounterVec, Opts, Registry};

use crate::Result;

/// Metrics published by the asset store adapters, labelled by backend.
#[derive(Clone)]
pub struct StoreMetrics {
    written: IntCounterVec,
    rejected: IntCounterVec,
    fetches: IntCounterVec,
}

impl StoreMetrics {
    /// Register all store metrics with the provided registry.
    pub fn register(registry: &Registry) -> Result<Self> {
        let written = IntCounterVec::new(
            Opts::new(
                "vsim_store_documents_written_total",
                "Asset documents acknowledged by the store",
            ),
            &["backend"],
        )?;
        registry.register(Box::new(written.clone()))?;

        let rejected = IntCounterVec::new(
            Opts::new(
                "vsim_store_documents_rejected_total",
                "Asset documents rejected or left unacknowledged by the store",
            ),
            &["backend"],
        )?;
        registry.register(Box::new(rejected.clone()))?;

        let fetches = IntCounterVec::new(
            Opts::new("vsim_store_fetch_total", "Full asset fetches by outcome"),
            &["backend", "outcome"],
        )?;
        registry.register(Box::new(fetches.clone()))?;

        Ok(Self {
            written,
            rejected,
            fetches,
        })
    }

    /// Add acknowledged documents.
    pub fn record_written(&self, backend: &str, count: usize) {
        self.written
            .with_label_values(&[backend])
            .inc_by(count as u64);
    }

    /// Add rejected or missing acknowledgements.
    pub fn record_rejected(&self, backend: &str, count: usize) {
        if count > 0 {
            self.rejected
                .with_label_values(&[backend])
                .inc_by(count as u64);
        }
    }

    /// Count one fetch attempt.
    pub fn record_fetch(&self, backend: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        self.fetches.with_label_values(&[backend, outcome]).inc();
    }

    /// Acknowledged document total for `backend`.
    pub fn written_count(&self, backend: &str) -> u64 {
        self.written.with_label_values(&[backend]).get()
    }

    /// Rejected document total for `backend`.
    pub fn rejected_count(&self, backend: &str) -> u64 {
        self.rejected.with_label_values(&[backend]).get()
    }

    /// Fetch attempts for `backend` with the given outcome.
    pub fn fetch_count(&self, backend: &str, ok: bool) -> u64 {
        let outcome = if ok { "ok" } else { "error" };
        self.fetches.with_label_values(&[backend, outcome]).get()
    }
}

impl std::fmt::Debug for StoreMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_outcomes_are_split() {
        let registry = Registry::new();
        let metrics = StoreMetrics::register(&registry).unwrap();
        metrics.record_fetch("memory", true);
        metrics.record_fetch("memory", false);
        metrics.record_fetch("memory", true);
        assert_eq!(metrics.fetch_count("memory", true), 2);
        assert_eq!(metrics.fetch_count("memory", false), 1);
    }

    #[test]
    fn zero_rejections_do_not_create_series() {
        let registry = Registry::new();
        let metrics = StoreMetrics::register(&registry).unwrap();
        metrics.record_written("file", 4);
        metrics.record_rejected("file", 0);
        let families = registry.gather();
        assert!(!families
            .iter()
            .any(|f| f.get_name() == "vsim_store_documents_rejected_total"));
        assert_eq!(metrics.written_count("file"), 4);
    }
}
