//! ---
//! vsim_section: "01-core-functionality"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Periodic emission scheduling and trigger handling."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::sync::Arc;

use vsim_common::{AppConfig, EmissionConfig};
use vsim_logging::{log_system_event, vsim_error, vsim_info, LogContext, SystemEventOutcome};
use vsim_msg::{BusCredentials, Connector, InMemoryConnector, NdjsonConnector, NdjsonTarget};
use vsim_persistence::{fetch_assets, open_store, AssetStore, StoreParams};
use vsim_sim::{DeviceFleet, GenerationError};

use crate::metrics::CoreMetrics;
use crate::scheduler::{EmissionScheduler, PassReport};
use crate::Result;

/// One trigger invocation: fetch the graph, connect the bus, run the scheduler.
pub struct TriggerRunner {
    emission: EmissionConfig,
    store: Arc<dyn AssetStore>,
    connector: Arc<dyn Connector>,
    credentials: BusCredentials,
    site: Option<String>,
    metrics: Option<CoreMetrics>,
}

impl std::fmt::Debug for TriggerRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerRunner")
            .field("topic", &self.emission.topic)
            .field("store", &self.store.backend())
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl TriggerRunner {
    pub fn new(
        emission: EmissionConfig,
        store: Arc<dyn AssetStore>,
        connector: Arc<dyn Connector>,
        credentials: BusCredentials,
    ) -> Self {
        Self {
            emission,
            store,
            connector,
            credentials,
            site: None,
            metrics: None,
        }
    }

    /// Wire the store, connector and credentials described by `config`.
    ///
    /// Without configured brokers the local sinks run with placeholder credentials.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let store = open_store(&StoreParams::from_config(&config.store)?)?;
        let credentials = if config.bus.brokers.is_empty() {
            BusCredentials::local()
        } else {
            BusCredentials::from_config(&config.bus)?
        };
        let connector: Arc<dyn Connector> = match NdjsonTarget::from_sink(&config.bus.sink) {
            Some(target) => Arc::new(NdjsonConnector::new(target)),
            None => Arc::new(InMemoryConnector::new()),
        };
        Ok(Self::new(config.emission.clone(), store, connector, credentials)
            .with_site(config.venue.site_prefix.clone()))
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn with_metrics(mut self, metrics: CoreMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    pub fn emission(&self) -> &EmissionConfig {
        &self.emission
    }

    /// Handle one trigger. Settles with the terminal pass of the scheduler.
    pub async fn run_once(&self) -> Result<PassReport> {
        let ctx = match self.site.as_deref() {
            Some(site) => LogContext::new().with_site(site),
            None => LogContext::new(),
        };

        let assets = match fetch_assets(
            self.store.as_ref(),
            self.metrics.as_ref().map(|m| &m.store),
        )
        .await
        {
            Ok(assets) => assets,
            Err(err) => {
                log_system_event(
                    Some(&ctx),
                    "store.fetch",
                    &err.to_string(),
                    SystemEventOutcome::Fault,
                );
                return Err(err.into());
            }
        };
        let fleet = match DeviceFleet::from_assets(assets.iter(), self.emission.period) {
            Ok(fleet) => fleet,
            Err(err) => {
                let GenerationError::NoDevice { id, .. } = &err;
                vsim_error!(context = ctx.clone().with_asset(id), "{}", err);
                return Err(err.into());
            }
        };
        vsim_info!(
            context = ctx,
            "asset graph loaded: {} documents, {} devices",
            assets.len(),
            fleet.len()
        );

        let producer = self.connector.connect(&self.credentials).await?;
        let mut scheduler = EmissionScheduler::new(producer, &self.emission);
        if let Some(site) = &self.site {
            scheduler = scheduler.with_site(site.clone());
        }
        if let Some(metrics) = &self.metrics {
            scheduler = scheduler
                .with_metrics(metrics.emission.clone())
                .with_messaging_metrics(metrics.messaging.clone());
        }
        scheduler.run(&fleet).await
    }
}
