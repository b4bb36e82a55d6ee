//! ---
//! vsim_section: "05-networking-external-interfaces"
//! vsim_subsection: "binary"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Control CLI for building the venue and emitting telemetry."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use anyhow::{Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing::info;
use vsim_common::AppConfig;
use vsim_core::{CoreMetrics, TriggerRunner};
use vsim_logging::{vsim_error, LogContext};
use vsim_persistence::write_assets;

use crate::assets::venue_graph;

/// Registry used for this invocation, when metrics are enabled.
pub fn registry_for(config: &AppConfig) -> Option<Registry> {
    config.metrics.enabled.then(Registry::new)
}

/// Dump `registry` in the text exposition format to the configured file.
pub fn write_textfile(config: &AppConfig, registry: &Registry) -> Result<()> {
    let Some(path) = &config.metrics.textfile else {
        return Ok(());
    };
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, buffer)
        .with_context(|| format!("unable to write metrics to {}", path.display()))?;
    Ok(())
}

/// Runner for `config`; a process-local store is seeded with the built venue
/// since nothing else could have populated it.
async fn prepare(config: &AppConfig, registry: Option<&Registry>) -> Result<TriggerRunner> {
    let mut runner = TriggerRunner::from_config(config)?;
    let metrics = match registry {
        Some(registry) => Some(CoreMetrics::register(registry)?),
        None => None,
    };
    if runner.store().backend() == "memory" {
        let assets = venue_graph(config)?.into_assets();
        write_assets(
            runner.store().as_ref(),
            &assets,
            metrics.as_ref().map(|m| &m.store),
        )
        .await
        .context("failed to seed in-memory store")?;
    }
    if let Some(metrics) = metrics {
        runner = runner.with_metrics(metrics);
    }
    Ok(runner)
}

pub async fn emit(config: &AppConfig) -> Result<()> {
    let registry = registry_for(config);
    let runner = prepare(config, registry.as_ref()).await?;
    let outcome = runner.run_once().await;
    if let Some(registry) = &registry {
        write_textfile(config, registry)?;
    }
    let report = outcome.context("emission run failed")?;
    info!(pass = report.pass, delivered = report.delivered, "{}", report.message);
    Ok(())
}

pub async fn serve(config: &AppConfig) -> Result<()> {
    let registry = registry_for(config);
    let runner = prepare(config, registry.as_ref()).await?;
    let mut trigger = tokio::time::interval(config.emission.trigger_interval);
    trigger.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        trigger_ms = config.emission.trigger_interval.as_millis() as u64,
        "serving emission triggers"
    );

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("interrupt received, stopping");
                break;
            }
            _ = trigger.tick() => {
                tokio::select! {
                    _ = signal::ctrl_c() => {
                        info!("interrupt received during run, stopping");
                        break;
                    }
                    outcome = runner.run_once() => match outcome {
                        Ok(report) => info!(pass = report.pass, delivered = report.delivered, "{}", report.message),
                        Err(err) => vsim_error!(context = LogContext::new().with_site(&config.venue.site_prefix), "emission run failed: {}", err),
                    }
                }
                if let Some(registry) = &registry {
                    write_textfile(config, registry)?;
                }
            }
        }
    }
    Ok(())
}
