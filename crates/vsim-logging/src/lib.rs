//! ---
//! vsim_section: "03-persistence-logging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Structured logging context and lifecycle events."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Structured logging helpers shared by the simulation crates.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber suitable for tests and ad-hoc tools.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Site prefix the event relates to.
    pub site: Option<&'a str>,
    /// Asset identifier, if the event concerns a single asset.
    pub asset: Option<&'a str>,
    /// Device type label (`area`, `garbage-bin`, ...).
    pub device: Option<&'a str>,
    /// Emission pass number within a trigger run.
    pub pass: Option<u64>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a site prefix.
    pub fn with_site(mut self, site: &'a str) -> Self {
        self.site = Some(site);
        self
    }

    /// Attach an asset identifier.
    pub fn with_asset(mut self, asset: &'a str) -> Self {
        self.asset = Some(asset);
        self
    }

    /// Attach a device type label.
    pub fn with_device(mut self, device: &'a str) -> Self {
        self.device = Some(device);
        self
    }

    /// Attach a pass number.
    pub fn with_pass(mut self, pass: u64) -> Self {
        self.pass = Some(pass);
        self
    }
}

/// High-level outcome used when emitting lifecycle log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The operation completed successfully.
    Success,
    /// The operation completed but something was skipped or partially applied.
    Degraded,
    /// The operation failed or was aborted.
    Fault,
}

impl SystemEventOutcome {
    /// Stable label used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Degraded => "degraded",
            SystemEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized lifecycle event (`store.fetch`, `emission.pass`, ...).
pub fn log_system_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let default_ctx = LogContext::default();
    let ctx = context.unwrap_or(&default_ctx);
    macro_rules! emit {
        ($lvl:expr) => {
            tracing::event!(
                $lvl,
                event,
                outcome = outcome.as_str(),
                site = ctx.site.unwrap_or(""),
                asset = ctx.asset.unwrap_or(""),
                device = ctx.device.unwrap_or(""),
                pass = ctx.pass.unwrap_or_default(),
                message = %message
            )
        };
    }
    match outcome {
        SystemEventOutcome::Success => emit!(Level::INFO),
        SystemEventOutcome::Degraded => emit!(Level::WARN),
        SystemEventOutcome::Fault => emit!(Level::ERROR),
    }
}
