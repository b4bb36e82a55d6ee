//! ---
//! vsim_section: "01-core-functionality"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Periodic emission scheduling and trigger handling."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::debug;
use vsim_common::time::{additional_passes, millis_to_rfc3339, now_millis};
use vsim_common::EmissionConfig;
use vsim_logging::{
    log_system_event, vsim_debug, vsim_info, vsim_warn, LogContext, SystemEventOutcome,
};
use vsim_msg::{push_batch, MessagingMetrics, Producer, ProducerSignal, TransportError};
use vsim_sim::{DeviceFleet, Event};

use crate::metrics::EmissionMetrics;
use crate::Result;

/// Message of a pass that found nothing to emit.
pub const NO_ASSETS_MESSAGE: &str = "there is no assets";

/// Lifecycle of one [`EmissionScheduler::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Draining,
    Done,
}

/// Outcome of a successful pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Zero for the immediate pass, then one per timer tick.
    pub pass: u64,
    pub delivered: usize,
    pub message: String,
}

/// Fixed-cadence timer; late ticks are pushed back rather than bursted.
#[derive(Debug)]
struct PassTimer {
    interval: Interval,
}

impl PassTimer {
    fn starting_after(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    async fn tick(&mut self) -> Instant {
        self.interval.tick().await
    }
}

/// Runs one immediate pass plus a bounded number of timed passes over a
/// device fleet, pushing each batch through a shared producer.
pub struct EmissionScheduler {
    producer: Arc<dyn Producer>,
    topic: String,
    period: Duration,
    total_passes: u64,
    pass_count: u64,
    state: SchedulerState,
    site: Option<String>,
    rng: StdRng,
    metrics: Option<EmissionMetrics>,
    messaging: Option<MessagingMetrics>,
}

impl std::fmt::Debug for EmissionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmissionScheduler")
            .field("producer", &self.producer.name())
            .field("topic", &self.topic)
            .field("period", &self.period)
            .field("total_passes", &self.total_passes)
            .field("pass_count", &self.pass_count)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl EmissionScheduler {
    pub fn new(producer: Arc<dyn Producer>, config: &EmissionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            producer,
            topic: config.topic.clone(),
            period: config.period,
            total_passes: additional_passes(config.period, config.trigger_interval),
            pass_count: 0,
            state: SchedulerState::Idle,
            site: None,
            rng,
            metrics: None,
            messaging: None,
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn with_metrics(mut self, metrics: EmissionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_messaging_metrics(mut self, metrics: MessagingMetrics) -> Self {
        self.messaging = Some(metrics);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Timed passes scheduled after the immediate one.
    pub fn total_passes(&self) -> u64 {
        self.total_passes
    }

    /// Timed passes performed so far in the current run.
    pub fn pass_count(&self) -> u64 {
        self.pass_count
    }

    /// Run until the terminal pass completes, settling with its result.
    ///
    /// Failures of earlier passes are logged and dropped. A producer error or
    /// topology signal fails the run at once, even mid-pass.
    pub async fn run(&mut self, fleet: &DeviceFleet) -> Result<PassReport> {
        self.pass_count = 0;
        self.state = SchedulerState::Running;
        let mut signals = self.producer.subscribe();
        vsim_info!(
            context = self.context(0),
            "emission run started: {} devices on `{}` every {} ms, {} timed passes",
            fleet.len(),
            self.topic,
            self.period.as_millis(),
            self.total_passes
        );

        let immediate = tokio::select! {
            biased;
            err = next_failure(&mut signals) => return self.abort(err),
            outcome = self.pass(fleet, 0) => outcome,
        };
        if self.total_passes == 0 {
            return self.settle(0, immediate);
        }
        self.note_intermediate(0, &immediate);

        let mut timer = PassTimer::starting_after(self.period);
        loop {
            tokio::select! {
                biased;
                err = next_failure(&mut signals) => return self.abort(err),
                _ = timer.tick() => {
                    self.pass_count += 1;
                    let pass = self.pass_count;
                    let terminal = pass >= self.total_passes;
                    if terminal {
                        self.state = SchedulerState::Draining;
                    }
                    let outcome = tokio::select! {
                        biased;
                        err = next_failure(&mut signals) => return self.abort(err),
                        outcome = self.pass(fleet, pass) => outcome,
                    };
                    if terminal {
                        return self.settle(pass, outcome);
                    }
                    self.note_intermediate(pass, &outcome);
                }
            }
        }
    }

    async fn pass(&mut self, fleet: &DeviceFleet, pass: u64) -> Result<PassReport> {
        let base = now_millis();
        let events = fleet.generate_batch(base, &mut self.rng);
        debug!(
            pass,
            events = events.len(),
            batch_start = millis_to_rfc3339(base).as_deref().unwrap_or("-"),
            "batch generated"
        );
        if events.is_empty() {
            debug!(pass, "{}", NO_ASSETS_MESSAGE);
            self.record_pass("empty");
            return Ok(PassReport {
                pass,
                delivered: 0,
                message: NO_ASSETS_MESSAGE.to_owned(),
            });
        }
        self.record_events(pass, &events);

        let pushed = push_batch(
            self.producer.as_ref(),
            &self.topic,
            &events,
            self.messaging.as_ref(),
        )
        .await;
        match pushed {
            Ok(delivered) => {
                self.record_pass("ok");
                Ok(PassReport {
                    pass,
                    delivered,
                    message: format!("sent {} events to {}", delivered, self.topic),
                })
            }
            Err(err) => {
                self.record_pass("failed");
                Err(err.into())
            }
        }
    }

    fn note_intermediate(&self, pass: u64, outcome: &Result<PassReport>) {
        let ctx = self.context(pass);
        match outcome {
            Ok(report) => log_system_event(
                Some(&ctx),
                "emission.pass",
                &report.message,
                SystemEventOutcome::Success,
            ),
            Err(err) => log_system_event(
                Some(&ctx),
                "emission.pass",
                &err.to_string(),
                SystemEventOutcome::Degraded,
            ),
        }
    }

    fn settle(&mut self, pass: u64, outcome: Result<PassReport>) -> Result<PassReport> {
        self.state = SchedulerState::Done;
        let ctx = self.context(pass);
        match &outcome {
            Ok(report) => log_system_event(
                Some(&ctx),
                "emission.done",
                &report.message,
                SystemEventOutcome::Success,
            ),
            Err(err) => log_system_event(
                Some(&ctx),
                "emission.done",
                &err.to_string(),
                SystemEventOutcome::Fault,
            ),
        }
        outcome
    }

    fn abort(&mut self, err: TransportError) -> Result<PassReport> {
        self.state = SchedulerState::Done;
        let ctx = self.context(self.pass_count);
        log_system_event(
            Some(&ctx),
            "emission.aborted",
            &err.to_string(),
            SystemEventOutcome::Fault,
        );
        Err(err.into())
    }

    fn context(&self, pass: u64) -> LogContext<'_> {
        let ctx = LogContext::new().with_pass(pass);
        match self.site.as_deref() {
            Some(site) => ctx.with_site(site),
            None => ctx,
        }
    }

    fn record_pass(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_pass(outcome);
        }
    }

    fn record_events(&self, pass: u64, events: &[Event]) {
        let mut per_type: BTreeMap<&'static str, usize> = BTreeMap::new();
        for event in events {
            *per_type.entry(event.device_type.as_str()).or_default() += 1;
        }
        for (device_type, count) in per_type {
            vsim_debug!(
                context = self.context(pass).with_device(device_type),
                "{} events generated",
                count
            );
            if let Some(metrics) = &self.metrics {
                metrics.record_events(device_type, count);
            }
        }
    }
}

/// Resolve with the first signal that must fail the run.
async fn next_failure(signals: &mut broadcast::Receiver<ProducerSignal>) -> TransportError {
    loop {
        match signals.recv().await {
            Ok(signal) => {
                if let Some(err) = signal.into_error() {
                    return err;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                vsim_warn!("producer signals lagged, {} skipped", skipped);
            }
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}
