//! ---
//! vsim_section: "01-core-functionality"
//! vsim_subsection: "tests"
//! vsim_type: "test"
//! vsim_scope: "code"
//! vsim_description: "Timer-driven emission scheduler behaviour."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use anyhow::Result;
use prometheus::Registry;
use serde_json::Value;
use tokio::io::AsyncWrite;
use vsim_common::EmissionConfig;
use vsim_core::{
    CoreMetrics, EmissionError, EmissionScheduler, SchedulerState, TriggerRunner,
};
use vsim_grid_builder::{build, Blueprint};
use vsim_msg::{
    BusCredentials, InMemoryConnector, InMemoryProducer, NdjsonProducer, ProducerSignal,
    TransportError,
};
use vsim_persistence::{MemoryStore, StoreError};
use vsim_sim::DeviceFleet;

fn emission(period_ms: u64, trigger_ms: u64) -> EmissionConfig {
    EmissionConfig {
        period: Duration::from_millis(period_ms),
        trigger_interval: Duration::from_millis(trigger_ms),
        topic: "covsafe".into(),
        seed: Some(11),
    }
}

/// Sink whose first `failures` writes fail, counting completed lines afterwards.
struct FlakySink {
    failures: usize,
    lines: Arc<AtomicUsize>,
}

impl AsyncWrite for FlakySink {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.failures > 0 {
            self.failures -= 1;
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk full")));
        }
        let newlines = buf.iter().filter(|b| **b == b'\n').count();
        self.lines.fetch_add(newlines, Ordering::SeqCst);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn venue_fleet(period: Duration) -> DeviceFleet {
    let graph = build(&Blueprint::venue_default());
    DeviceFleet::from_assets(graph.iter(), period).expect("venue fleet")
}

#[tokio::test(start_paused = true)]
async fn one_immediate_and_one_timed_pass() -> Result<()> {
    let config = emission(30_000, 60_000);
    let fleet = venue_fleet(config.period);
    let producer = Arc::new(InMemoryProducer::new());
    let mut scheduler = EmissionScheduler::new(producer.clone(), &config);

    let started = tokio::time::Instant::now();
    let report = scheduler.run(&fleet).await?;
    assert_eq!(report.pass, 1);
    assert_eq!(report.delivered, fleet.len());
    assert_eq!(producer.len(), 2 * fleet.len());
    assert_eq!(started.elapsed(), Duration::from_millis(30_000));
    assert_eq!(scheduler.state(), SchedulerState::Done);

    let sent = producer.sent();
    assert!(sent.iter().all(|m| m.topic == "covsafe"));
    let first: Value = serde_json::from_str(&sent[0].payload)?;
    assert_eq!(first["eventType"], "send_data");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn terminal_pass_failure_rejects_the_run() {
    let config = emission(30_000, 60_000);
    let fleet = venue_fleet(config.period);
    let producer = Arc::new(InMemoryProducer::new());
    producer.fail_after(fleet.len());
    let mut scheduler = EmissionScheduler::new(producer.clone(), &config);

    let err = scheduler.run(&fleet).await.unwrap_err();
    match err {
        EmissionError::Transport(TransportError::Send { failed, total, .. }) => {
            assert_eq!(failed, fleet.len());
            assert_eq!(total, fleet.len());
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(producer.attempts(), 2 * fleet.len());
}

#[tokio::test(start_paused = true)]
async fn intermediate_failure_is_swallowed() -> Result<()> {
    let config = emission(30_000, 90_000);
    let fleet = venue_fleet(config.period);
    let producer = Arc::new(InMemoryProducer::new());
    producer.fail_next(1);
    let mut scheduler = EmissionScheduler::new(producer.clone(), &config);
    assert_eq!(scheduler.total_passes(), 2);

    let report = scheduler.run(&fleet).await?;
    assert_eq!(report.pass, 2);
    assert_eq!(producer.len(), 3 * fleet.len() - 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn ndjson_write_failure_on_first_pass_is_swallowed() -> Result<()> {
    let config = emission(30_000, 60_000);
    let fleet = venue_fleet(config.period);
    let lines = Arc::new(AtomicUsize::new(0));
    let sink = FlakySink {
        failures: 1,
        lines: lines.clone(),
    };
    let producer = Arc::new(NdjsonProducer::from_writer(Box::new(sink)));
    let mut scheduler = EmissionScheduler::new(producer, &config);

    let report = scheduler.run(&fleet).await?;
    assert_eq!(report.pass, 1);
    assert_eq!(report.delivered, fleet.len());
    assert_eq!(lines.load(Ordering::SeqCst), 2 * fleet.len() - 1);
    assert_eq!(scheduler.state(), SchedulerState::Done);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn single_pass_run_settles_with_the_immediate_pass() {
    let config = emission(30_000, 30_000);
    let fleet = venue_fleet(config.period);
    let producer = Arc::new(InMemoryProducer::new());
    producer.fail_next(1);
    let mut scheduler = EmissionScheduler::new(producer.clone(), &config);

    assert!(scheduler.run(&fleet).await.is_err());
    assert_eq!(producer.attempts(), fleet.len());
}

#[tokio::test(start_paused = true)]
async fn producer_error_signal_fails_the_run() {
    let config = emission(1_000, 60_000);
    let fleet = venue_fleet(config.period);
    let producer = Arc::new(InMemoryProducer::new());
    let mut scheduler = EmissionScheduler::new(producer.clone(), &config);

    let handle = tokio::spawn(async move {
        let outcome = scheduler.run(&fleet).await;
        (outcome, scheduler.pass_count())
    });
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    producer.emit(ProducerSignal::Error("broker went away".into()));

    let (outcome, passes) = handle.await.expect("join");
    assert!(matches!(
        outcome,
        Err(EmissionError::Transport(TransportError::Producer(_)))
    ));
    assert_eq!(passes, 2);
}

#[tokio::test(start_paused = true)]
async fn topology_change_fails_the_run() {
    let config = emission(1_000, 10_000);
    let fleet = venue_fleet(config.period);
    let producer = Arc::new(InMemoryProducer::new());
    let mut scheduler = EmissionScheduler::new(producer.clone(), &config);

    let handle = tokio::spawn(async move { scheduler.run(&fleet).await });
    tokio::time::sleep(Duration::from_millis(500)).await;
    producer.emit(ProducerSignal::Ready);
    producer.emit(ProducerSignal::TopologyChanged("partition moved".into()));

    assert!(matches!(
        handle.await.expect("join"),
        Err(EmissionError::Transport(TransportError::TopologyChanged(_)))
    ));
}

#[tokio::test(start_paused = true)]
async fn trigger_runner_emits_stored_venue() -> Result<()> {
    let graph = build(&Blueprint::venue_default());
    let store = Arc::new(MemoryStore::with_assets(graph.into_assets()));
    let producer = Arc::new(InMemoryProducer::new());
    let connector = Arc::new(InMemoryConnector::with_producer(producer.clone()));
    let registry = Registry::new();
    let metrics = CoreMetrics::register(&registry)?;

    let runner = TriggerRunner::new(
        emission(30_000, 60_000),
        store,
        connector,
        BusCredentials::local(),
    )
    .with_metrics(metrics.clone());
    let report = runner.run_once().await?;

    assert_eq!(report.delivered, 490);
    assert_eq!(producer.len(), 980);
    assert_eq!(metrics.emission.pass_count("ok"), 2);
    assert_eq!(metrics.emission.event_count("handwash_monitor"), 8);
    assert_eq!(metrics.emission.event_count("garbage_bin_monitor"), 18);
    assert_eq!(metrics.emission.event_count("area_people_counter"), 954);
    assert_eq!(metrics.messaging.sent_count("covsafe"), 980);
    assert_eq!(metrics.store.fetch_count("memory", true), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unreachable_store_fails_before_connecting() {
    let store = Arc::new(MemoryStore::new());
    store.set_unavailable(Some("maintenance".into()));
    let producer = Arc::new(InMemoryProducer::new());
    let connector = Arc::new(InMemoryConnector::with_producer(producer.clone()));

    let runner = TriggerRunner::new(
        emission(30_000, 60_000),
        store,
        connector,
        BusCredentials::local(),
    );
    assert!(matches!(
        runner.run_once().await,
        Err(EmissionError::Store(StoreError::Unavailable(_)))
    ));
    assert_eq!(producer.attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn empty_store_reports_no_assets() -> Result<()> {
    let connector = Arc::new(InMemoryConnector::new());
    let runner = TriggerRunner::new(
        emission(30_000, 60_000),
        Arc::new(MemoryStore::new()),
        connector.clone(),
        BusCredentials::local(),
    );
    let report = runner.run_once().await?;
    assert_eq!(report.message, vsim_core::NO_ASSETS_MESSAGE);
    assert!(connector.producer().is_empty());
    Ok(())
}
