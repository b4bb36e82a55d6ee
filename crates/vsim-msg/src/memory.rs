//! ---
//! vsim_section: "02-messaging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Message bus producers and batch publishing."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::credentials::BusCredentials;
use crate::producer::{Connector, Producer, ProducerSignal, SIGNAL_CAPACITY};
use crate::{Result, TransportError};

/// A message accepted by the in-memory producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Destination topic.
    pub topic: String,
    /// Serialized message body.
    pub payload: String,
}

#[derive(Debug, Default)]
struct FailurePlan {
    /// Number of upcoming sends to reject.
    fail_next: usize,
    /// Once this many sends have succeeded, reject every later send.
    succeed_only: Option<usize>,
}

/// Producer retaining messages in process memory.
///
/// Supports failure injection and manual signal emission for tests and dry runs.
pub struct InMemoryProducer {
    sent: Mutex<Vec<SentMessage>>,
    plan: Mutex<FailurePlan>,
    attempts: Mutex<usize>,
    signals: broadcast::Sender<ProducerSignal>,
}

impl Default for InMemoryProducer {
    fn default() -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            sent: Mutex::new(Vec::new()),
            plan: Mutex::new(FailurePlan::default()),
            attempts: Mutex::new(0),
            signals,
        }
    }
}

impl InMemoryProducer {
    /// Create an empty producer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` sends.
    pub fn fail_next(&self, count: usize) {
        self.plan.lock().fail_next = count;
    }

    /// Accept `successes` more sends, then reject everything.
    pub fn fail_after(&self, successes: usize) {
        let delivered = self.sent.lock().len();
        self.plan.lock().succeed_only = Some(delivered + successes);
    }

    /// Broadcast a signal to every subscriber.
    pub fn emit(&self, signal: ProducerSignal) {
        // no receivers is fine
        let _ = self.signals.send(signal);
    }

    /// Messages delivered so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Number of delivered messages.
    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    /// Whether nothing has been delivered.
    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }

    /// Number of send attempts, delivered or rejected.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }

    fn should_reject(&self) -> bool {
        let mut plan = self.plan.lock();
        if plan.fail_next > 0 {
            plan.fail_next -= 1;
            return true;
        }
        match plan.succeed_only {
            Some(limit) => self.sent.lock().len() >= limit,
            None => false,
        }
    }
}

#[async_trait]
impl Producer for InMemoryProducer {
    async fn send(&self, topic: &str, message: String) -> Result<()> {
        *self.attempts.lock() += 1;
        if self.should_reject() {
            return Err(TransportError::Rejected(format!(
                "in-memory producer refused message for {}",
                topic
            )));
        }
        self.sent.lock().push(SentMessage {
            topic: topic.to_owned(),
            payload: message,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProducerSignal> {
        self.signals.subscribe()
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

/// Connector handing out one shared [`InMemoryProducer`].
#[derive(Clone, Default)]
pub struct InMemoryConnector {
    producer: Arc<InMemoryProducer>,
}

impl InMemoryConnector {
    /// Create a connector with a fresh producer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing producer so tests can keep a handle on it.
    pub fn with_producer(producer: Arc<InMemoryProducer>) -> Self {
        Self { producer }
    }

    /// The producer returned by [`Connector::connect`].
    pub fn producer(&self) -> Arc<InMemoryProducer> {
        Arc::clone(&self.producer)
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn connect(&self, credentials: &BusCredentials) -> Result<Arc<dyn Producer>> {
        debug!(brokers = %credentials.bootstrap_servers(), "in-memory producer connected");
        self.producer.emit(ProducerSignal::Ready);
        Ok(self.producer.clone() as Arc<dyn Producer>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_messages_in_order() {
        let producer = InMemoryProducer::new();
        producer.send("covsafe", "a".into()).await.unwrap();
        producer.send("covsafe", "b".into()).await.unwrap();
        let sent = producer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].payload, "a");
        assert_eq!(sent[1].topic, "covsafe");
    }

    #[tokio::test]
    async fn fail_next_rejects_a_fixed_number_of_sends() {
        let producer = InMemoryProducer::new();
        producer.fail_next(2);
        assert!(producer.send("t", "1".into()).await.is_err());
        assert!(producer.send("t", "2".into()).await.is_err());
        assert!(producer.send("t", "3".into()).await.is_ok());
        assert_eq!(producer.len(), 1);
        assert_eq!(producer.attempts(), 3);
    }

    #[tokio::test]
    async fn fail_after_rejects_everything_past_the_limit() {
        let producer = InMemoryProducer::new();
        producer.send("t", "0".into()).await.unwrap();
        producer.fail_after(1);
        assert!(producer.send("t", "1".into()).await.is_ok());
        assert!(producer.send("t", "2".into()).await.is_err());
        assert!(producer.send("t", "3".into()).await.is_err());
        assert_eq!(producer.len(), 2);
    }

    #[tokio::test]
    async fn subscribers_see_emitted_signals() {
        let connector = InMemoryConnector::new();
        let producer = connector.connect(&BusCredentials::local()).await.unwrap();
        let mut signals = producer.subscribe();
        connector
            .producer()
            .emit(ProducerSignal::Error("lost leader".into()));
        assert_eq!(
            signals.recv().await.unwrap(),
            ProducerSignal::Error("lost leader".into())
        );
    }
}
