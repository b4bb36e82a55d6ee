//! ---
//! vsim_section: "02-messaging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Message bus producers and batch publishing."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use crate::metrics::MessagingMetrics;
use crate::producer::Producer;
use crate::{Result, TransportError};

/// Serialize and send every item of `batch` to `topic`, one message each.
///
/// All items are attempted even after a failure. Returns the number of
/// delivered messages, or [`TransportError::Send`] carrying every per-message
/// error when at least one failed.
pub async fn push_batch<T: Serialize + Sync>(
    producer: &dyn Producer,
    topic: &str,
    batch: &[T],
    metrics: Option<&MessagingMetrics>,
) -> Result<usize> {
    let started = Instant::now();
    let mut errors = Vec::new();

    for (index, item) in batch.iter().enumerate() {
        let outcome = match serde_json::to_string(item) {
            Ok(message) => producer.send(topic, message).await,
            Err(err) => Err(TransportError::Json(err)),
        };
        if let Err(err) = outcome {
            warn!(producer = producer.name(), topic, index, error = %err, "message not delivered");
            errors.push(format!("#{}: {}", index, err));
        }
    }

    let total = batch.len();
    let delivered = total - errors.len();
    if let Some(metrics) = metrics {
        metrics.observe_sent(topic, delivered);
        metrics.observe_failed(topic, errors.len());
        metrics.observe_latency(topic, started.elapsed());
    }
    debug!(producer = producer.name(), topic, delivered, total, "batch pushed");

    if errors.is_empty() {
        Ok(delivered)
    } else {
        Err(TransportError::Send {
            failed: errors.len(),
            total,
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryProducer;
    use prometheus::Registry;
    use serde_json::json;

    #[tokio::test]
    async fn delivers_every_item() {
        let producer = InMemoryProducer::new();
        let batch = vec![json!({"n": 1}), json!({"n": 2})];
        let delivered = push_batch(&producer, "covsafe", &batch, None).await.unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(producer.sent()[1].payload, r#"{"n":2}"#);
    }

    #[tokio::test]
    async fn aggregates_failures_after_attempting_all() {
        let producer = InMemoryProducer::new();
        producer.fail_next(2);
        let registry = Registry::new();
        let metrics = MessagingMetrics::register(&registry).unwrap();
        let batch = vec![json!(1), json!(2), json!(3)];

        let err = push_batch(&producer, "covsafe", &batch, Some(&metrics))
            .await
            .unwrap_err();
        match err {
            TransportError::Send {
                failed,
                total,
                errors,
            } => {
                assert_eq!((failed, total), (2, 3));
                assert!(errors[0].starts_with("#0"));
                assert!(errors[1].starts_with("#1"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(producer.attempts(), 3);
        assert_eq!(producer.len(), 1);
        assert_eq!(metrics.sent_count("covsafe"), 1);
        assert_eq!(metrics.failed_count("covsafe"), 2);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let producer = InMemoryProducer::new();
        let batch: Vec<serde_json::Value> = Vec::new();
        assert_eq!(push_batch(&producer, "t", &batch, None).await.unwrap(), 0);
        assert_eq!(producer.attempts(), 0);
    }
}
