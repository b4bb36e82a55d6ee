//! ---
//! vsim_section: "02-messaging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Message bus producers and batch publishing."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use vsim_common::config::SinkConfig;

use crate::credentials::BusCredentials;
use crate::producer::{Connector, Producer, ProducerSignal, SIGNAL_CAPACITY};
use crate::{Result, TransportError};

/// Where newline-delimited messages are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NdjsonTarget {
    /// Process stdout.
    Stdout,
    /// File opened in append mode, created when missing.
    File(PathBuf),
}

impl NdjsonTarget {
    /// Map a configured sink to a target. The memory sink has no NDJSON target.
    pub fn from_sink(sink: &SinkConfig) -> Option<Self> {
        match sink {
            SinkConfig::Stdout => Some(NdjsonTarget::Stdout),
            SinkConfig::Ndjson { path } => Some(NdjsonTarget::File(path.clone())),
            SinkConfig::Memory => None,
        }
    }
}

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Producer writing one message per line.
pub struct NdjsonProducer {
    writer: Mutex<Writer>,
    signals: broadcast::Sender<ProducerSignal>,
}

impl NdjsonProducer {
    /// Wrap an arbitrary writer.
    pub fn from_writer(writer: Writer) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            writer: Mutex::new(writer),
            signals,
        }
    }

    /// Open the producer for `target`.
    pub async fn open(target: &NdjsonTarget) -> Result<Self> {
        let writer: Writer = match target {
            NdjsonTarget::Stdout => Box::new(tokio::io::stdout()),
            NdjsonTarget::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await
                    .map_err(|err| {
                        TransportError::Connect(format!("{}: {}", path.display(), err))
                    })?;
                Box::new(file)
            }
        };
        Ok(Self::from_writer(writer))
    }
}

#[async_trait]
impl Producer for NdjsonProducer {
    async fn send(&self, topic: &str, message: String) -> Result<()> {
        let mut writer = self.writer.lock().await;
        let written = async {
            writer.write_all(message.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        }
        .await;
        if let Err(err) = written {
            warn!(topic, error = %err, "ndjson write failed");
            return Err(TransportError::Io(err));
        }
        debug!(topic, bytes = message.len(), "ndjson message written");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProducerSignal> {
        self.signals.subscribe()
    }

    fn name(&self) -> &'static str {
        "ndjson"
    }
}

/// Connector opening an [`NdjsonProducer`] per run.
#[derive(Debug, Clone)]
pub struct NdjsonConnector {
    target: NdjsonTarget,
}

impl NdjsonConnector {
    /// Create a connector for `target`.
    pub fn new(target: NdjsonTarget) -> Self {
        Self { target }
    }
}

#[async_trait]
impl Connector for NdjsonConnector {
    async fn connect(&self, credentials: &BusCredentials) -> Result<Arc<dyn Producer>> {
        let producer = NdjsonProducer::open(&self.target).await?;
        info!(
            sink = ?self.target,
            brokers = %credentials.bootstrap_servers(),
            server_name = credentials.tls_server_name().unwrap_or(""),
            "ndjson producer ready"
        );
        let _ = producer.signals.send(ProducerSignal::Ready);
        Ok(Arc::new(producer))
    }
}
