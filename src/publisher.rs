//! Debug publisher: pushes one message at a time to an AMQP topic.
//!
//! The transport is created and connected on the first send and then reused
//! for the lifetime of the publisher. Nothing is retried; every failure is
//! handed back to the caller as is.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{ConfigError, PublisherConfig};
use crate::encoder::{EncodeError, JsonMessageEncoder, Message, MessageEncoder};
use crate::messaging::{
    AmqpTransportFactory, Destination, ENCODER_HEADER, OutboundPackage, TRACE_HEADER, Transport,
    TransportError, TransportFactory,
};
use crate::metrics::{Metrics, STAGE_CONNECT, STAGE_ENCODE, STAGE_SEND};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    pub trace_id: Option<String>,
    pub topic: Option<String>,
    pub routing_key: Option<String>,
    pub persistent: bool,
    pub mandatory: bool,
    pub expire_after: Option<Duration>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn routing_key(mut self, routing_key: impl Into<String>) -> Self {
        self.routing_key = Some(routing_key.into());
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn expire_after(mut self, expire_after: Duration) -> Self {
        self.expire_after = Some(expire_after);
        self
    }
}

/// What went out, for the caller to print or assert on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: String,
    pub trace_id: String,
    pub destination: Destination,
    pub payload_size: usize,
}

pub struct ToolsPublisher<E = JsonMessageEncoder, F = AmqpTransportFactory>
where
    F: TransportFactory,
{
    config: PublisherConfig,
    encoder: E,
    factory: F,
    transport: Option<F::Transport>,
    metrics: Arc<Metrics>,
}

impl ToolsPublisher<JsonMessageEncoder, AmqpTransportFactory> {
    /// JSON encoder over AMQP, configured from the given env file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, PublisherError> {
        let config = PublisherConfig::from_env_file(path)?;
        Self::with_components(config, JsonMessageEncoder, AmqpTransportFactory)
    }
}

impl<E, F> ToolsPublisher<E, F>
where
    E: MessageEncoder,
    F: TransportFactory,
{
    pub fn with_components(
        config: PublisherConfig,
        encoder: E,
        factory: F,
    ) -> Result<Self, PublisherError> {
        Ok(Self {
            config,
            encoder,
            factory,
            transport: None,
            metrics: Metrics::new()?,
        })
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn send_message<M: Message>(
        &mut self,
        message: &M,
        options: SendOptions,
    ) -> Result<SendReceipt, PublisherError> {
        let start = Instant::now();

        let destination = Destination::new(
            options
                .topic
                .unwrap_or_else(|| self.config.destination_topic.clone()),
            options
                .routing_key
                .unwrap_or_else(|| self.config.destination_routing_key.clone()),
        );

        let payload = self.encoder.encode(message).map_err(|e| {
            error!(error = %e, message_type = message.message_type(), "Failed to encode message");
            self.metrics.record_failure(STAGE_ENCODE);
            e
        })?;

        let trace_id = options
            .trace_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let message_id = Uuid::new_v4().to_string();

        let mut headers = BTreeMap::new();
        headers.insert(TRACE_HEADER.to_string(), trace_id.clone());
        headers.insert(ENCODER_HEADER.to_string(), self.encoder.name().to_string());

        let payload_size = payload.len();
        let package = OutboundPackage::new(payload, headers, destination.clone(), message_id.clone())
            .with_content_type(self.encoder.content_type())
            .with_persistent(options.persistent)
            .with_mandatory(options.mandatory)
            .with_expire_after(options.expire_after);

        self.ensure_connected().await?;
        let transport = self
            .transport
            .as_mut()
            .ok_or(TransportError::NotConnected)?;

        if let Err(e) = transport.send(package).await {
            error!(error = %e, message_id = %message_id, "Failed to send message");
            self.metrics.record_failure(STAGE_SEND);
            return Err(e.into());
        }

        self.metrics
            .messages_sent_total
            .with_label_values(&[destination.topic.as_str()])
            .inc();
        self.metrics
            .send_duration_seconds
            .observe(start.elapsed().as_secs_f64());

        info!(
            topic = %destination.topic,
            routing_key = %destination.routing_key,
            message_id = %message_id,
            trace_id = %trace_id,
            payload_size,
            "Message sent"
        );

        Ok(SendReceipt {
            message_id,
            trace_id,
            destination,
            payload_size,
        })
    }

    /// Only a fully connected transport is kept; a failed attempt leaves nothing behind.
    async fn ensure_connected(&mut self) -> Result<(), PublisherError> {
        if self.transport.is_some() {
            return Ok(());
        }

        let mut transport = self
            .factory
            .create(self.config.connection_dsn.as_deref())
            .map_err(|e| {
                error!(error = %e, "Failed to create transport");
                self.metrics.record_failure(STAGE_CONNECT);
                e
            })?;

        if let Err(e) = transport.connect().await {
            error!(error = %e, "Failed to connect transport");
            self.metrics.record_failure(STAGE_CONNECT);
            return Err(e.into());
        }

        self.metrics.connections_opened_total.inc();
        debug!("Transport connected");

        self.transport = Some(transport);
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), PublisherError> {
        if let Some(mut transport) = self.transport.take() {
            transport.disconnect().await?;
            info!("Publisher transport closed");
        }
        Ok(())
    }
}

/// Blocks the calling thread until each send is confirmed.
pub struct BlockingPublisher<E = JsonMessageEncoder, F = AmqpTransportFactory>
where
    F: TransportFactory,
{
    inner: ToolsPublisher<E, F>,
    runtime: tokio::runtime::Runtime,
}

impl BlockingPublisher<JsonMessageEncoder, AmqpTransportFactory> {
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, PublisherError> {
        Self::new(ToolsPublisher::from_env_file(path)?)
    }
}

impl<E, F> BlockingPublisher<E, F>
where
    E: MessageEncoder,
    F: TransportFactory,
{
    pub fn new(inner: ToolsPublisher<E, F>) -> Result<Self, PublisherError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(PublisherError::Runtime)?;

        Ok(Self { inner, runtime })
    }

    pub fn publisher(&self) -> &ToolsPublisher<E, F> {
        &self.inner
    }

    pub fn send_message<M: Message>(
        &mut self,
        message: &M,
        options: SendOptions,
    ) -> Result<SendReceipt, PublisherError> {
        self.runtime
            .block_on(self.inner.send_message(message, options))
    }

    pub fn close(&mut self) -> Result<(), PublisherError> {
        self.runtime.block_on(self.inner.close())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to initialise metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Failed to start runtime: {0}")]
    Runtime(std::io::Error),
}
