//! Redis Pub/Sub subscriber.
//!
//! Holds one dedicated pub/sub connection, reconnecting and resubscribing on
//! failure, and fans received messages out over a broadcast channel.

use crate::pool::RedisPoolError;
use crate::pubsub::{BusReply, BusRequest, Subject};
use futures_util::StreamExt;
use redis::Client;
use std::collections::HashSet;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Error type for subscriber operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error(transparent)]
    Pool(#[from] RedisPoolError),

    #[error("Channel closed")]
    ChannelClosed,

    /// Pub/sub hands every request to every subscriber, so a subject may only
    /// have one responder
    #[error("Another responder is already subscribed to {0}")]
    SubjectTaken(String),
}

/// Result type for subscriber operations
pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// Received message from Pub/Sub
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Subject the message was received on
    pub subject: Subject,
    /// Raw payload
    pub payload: String,
}

impl ReceivedMessage {
    /// Create from raw Redis message
    fn from_redis(channel_name: &str, payload: String) -> Self {
        Self {
            subject: Subject::parse(channel_name),
            payload,
        }
    }

    /// Decode the payload as a request envelope
    pub fn request(&self) -> Result<BusRequest, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }

    /// Decode the payload as a reply envelope
    pub fn reply(&self) -> Result<BusReply, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Channel buffer size for broadcast
    pub broadcast_buffer: usize,
    /// Reconnection delay in milliseconds
    pub reconnect_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Redis Pub/Sub subscriber
///
/// Dropping the subscriber stops its background listener.
pub struct Subscriber {
    /// Broadcast sender for messages
    broadcast_tx: broadcast::Sender<ReceivedMessage>,
    /// Control channel for subscription management
    control_tx: mpsc::Sender<SubscriberCommand>,
}

/// Commands for subscription management
///
/// Subscribe carries an acknowledgement sender that fires once Redis has
/// confirmed the subscription.
#[derive(Debug)]
enum SubscriberCommand {
    Subscribe(Vec<String>, oneshot::Sender<()>),
    Shutdown,
}

impl Subscriber {
    /// Create a new subscriber and start the background listener
    #[must_use]
    pub fn new(config: SubscriberConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_buffer);
        let (control_tx, control_rx) = mpsc::channel(32);

        tokio::spawn(Self::listener_loop(config, broadcast_tx.clone(), control_rx));

        Self {
            broadcast_tx,
            control_tx,
        }
    }

    /// Background listener loop
    async fn listener_loop(
        config: SubscriberConfig,
        broadcast_tx: broadcast::Sender<ReceivedMessage>,
        mut control_rx: mpsc::Receiver<SubscriberCommand>,
    ) {
        // Channels to restore after a reconnect
        let mut subscribed = HashSet::new();

        loop {
            match Self::run_listener(&config, &mut subscribed, &broadcast_tx, &mut control_rx).await {
                Ok(true) => {
                    tracing::info!("Subscriber shutting down");
                    break;
                }
                Ok(false) => {
                    tracing::warn!("Pub/Sub stream ended, reconnecting...");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Subscriber error, reconnecting...");
                    tokio::time::sleep(tokio::time::Duration::from_millis(
                        config.reconnect_delay_ms,
                    ))
                    .await;
                }
            }
        }
    }

    /// Run the listener until error or shutdown
    ///
    /// Returns `Ok(true)` on shutdown and `Ok(false)` when the stream ends.
    async fn run_listener(
        config: &SubscriberConfig,
        subscribed: &mut HashSet<String>,
        broadcast_tx: &broadcast::Sender<ReceivedMessage>,
        control_rx: &mut mpsc::Receiver<SubscriberCommand>,
    ) -> SubscriberResult<bool> {
        let client = Client::open(config.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        // Resubscribe after a reconnect
        for channel in subscribed.iter() {
            pubsub.subscribe(channel).await?;
        }

        tracing::info!("Subscriber connected to Redis");

        let mut stream = pubsub.on_message();

        loop {
            tokio::select! {
                msg = stream.next() => {
                    let Some(msg) = msg else {
                        return Ok(false);
                    };
                    let channel_name = msg.get_channel_name().to_string();
                    let payload: String = msg.get_payload().unwrap_or_default();

                    tracing::trace!(channel = %channel_name, "Received Pub/Sub message");

                    // No receivers is not an error
                    let _ = broadcast_tx.send(ReceivedMessage::from_redis(&channel_name, payload));
                }

                cmd = control_rx.recv() => {
                    match cmd {
                        Some(SubscriberCommand::Subscribe(channels, ack)) => {
                            drop(stream);
                            for channel in &channels {
                                pubsub.subscribe(channel).await?;
                                subscribed.insert(channel.clone());
                                tracing::debug!(channel = %channel, "Subscribed to channel");
                            }
                            let _ = ack.send(());
                            stream = pubsub.on_message();
                        }
                        Some(SubscriberCommand::Shutdown) | None => {
                            return Ok(true);
                        }
                    }
                }
            }
        }
    }

    /// Subscribe to subjects, returning once Redis has confirmed
    pub async fn subscribe(&self, subjects: &[Subject]) -> SubscriberResult<()> {
        let channel_names: Vec<String> = subjects.iter().map(Subject::name).collect();
        let (ack_tx, ack_rx) = oneshot::channel();

        self.control_tx
            .send(SubscriberCommand::Subscribe(channel_names, ack_tx))
            .await
            .map_err(|_| SubscriberError::ChannelClosed)?;
        ack_rx.await.map_err(|_| SubscriberError::ChannelClosed)
    }

    /// Get a receiver for broadcast messages
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.broadcast_tx.subscribe()
    }

    /// Shutdown the subscriber
    pub async fn shutdown(&self) -> SubscriberResult<()> {
        self.control_tx
            .send(SubscriberCommand::Shutdown)
            .await
            .map_err(|_| SubscriberError::ChannelClosed)
    }
}

/// Builder for subscriber
pub struct SubscriberBuilder {
    config: SubscriberConfig,
    initial_subjects: Vec<Subject>,
}

impl SubscriberBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SubscriberConfig::default(),
            initial_subjects: Vec::new(),
        }
    }

    /// Set Redis URL
    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = url.into();
        self
    }

    /// Set broadcast buffer size
    #[must_use]
    pub fn broadcast_buffer(mut self, size: usize) -> Self {
        self.config.broadcast_buffer = size;
        self
    }

    /// Set reconnection delay
    #[must_use]
    pub fn reconnect_delay_ms(mut self, delay: u64) -> Self {
        self.config.reconnect_delay_ms = delay;
        self
    }

    /// Configuration the subscriber will be built with
    #[must_use]
    pub fn config(&self) -> &SubscriberConfig {
        &self.config
    }

    /// Subjects subscribed before `build` returns
    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.initial_subjects
    }

    /// Add initial subject subscription
    #[must_use]
    pub fn subscribe(mut self, subject: Subject) -> Self {
        self.initial_subjects.push(subject);
        self
    }

    /// Build the subscriber and wait for the initial subscriptions
    ///
    /// Returns the subscriber with a receiver that already sees messages on
    /// the initial subjects.
    pub async fn build(
        self,
    ) -> SubscriberResult<(Subscriber, broadcast::Receiver<ReceivedMessage>)> {
        let subscriber = Subscriber::new(self.config);
        let receiver = subscriber.receiver();

        if !self.initial_subjects.is_empty() {
            subscriber.subscribe(&self.initial_subjects).await?;
        }

        Ok((subscriber, receiver))
    }
}

impl Default for SubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}
