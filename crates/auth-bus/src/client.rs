//! Request/reply client.
//!
//! Each client owns one inbox subject. Replies arriving there are routed to
//! the waiting caller by correlation id.

use std::sync::Arc;
use std::time::Duration;

use auth_common::ErrorResponse;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::pool::{RedisPool, RedisPoolError};
use crate::pubsub::{
    BusReply, BusRequest, Publisher, ReceivedMessage, Subject, SubscriberBuilder, SubscriberError,
};
use crate::Subscriber;

/// Error type for bus requests
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error(transparent)]
    Pool(#[from] RedisPoolError),

    #[error(transparent)]
    Subscriber(#[from] SubscriberError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No responders on subject {0}")]
    NoResponders(String),

    #[error("Request on {subject} timed out after {timeout:?}")]
    Timeout { subject: String, timeout: Duration },

    #[error("Client closed")]
    Closed,

    /// The responder answered with an error reply
    #[error("{0}")]
    Remote(ErrorResponse),
}

/// Result type for bus requests
pub type BusResult<T> = Result<T, BusError>;

type PendingReplies = Arc<DashMap<Uuid, oneshot::Sender<BusReply>>>;

/// Request/reply client over Redis pub/sub
pub struct BusClient {
    publisher: Publisher,
    inbox: Subject,
    pending: PendingReplies,
    router: JoinHandle<()>,
    // Keeps the inbox subscription alive
    _subscriber: Subscriber,
}

impl BusClient {
    /// Connect a client, subscribing its inbox on the server at `redis_url`
    ///
    /// `pool` and `redis_url` must point at the same Redis server.
    pub async fn connect(pool: RedisPool, redis_url: &str) -> BusResult<Self> {
        let inbox = Subject::new_inbox();
        let (subscriber, receiver) = SubscriberBuilder::new()
            .redis_url(redis_url)
            .subscribe(inbox.clone())
            .build()
            .await?;

        let pending: PendingReplies = Arc::new(DashMap::new());
        let router = tokio::spawn(route_replies(receiver, pending.clone()));

        tracing::debug!(inbox = %inbox, "Bus client connected");

        Ok(Self {
            publisher: Publisher::new(pool),
            inbox,
            pending,
            router,
            _subscriber: subscriber,
        })
    }

    /// Inbox subject replies are delivered to
    #[must_use]
    pub fn inbox(&self) -> &Subject {
        &self.inbox
    }

    /// Send a request and wait for its reply
    ///
    /// # Errors
    /// `Remote` when the responder replied with an error, `NoResponders` when
    /// nobody is subscribed to `subject`, `Timeout` when no reply arrives in time
    pub async fn request<T, R>(&self, subject: &Subject, payload: &T, timeout: Duration) -> BusResult<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = BusRequest::new(self.inbox.name(), serde_json::to_value(payload)?);
        let id = request.id;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.insert(id, reply_tx);

        let receivers = match self.publisher.publish_request(subject, &request).await {
            Ok(receivers) => receivers,
            Err(e) => {
                self.pending.remove(&id);
                return Err(e.into());
            }
        };
        if receivers == 0 {
            self.pending.remove(&id);
            return Err(BusError::NoResponders(subject.name()));
        }

        let reply = match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => return Err(BusError::Closed),
            Err(_) => {
                self.pending.remove(&id);
                return Err(BusError::Timeout {
                    subject: subject.name(),
                    timeout,
                });
            }
        };

        let data = reply.into_result().map_err(BusError::Remote)?;
        Ok(serde_json::from_value(data)?)
    }
}

impl Drop for BusClient {
    fn drop(&mut self) {
        self.router.abort();
    }
}

impl std::fmt::Debug for BusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusClient")
            .field("inbox", &self.inbox)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// Hand each reply to the caller waiting on its id
async fn route_replies(mut receiver: broadcast::Receiver<ReceivedMessage>, pending: PendingReplies) {
    loop {
        match receiver.recv().await {
            Ok(message) => dispatch_reply(&message, &pending),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped = skipped, "Bus client lagged, replies dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn dispatch_reply(message: &ReceivedMessage, pending: &PendingReplies) {
    let reply = match message.reply() {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(subject = %message.subject, error = %e, "Dropping malformed reply");
            return;
        }
    };

    match pending.remove(&reply.id) {
        Some((_, waiter)) => {
            // Caller may have timed out in the meantime
            let _ = waiter.send(reply);
        }
        None => {
            tracing::debug!(request_id = %reply.id, "Reply for unknown or expired request");
        }
    }
}
