//! Redis Pub/Sub publisher.
//!
//! Publishes request and reply envelopes to Redis channels.

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::{BusReply, BusRequest, Subject};
use redis::AsyncCommands;

/// Redis Pub/Sub publisher
#[derive(Clone, Debug)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Pool the publisher draws connections from
    #[must_use]
    pub fn pool(&self) -> &RedisPool {
        &self.pool
    }

    /// Publish a request on a subject, returning the number of receivers
    pub async fn publish_request(
        &self,
        subject: &Subject,
        request: &BusRequest,
    ) -> RedisResult<u32> {
        let payload = request.to_json()?;
        let receivers = self.publish_raw(&subject.name(), &payload).await?;

        tracing::debug!(
            subject = %subject,
            request_id = %request.id,
            receivers = receivers,
            "Published request"
        );

        Ok(receivers)
    }

    /// Publish a reply on the channel a request asked for
    pub async fn publish_reply(&self, reply_to: &str, reply: &BusReply) -> RedisResult<u32> {
        let payload = reply.to_json()?;
        let receivers = self.publish_raw(reply_to, &payload).await?;

        tracing::debug!(
            reply_to = %reply_to,
            request_id = %reply.id,
            is_error = reply.error.is_some(),
            receivers = receivers,
            "Published reply"
        );

        Ok(receivers)
    }

    /// Number of connections subscribed to `subject`
    pub async fn subscriber_count(&self, subject: &Subject) -> RedisResult<u64> {
        let mut conn = self.pool.get().await?;
        let (_, count): (String, u64) = redis::cmd("PUBSUB")
            .arg("NUMSUB")
            .arg(subject.name())
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }

    /// Publish a raw message to a channel
    pub async fn publish_raw(&self, channel: &str, message: &str) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let receivers: u32 = conn.publish(channel, message).await?;
        Ok(receivers)
    }
}
