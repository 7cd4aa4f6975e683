//! Request responder.
//!
//! Subscribes to request subjects and answers each request on its own task.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use auth_common::ErrorResponse;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::pubsub::{BusReply, Publisher, ReceivedMessage, Subject, SubscriberBuilder};
use crate::{SubscriberError, SubscriberResult};

/// Requests buffered between the pub/sub connection and the dispatch loop
///
/// A lagging receiver loses requests outright, and their callers only learn
/// of it through their own timeout.
pub const RESPONDER_BUFFER: usize = 8192;

/// Answers requests arriving on the bus
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    /// Produce the reply payload for one request
    async fn handle(&self, subject: &Subject, data: Value) -> Result<Value, ErrorResponse>;
}

/// Serve requests on `subjects` until `shutdown` resolves
///
/// Redis delivers each request to every subscriber of its subject, so only one
/// responder may serve a subject at a time. Starting a second one fails with
/// [`SubscriberError::SubjectTaken`](crate::SubscriberError::SubjectTaken).
///
/// Messages that are not request envelopes have nowhere to send a reply, so
/// they are logged and dropped.
pub async fn serve<H, F>(
    redis_url: &str,
    publisher: Publisher,
    subjects: &[Subject],
    handler: Arc<H>,
    shutdown: F,
) -> SubscriberResult<()>
where
    H: RequestHandler,
    F: Future<Output = ()> + Send,
{
    for subject in subjects {
        if publisher.subscriber_count(subject).await? > 0 {
            return Err(SubscriberError::SubjectTaken(subject.name()));
        }
    }

    let (subscriber, mut receiver) = responder_subscriber(redis_url, subjects).build().await?;

    tracing::info!(
        subjects = ?subjects.iter().map(Subject::name).collect::<Vec<_>>(),
        "Bus responder listening"
    );

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            received = receiver.recv() => match received {
                Ok(message) => {
                    spawn_reply(message, publisher.clone(), handler.clone());
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::error!(
                        dropped = skipped,
                        "Bus responder lagged, requests dropped without reply"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            () = &mut shutdown => {
                tracing::info!("Bus responder stopping");
                break;
            }
        }
    }

    let _ = subscriber.shutdown().await;
    Ok(())
}

fn responder_subscriber(redis_url: &str, subjects: &[Subject]) -> SubscriberBuilder {
    subjects.iter().cloned().fold(
        SubscriberBuilder::new()
            .redis_url(redis_url)
            .broadcast_buffer(RESPONDER_BUFFER),
        SubscriberBuilder::subscribe,
    )
}

fn spawn_reply<H: RequestHandler>(message: ReceivedMessage, publisher: Publisher, handler: Arc<H>) {
    let request = match message.request() {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(subject = %message.subject, error = %e, "Dropping malformed request");
            return;
        }
    };

    tokio::spawn(async move {
        let result = handler.handle(&message.subject, request.data).await;
        let reply = BusReply::from_result(request.id, result);

        if let Err(e) = publisher.publish_reply(&request.reply_to, &reply).await {
            tracing::error!(
                subject = %message.subject,
                request_id = %request.id,
                error = %e,
                "Failed to publish reply"
            );
        }
    });
}
