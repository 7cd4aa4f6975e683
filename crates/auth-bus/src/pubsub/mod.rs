//! Redis Pub/Sub module.
//!
//! Subjects, request/reply envelopes, and the publish/subscribe halves.

mod channels;
mod envelope;
mod publisher;
mod subscriber;

pub use channels::{Subject, INBOX_PREFIX, LOGIN_SUBJECT, REGISTER_SUBJECT, VERIFY_SUBJECT};
pub use envelope::{BusReply, BusRequest};
pub use publisher::Publisher;
pub use subscriber::{
    ReceivedMessage, Subscriber, SubscriberBuilder, SubscriberConfig, SubscriberError,
    SubscriberResult,
};
