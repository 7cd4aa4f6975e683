//! Request and reply envelopes.
//!
//! A request travels on a subject channel and names the channel its reply
//! should be published on. The reply echoes the request id so a client with
//! several requests in flight can match them up.

use auth_common::ErrorResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Request published on a subject channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusRequest {
    /// Correlation id, echoed in the reply
    pub id: Uuid,
    /// Channel the reply is published on
    pub reply_to: String,
    /// Request payload
    #[serde(default)]
    pub data: Value,
}

impl BusRequest {
    /// Create a request with a fresh correlation id
    #[must_use]
    pub fn new(reply_to: impl Into<String>, data: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            reply_to: reply_to.into(),
            data,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Reply published on the request's `reply_to` channel
///
/// Exactly one of `data` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusReply {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

impl BusReply {
    /// Successful reply
    #[must_use]
    pub fn ok(id: Uuid, data: Value) -> Self {
        Self {
            id,
            data: Some(data),
            error: None,
        }
    }

    /// Error reply
    #[must_use]
    pub fn err(id: Uuid, error: ErrorResponse) -> Self {
        Self {
            id,
            data: None,
            error: Some(error),
        }
    }

    /// Build a reply from a handler outcome
    #[must_use]
    pub fn from_result(id: Uuid, result: Result<Value, ErrorResponse>) -> Self {
        match result {
            Ok(data) => Self::ok(id, data),
            Err(error) => Self::err(id, error),
        }
    }

    /// Split the reply back into a handler outcome
    ///
    /// A reply carrying neither field decodes as `null` data.
    pub fn into_result(self) -> Result<Value, ErrorResponse> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data.unwrap_or(Value::Null)),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
