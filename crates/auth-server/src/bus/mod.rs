//! Bus request dispatch
//!
//! Routes each subject to the matching credential operation and turns the
//! outcome into a reply payload.

use std::sync::Arc;

use async_trait::async_trait;
use auth_bus::{RequestHandler, Subject};
use auth_common::ErrorResponse;
use auth_service::{AuthResponse, CredentialService, ServiceError, ServiceResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

/// Answers `auth.*` requests with the credential service
#[derive(Debug, Clone)]
pub struct CredentialHandler {
    service: Arc<CredentialService>,
}

impl CredentialHandler {
    pub fn new(service: Arc<CredentialService>) -> Self {
        Self { service }
    }

    async fn dispatch(&self, subject: &Subject, data: Value) -> Option<ServiceResult<AuthResponse>> {
        let outcome = match subject {
            Subject::Register => match decode(data) {
                Ok(request) => self.service.register(request).await,
                Err(e) => Err(e),
            },
            Subject::Login => match decode(data) {
                Ok(request) => self.service.login(request).await,
                Err(e) => Err(e),
            },
            Subject::Verify => match decode(data) {
                Ok(request) => self.service.verify(request).await,
                Err(e) => Err(e),
            },
            Subject::Inbox(_) | Subject::Custom(_) => return None,
        };
        Some(outcome)
    }
}

#[async_trait]
impl RequestHandler for CredentialHandler {
    #[instrument(skip(self, data), fields(subject = %subject))]
    async fn handle(&self, subject: &Subject, data: Value) -> Result<Value, ErrorResponse> {
        let Some(outcome) = self.dispatch(subject, data).await else {
            warn!("Request on unknown subject");
            return Err(ErrorResponse::new(404, format!("Unknown subject: {subject}")));
        };

        match outcome {
            Ok(response) => serde_json::to_value(response).map_err(|e| {
                error!(error = %e, "Failed to encode reply");
                ErrorResponse::internal()
            }),
            Err(e) => {
                if e.is_server_error() {
                    error!(error = %e, code = e.error_code(), "Request failed");
                } else {
                    debug!(error = %e, code = e.error_code(), "Request rejected");
                }
                Err(ErrorResponse::from(&e))
            }
        }
    }
}

/// Decode a request payload, reporting shape errors as validation failures
fn decode<T: DeserializeOwned>(data: Value) -> ServiceResult<T> {
    serde_json::from_value(data).map_err(|e| ServiceError::validation(format!("Invalid payload: {e}")))
}
