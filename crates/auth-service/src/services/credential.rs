//! Credential service
//!
//! Handles user registration, login, and token verification. Every operation
//! answers with the caller's public fields and a freshly signed token.

use auth_core::{NewUser, PublicUser};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::{AuthResponse, LoginRequest, RegisterRequest, VerifyRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Credential service
#[derive(Debug, Clone)]
pub struct CredentialService {
    ctx: ServiceContext,
}

impl CredentialService {
    /// Create a new CredentialService
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Get the service context
    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Register a new user
    ///
    /// The email pre-check is advisory; the store's unique index decides races.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<AuthResponse> {
        request.validate()?;

        if self
            .ctx
            .user_repo()
            .find_by_email(&request.email)
            .await?
            .is_some()
        {
            warn!("Registration rejected: email already registered");
            return Err(ServiceError::AlreadyExists);
        }

        let RegisterRequest {
            email,
            name,
            password,
        } = request;

        let password_hash = self.ctx.password_service().hash_async(password).await?;

        let user = self
            .ctx
            .user_repo()
            .create(NewUser::new(email, name, password_hash))
            .await
            .inspect_err(|e| {
                if e.is_conflict() {
                    warn!("Registration rejected: email claimed concurrently");
                }
            })?;

        info!(user_id = %user.id, "User registered successfully");

        self.issue(user.into_public())
    }

    /// Login with email and password
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        request.validate()?;

        let Some(user) = self.ctx.user_repo().find_by_email(&request.email).await? else {
            warn!(reason = "user_not_found", "Login failed");
            return Err(ServiceError::InvalidCredentials);
        };

        let is_valid = self
            .ctx
            .password_service()
            .verify_async(request.password, user.password_hash.clone())
            .await?;

        if !is_valid {
            warn!(reason = "password_mismatch", user_id = %user.id, "Login failed");
            return Err(ServiceError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in successfully");

        self.issue(user.into_public())
    }

    /// Verify a token and issue a fresh one over the same user
    #[instrument(skip(self, request))]
    pub async fn verify(&self, request: VerifyRequest) -> ServiceResult<AuthResponse> {
        let claims = self
            .ctx
            .jwt_service()
            .verify::<PublicUser>(&request.token)
            .map_err(|e| {
                warn!(reason = e.error_code(), "Token rejected");
                ServiceError::Unauthorized
            })?;

        let user = claims.into_subject();
        info!(user_id = %user.id, "Token verified and renewed");

        self.issue(user)
    }

    fn issue(&self, user: PublicUser) -> ServiceResult<AuthResponse> {
        let token = self.ctx.jwt_service().sign(&user)?;
        Ok(AuthResponse::new(user, token))
    }
}
