//! # auth-service
//!
//! Application layer: the credential service and the DTOs it exchanges.

pub mod dto;
pub mod services;

pub use dto::{
    AuthResponse, HealthChecks, HealthResponse, LoginRequest, ReadinessResponse, RegisterRequest,
    VerifyRequest,
};
pub use services::{
    CredentialService, ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult,
};
