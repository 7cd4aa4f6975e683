//! Data transfer objects for bus requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for bus payloads
//! - Response DTOs for replies and the health surface

pub mod requests;
pub mod responses;

pub use requests::{LoginRequest, RegisterRequest, VerifyRequest};
pub use responses::{AuthResponse, HealthChecks, HealthResponse, ReadinessResponse};
