//! Business logic services
//!
//! The credential service and the dependency container it runs on.

pub mod context;
pub mod credential;
pub mod error;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use credential::CredentialService;
pub use error::{ServiceError, ServiceResult};
