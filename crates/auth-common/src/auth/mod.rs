//! Credential primitives: password digests and signed tokens

mod jwt;
mod password;

pub use jwt::{Claims, JwtService};
pub use password::{hash_password, verify_password, PasswordService};
