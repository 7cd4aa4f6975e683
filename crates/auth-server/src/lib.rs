//! # auth-server
//!
//! Process wiring for the credential service: connects the store and the bus
//! once, answers bus requests, and exposes health endpoints over HTTP.

pub mod bus;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use bus::CredentialHandler;
pub use server::run;
pub use state::AppState;
