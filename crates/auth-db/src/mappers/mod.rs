//! Entity to model mappers
//!
//! - `From<Model> for Entity`: Convert database rows to domain objects
//! - `UserInsert`: Prepare entity data for insertion

mod user;

pub use user::UserInsert;
