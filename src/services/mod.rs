//! Ports to the external backend: relational storage and authentication.

pub mod auth_api;
pub mod store;

pub use auth_api::{AuthApi, AuthUser, Role, Session};
pub use store::GradebookStore;
