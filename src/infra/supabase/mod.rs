//! Clients for the hosted backend: PostgREST-style tables under
//! `<url>/rest/v1` and GoTrue-style auth under `<url>/auth/v1`.

mod auth;
mod rest;

pub use auth::RestAuth;
pub use rest::RestStore;
