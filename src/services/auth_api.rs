//! Trait and types for the hosted authentication service.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// What a signed-in user is allowed to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creates classes and uploads rosters, objectives and grades.
    #[default]
    Instructor,
    /// Read-only access to class results.
    Student,
}

/// Identity of an authenticated user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// A successful sign-in.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

/// Abstraction over an auth provider (e.g., a GoTrue deployment).
///
/// Failures carry the provider's message so it can be shown to the user.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, role: Role) -> Result<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Resolves an access token to its user. Errors if the token is unknown
    /// or expired.
    async fn user_for_token(&self, access_token: &str) -> Result<AuthUser>;
}
