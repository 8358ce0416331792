//! Sign-up, sign-in and the per-request authentication context.

use axum::{
    Json,
    async_trait,
    extract::{FromRequestParts, State, rejection::JsonRejection},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ApiError, AppState};
use crate::models::Class;
use crate::services::{AuthUser, Role};

/// The signed-in user of the current request.
///
/// Extracted from `Authorization: Bearer <token>` by asking the auth
/// service who the token belongs to. Handlers that take this argument
/// reject anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthUser,
}

impl AuthContext {
    pub fn require_instructor(&self) -> Result<(), ApiError> {
        match self.user.role {
            Role::Instructor => Ok(()),
            Role::Student => Err(ApiError::Forbidden("Only instructors can do that")),
        }
    }

    pub fn owns(&self, class: &Class) -> bool {
        self.user.role == Role::Instructor && class.instructor_id == self.user.id
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;
        match state.auth.user_for_token(token).await {
            Ok(user) => Ok(AuthContext { user }),
            Err(e) => {
                warn!(error = %e, "Rejected access token");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    /// Chosen by the caller. A student account can only read classes whose
    /// roster lists its email, so picking the role grants no data access.
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Outcome of a sign-up or sign-in. Failures are reported in-band with
/// `success: false` and the provider's message.
#[derive(Debug, Serialize, Default)]
pub struct SessionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl SessionResponse {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
            ..Self::default()
        }
    }
}

/// POST /api/signup
pub async fn signup(
    State(state): State<AppState>,
    req: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(req) = req?;
    let response = match state.auth.sign_up(&req.email, &req.password, req.role).await {
        Ok(user) => {
            info!(user_id = %user.id, role = ?user.role, "User signed up");
            SessionResponse {
                success: true,
                role: Some(user.role),
                ..SessionResponse::default()
            }
        }
        Err(e) => {
            warn!(error = %e, "Sign-up failed");
            SessionResponse::failed(e.to_string())
        }
    };
    Ok(Json(response))
}

/// POST /api/signin
pub async fn signin(
    State(state): State<AppState>,
    req: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(req) = req?;
    let response = match state.auth.sign_in(&req.email, &req.password).await {
        Ok(session) => SessionResponse {
            success: true,
            access_token: Some(session.access_token),
            role: Some(session.user.role),
            ..SessionResponse::default()
        },
        Err(e) => {
            warn!(error = %e, "Sign-in failed");
            SessionResponse::failed(e.to_string())
        }
    };
    Ok(Json(response))
}
