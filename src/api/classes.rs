//! Class management and access checks.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

use super::{ApiError, AppState, AuthContext};
use crate::models::Class;
use crate::services::Role;

#[derive(Debug, Deserialize)]
pub struct NewClassRequest {
    pub name: String,
}

/// Loads a class or fails with 404.
pub(crate) async fn load_class(state: &AppState, class_id: i64) -> Result<Class, ApiError> {
    state
        .store
        .find_class(class_id)
        .await?
        .ok_or(ApiError::ClassNotFound(class_id))
}

/// A class the caller may modify: only its instructor qualifies.
pub(crate) async fn owned_class(
    state: &AppState,
    auth: &AuthContext,
    class_id: i64,
) -> Result<Class, ApiError> {
    auth.require_instructor()?;
    let class = load_class(state, class_id).await?;
    if !auth.owns(&class) {
        return Err(ApiError::Forbidden("You do not teach this class"));
    }
    Ok(class)
}

/// A class the caller may read: its instructor, or a student whose sign-in
/// email is on the class roster.
pub(crate) async fn viewable_class(
    state: &AppState,
    auth: &AuthContext,
    class_id: i64,
) -> Result<Class, ApiError> {
    let class = load_class(state, class_id).await?;
    match auth.user.role {
        Role::Instructor if auth.owns(&class) => Ok(class),
        Role::Instructor => Err(ApiError::Forbidden("You do not teach this class")),
        Role::Student => {
            let email = auth.user.email.to_lowercase();
            if !email.is_empty() && state.store.is_enrolled(class.id, &email).await? {
                Ok(class)
            } else {
                Err(ApiError::Forbidden("You are not enrolled in this class"))
            }
        }
    }
}

/// GET /api/classes
pub async fn list_classes(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<Class>>, ApiError> {
    auth.require_instructor()?;
    Ok(Json(state.store.list_classes(&auth.user.id).await?))
}

/// POST /api/classes
pub async fn create_class(
    State(state): State<AppState>,
    auth: AuthContext,
    req: Result<Json<NewClassRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Class>), ApiError> {
    auth.require_instructor()?;
    let Json(req) = req?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Class name must not be empty".to_string()));
    }

    let class = state.store.create_class(&auth.user.id, name).await?;
    info!(class_id = class.id, instructor = %auth.user.id, "Class created");
    Ok((StatusCode::CREATED, Json(class)))
}
