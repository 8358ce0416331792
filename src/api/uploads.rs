//! CSV upload endpoints. Each takes `multipart/form-data` with the file in
//! a field named `file`.

use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, Path, State,
        multipart::MultipartRejection,
        rejection::PathRejection,
    },
};
use serde::Serialize;

use super::classes::owned_class;
use super::{ApiError, AppState, AuthContext};
use crate::ingest::{IngestReport, ingest_grades, ingest_objectives, ingest_roster};

const FILE_FIELD: &str = "file";

/// Returns the uploaded file's bytes, or [`ApiError::MissingUpload`] if the
/// request is not a form upload or the field is absent or blank.
async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<Bytes, ApiError> {
    let mut multipart = multipart.map_err(|_| ApiError::MissingUpload)?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let bytes = field.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiError::MissingUpload);
        }
        return Ok(bytes);
    }
    Err(ApiError::MissingUpload)
}

#[derive(Debug, Serialize)]
pub struct ObjectivesCreated {
    pub created: Vec<String>,
}

/// POST /api/classes/:class_id/roster
pub async fn upload_roster(
    State(state): State<AppState>,
    auth: AuthContext,
    class_id: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestReport>, ApiError> {
    let Path(class_id) = class_id?;
    let class = owned_class(&state, &auth, class_id).await?;
    let bytes = read_upload(multipart).await?;
    let report = ingest_roster(state.store.as_ref(), class.id, &bytes, state.parse_mode).await?;
    Ok(Json(report))
}

/// POST /api/classes/:class_id/objectives
pub async fn upload_objectives(
    State(state): State<AppState>,
    auth: AuthContext,
    class_id: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ObjectivesCreated>, ApiError> {
    let Path(class_id) = class_id?;
    let class = owned_class(&state, &auth, class_id).await?;
    let bytes = read_upload(multipart).await?;
    let created = ingest_objectives(state.store.as_ref(), class.id, &bytes, state.parse_mode).await?;
    Ok(Json(ObjectivesCreated { created }))
}

/// POST /api/classes/:class_id/grades
pub async fn upload_grades(
    State(state): State<AppState>,
    auth: AuthContext,
    class_id: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestReport>, ApiError> {
    let Path(class_id) = class_id?;
    let class = owned_class(&state, &auth, class_id).await?;
    let bytes = read_upload(multipart).await?;
    let report = ingest_grades(state.store.as_ref(), class.id, &bytes, state.parse_mode).await?;
    Ok(Json(report))
}
