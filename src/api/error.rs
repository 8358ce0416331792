use axum::{
    Json,
    extract::{
        multipart::MultipartError,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::ingest::IngestError;
use crate::parser::UploadError;

/// Errors surfaced by HTTP handlers. Serialized as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file uploaded. Please choose a CSV file to upload.")]
    MissingUpload,

    #[error("{0}")]
    BadRequest(String),

    /// A request the framework could not extract (bad path segment, body
    /// or query string). Keeps the extractor's status.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Sign in required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("Class {0} not found")]
    ClassNotFound(i64),

    /// Storage or auth backend failure. Details are logged, not returned.
    #[error("Something went wrong. Please try again.")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Empty => ApiError::MissingUpload,
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Upload(upload) => upload.into(),
            IngestError::Storage(storage) => ApiError::Internal(storage),
        }
    }
}

macro_rules! rejected_from {
    ($($rejection:ty),+ $(,)?) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(err: $rejection) -> Self {
                    ApiError::Rejected {
                        status: err.status(),
                        message: err.body_text(),
                    }
                }
            }
        )+
    };
}

rejected_from!(MultipartError, PathRejection, JsonRejection, QueryRejection);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingUpload | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::ClassNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            error!(error = %format!("{err:#}"), "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}
