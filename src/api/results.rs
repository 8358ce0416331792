//! Aggregated results and search for a class.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};
use serde::Deserialize;

use super::classes::viewable_class;
use super::{ApiError, AppState, AuthContext};
use crate::analyzers::aggregate::class_report;
use crate::analyzers::search::search;
use crate::analyzers::types::{ClassReport, SearchResult, SearchView};

/// Query parameters for class search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Free text, matched case-insensitively against names
    #[serde(default)]
    pub q: String,

    #[serde(default)]
    pub view: SearchView,
}

/// GET /api/classes/:class_id/results
pub async fn class_results(
    State(state): State<AppState>,
    auth: AuthContext,
    class_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ClassReport>, ApiError> {
    let Path(class_id) = class_id?;
    let class = viewable_class(&state, &auth, class_id).await?;
    let students = state.store.class_outcomes(class.id).await?;
    Ok(Json(class_report(&class, &students)))
}

/// GET /api/classes/:class_id/search?q=ana&view=students
pub async fn search_class(
    State(state): State<AppState>,
    auth: AuthContext,
    class_id: Result<Path<i64>, PathRejection>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResult>, ApiError> {
    let Path(class_id) = class_id?;
    let Query(query) = query?;
    let class = viewable_class(&state, &auth, class_id).await?;
    let students = state.store.class_outcomes(class.id).await?;
    Ok(Json(search(&students, &query.q, query.view)))
}
