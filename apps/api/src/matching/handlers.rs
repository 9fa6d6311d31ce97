use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::matching::{match_schools, MatchOutcome, MatchSettings};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    /// Case-insensitive school-name filter.
    pub search: Option<String>,
    /// Result cap; defaults to `MATCH_RESULT_CAP`.
    pub limit: Option<usize>,
}

/// GET /api/v1/okupasi/:key/sekolah
pub async fn handle_match_schools(
    State(state): State<AppState>,
    Path(kode): Path<String>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<MatchOutcome>, AppError> {
    let kode = kode.trim();
    if kode.is_empty() {
        return Err(AppError::Validation("okupasi code must not be empty".to_string()));
    }

    let cap = query.limit.unwrap_or(state.config.match_result_cap);
    if cap == 0 {
        return Err(AppError::Validation("limit must be positive".to_string()));
    }

    let outcome = match_schools(
        state.directory.as_ref(),
        kode,
        query.search.as_deref(),
        cap,
        MatchSettings::from(&state.config),
    )
    .await;

    Ok(Json(outcome))
}
