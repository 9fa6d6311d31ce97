use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::admin::validation::Validate;
use crate::admin::Resource;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub page: Option<usize>,
}

impl ListQuery {
    fn to_params(&self) -> Result<Vec<(&'static str, String)>, AppError> {
        let mut params = Vec::new();
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        for (name, value) in [("limit", self.limit), ("page", self.page)] {
            match value {
                Some(0) => return Err(AppError::Validation(format!("{name} must be positive"))),
                Some(n) => params.push((name, n.to_string())),
                None => {}
            }
        }
        Ok(params)
    }
}

fn check<P: Validate>(payload: &P) -> Result<(), AppError> {
    let errors = payload.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidPayload(errors))
    }
}

/// GET /api/v1/<collection>
pub async fn handle_list<R: Resource>(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<R>>, AppError> {
    let params = query.to_params()?;
    let items = state.api.list::<R>(&R::collection_path(), &params).await?;
    Ok(Json(items))
}

/// GET /api/v1/<collection>/:key
pub async fn handle_get<R: Resource>(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<R>, AppError> {
    let item = state.api.get::<R>(&R::item_path(&key)).await?;
    Ok(Json(item))
}

/// POST /api/v1/<collection>
pub async fn handle_create<R: Resource>(
    State(state): State<AppState>,
    Json(payload): Json<R::Payload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    check(&payload)?;
    let created = state.api.create(&R::collection_path(), &payload).await?;
    info!("Created {} record", R::COLLECTION);
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/<collection>/:key
pub async fn handle_update<R: Resource>(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<R::Payload>,
) -> Result<Json<Value>, AppError> {
    check(&payload)?;
    let updated = state.api.update(&R::item_path(&key), &payload).await?;
    info!("Updated {} {key}", R::COLLECTION);
    Ok(Json(updated))
}

/// DELETE /api/v1/<collection>/:key
pub async fn handle_delete<R: Resource>(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    state.api.delete(&R::item_path(&key)).await?;
    info!("Deleted {} {key}", R::COLLECTION);
    Ok(StatusCode::NO_CONTENT)
}

/// Mounts the five CRUD routes for `R` under `/api/v1/<collection>`.
pub fn resource_routes<R: Resource>(router: Router<AppState>) -> Router<AppState> {
    let base = format!("/api/v1/{}", R::COLLECTION);
    router
        .route(&base, get(handle_list::<R>).post(handle_create::<R>))
        .route(
            &format!("{base}/:key"),
            get(handle_get::<R>)
                .put(handle_update::<R>)
                .delete(handle_delete::<R>),
        )
}
