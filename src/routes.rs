use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{Collection, ListQuery, MovieRow},
};

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/movies/{collection}", get(list_movies))
        .route("/movies/{collection}/{movie_id}", get(movie_detail))
        .route("/sync", post(sync_now))
        .with_state(Arc::new(state))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn parse_collection(raw: &str) -> AppResult<Collection> {
    Collection::from_id(raw).ok_or_else(|| AppError::not_found(format!("unknown collection {raw}")))
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<Vec<MovieRow>>> {
    let collection = parse_collection(&collection)?;
    let Query(q) = query.map_err(|e| AppError::bad_request(e.body_text()))?;

    let rows = state.store.list(collection, q.order).await?;
    Ok(Json(rows))
}

pub async fn movie_detail(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> AppResult<Json<MovieRow>> {
    let Path((collection, movie_id)) = path.map_err(|e| AppError::bad_request(e.body_text()))?;
    let collection = parse_collection(&collection)?;
    state
        .store
        .find(collection, movie_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("movie {movie_id} not in {collection}")))
}

pub async fn sync_now(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    tracing::info!("manual sync requested");
    state.scheduler.trigger_now();
    (StatusCode::ACCEPTED, Json(json!({ "status": "scheduled" })))
}
