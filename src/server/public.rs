//! Customer-facing catalog routes (no auth required).

use axum::{
    extract::{Path, Query, State},
    Json,
};
use menuhub_core::{Category, Recipe, SyncStatus};
use serde::Deserialize;

use super::error::ApiError;
use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RecipeQuery {
    category: Option<String>,
}

pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.public.categories().await?))
}

pub async fn category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    state
        .public
        .category(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No category with id {}", id)))
}

pub async fn recipes(
    State(state): State<AppState>,
    Query(query): Query<RecipeQuery>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = match query.category {
        Some(category_id) => state.public.recipes_in_category(&category_id).await?,
        None => state.public.recipes().await?,
    };
    Ok(Json(recipes))
}

pub async fn sync_status(State(state): State<AppState>) -> Json<SyncStatus> {
    Json(state.catalog.engine().status())
}
