//! Admin routes. Every handler acts with the caller's bearer credential.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use menuhub_core::catalog::{validate_image, MAX_IMAGE_BYTES};
use menuhub_core::{
    Category, CategoryChanges, Credential, FullSyncReport, ImageUpload, Mutation, NewCategory,
    NewOrder, Order, OrderStatus, Recipe, RecipeInput,
};
use serde::Deserialize;

use super::error::ApiError;
use super::AppState;

/// An image sent inline with a create or update
#[derive(Debug, Deserialize)]
pub struct ImagePayload {
    filename: String,
    data_base64: String,
}

/// Largest request body on admin routes: one base64 image plus the fields.
pub const MAX_BODY_BYTES: usize = MAX_IMAGE_BYTES / 3 * 4 + 64 * 1024;

impl ImagePayload {
    /// Decodes and checks the image before anything is uploaded.
    fn decode(self) -> Result<ImageUpload, ApiError> {
        let bytes = STANDARD
            .decode(self.data_base64.trim())
            .map_err(|e| ApiError::bad_request(format!("Image is not valid base64: {}", e)))?;
        let image = ImageUpload::new(self.filename, bytes);
        validate_image(&image)?;
        Ok(image)
    }
}

fn decode_image(image: Option<ImagePayload>) -> Result<Option<ImageUpload>, ApiError> {
    image.map(ImagePayload::decode).transpose()
}

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    name: String,
    image: Option<ImagePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeBody {
    name: String,
    category_id: String,
    #[serde(default)]
    ingredients: String,
    price: f64,
    image: Option<ImagePayload>,
}

impl RecipeBody {
    fn into_input(self) -> Result<RecipeInput, ApiError> {
        Ok(RecipeInput {
            image: decode_image(self.image)?,
            name: self.name,
            category_id: self.category_id,
            ingredients: self.ingredients,
            price: self.price,
        })
    }
}

pub async fn sync(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path(restaurant_id): Path<String>,
) -> Result<Json<FullSyncReport>, ApiError> {
    let report = state
        .catalog
        .engine()
        .sync_all(&restaurant_id, &credential)
        .await?;
    Ok(Json(report))
}

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path(restaurant_id): Path<String>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(
        state
            .catalog
            .list_categories(&restaurant_id, &credential)
            .await?,
    ))
}

pub async fn add_category(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path(restaurant_id): Path<String>,
    Json(body): Json<CategoryBody>,
) -> Result<(StatusCode, Json<Mutation<Category>>), ApiError> {
    let new = NewCategory {
        image: decode_image(body.image)?,
        name: body.name,
    };
    let mutation = state
        .catalog
        .add_category(&restaurant_id, &credential, new)
        .await?;
    Ok((StatusCode::CREATED, Json(mutation)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path((restaurant_id, id)): Path<(String, String)>,
    Json(body): Json<CategoryBody>,
) -> Result<Json<Mutation<Category>>, ApiError> {
    let changes = CategoryChanges {
        image: decode_image(body.image)?,
        name: body.name,
    };
    let mutation = state
        .catalog
        .update_category(&restaurant_id, &credential, &id, changes)
        .await?;
    Ok(Json(mutation))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path((restaurant_id, id)): Path<(String, String)>,
) -> Result<Json<Mutation<String>>, ApiError> {
    let mutation = state
        .catalog
        .delete_category(&restaurant_id, &credential, &id)
        .await?;
    Ok(Json(mutation))
}

pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path(restaurant_id): Path<String>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    Ok(Json(
        state.catalog.list_recipes(&restaurant_id, &credential).await?,
    ))
}

pub async fn add_recipe(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path(restaurant_id): Path<String>,
    Json(body): Json<RecipeBody>,
) -> Result<(StatusCode, Json<Mutation<Recipe>>), ApiError> {
    let mutation = state
        .catalog
        .add_recipe(&restaurant_id, &credential, body.into_input()?)
        .await?;
    Ok((StatusCode::CREATED, Json(mutation)))
}

pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path((restaurant_id, id)): Path<(String, String)>,
    Json(body): Json<RecipeBody>,
) -> Result<Json<Mutation<Recipe>>, ApiError> {
    let mutation = state
        .catalog
        .update_recipe(&restaurant_id, &credential, &id, body.into_input()?)
        .await?;
    Ok(Json(mutation))
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path((restaurant_id, id)): Path<(String, String)>,
) -> Result<Json<Mutation<String>>, ApiError> {
    let mutation = state
        .catalog
        .delete_recipe(&restaurant_id, &credential, &id)
        .await?;
    Ok(Json(mutation))
}

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBody {
    user_id: String,
    #[serde(flatten)]
    order: NewOrder,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    status: String,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path(restaurant_id): Path<String>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = match query.user {
        Some(user_id) => {
            state
                .orders
                .list_user_orders(&restaurant_id, &user_id, &credential)
                .await?
        }
        None => state.orders.list_orders(&restaurant_id, &credential).await?,
    };
    Ok(Json(orders))
}

pub async fn place_order(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path(restaurant_id): Path<String>,
    Json(body): Json<OrderBody>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state
        .orders
        .place_order(&restaurant_id, &body.user_id, &credential, body.order)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path((restaurant_id, id)): Path<(String, String)>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Order>, ApiError> {
    let status = OrderStatus::parse(&body.status).ok_or_else(|| {
        ApiError::bad_request(format!("Unknown order status: {}", body.status))
    })?;
    let order = state
        .orders
        .update_status(&restaurant_id, &id, status, &credential)
        .await?;
    Ok(Json(order))
}
