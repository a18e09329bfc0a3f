//! HTTP API for the menuhub storefront.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET /catalog/categories`, `GET /catalog/categories/{id}`: public categories
//! - `GET /catalog/recipes?category={id}`: public recipes
//! - `GET /sync/status`: which sync classes are running
//! - `POST /admin/{restaurant_id}/sync`: republish the whole catalog (auth required)
//! - `GET|POST /admin/{restaurant_id}/categories`, `PUT|DELETE /admin/{restaurant_id}/categories/{id}`
//! - `GET|POST /admin/{restaurant_id}/recipes`, `PUT|DELETE /admin/{restaurant_id}/recipes/{id}`
//! - `GET /admin/{restaurant_id}/orders?user={id}`, `POST /admin/{restaurant_id}/orders`
//! - `PUT /admin/{restaurant_id}/orders/{id}/status`

mod admin;
mod auth;
mod error;
mod public;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use menuhub_core::{
    CatalogService, DocumentStore, MediaHost, OrderService, PublicCatalog, Retention, SyncEngine,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorBody};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    catalog: CatalogService,
    orders: OrderService,
    public: PublicCatalog,
}

impl AppState {
    /// Builds the services around one shared sync engine.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        media: Arc<dyn MediaHost>,
        retention: Retention,
    ) -> Self {
        let engine = SyncEngine::new(store.clone()).with_retention(retention);
        Self {
            catalog: CatalogService::new(store.clone(), media, engine),
            orders: OrderService::new(store.clone()),
            public: PublicCatalog::new(store),
        }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: AppState) -> Router {
    // Public routes (no auth)
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/catalog/categories", get(public::categories))
        .route("/catalog/categories/{id}", get(public::category))
        .route("/catalog/recipes", get(public::recipes))
        .route("/sync/status", get(public::sync_status));

    // Admin routes (bearer token required)
    let admin_routes = Router::new()
        .route("/admin/{restaurant_id}/sync", post(admin::sync))
        .route(
            "/admin/{restaurant_id}/categories",
            get(admin::list_categories).post(admin::add_category),
        )
        .route(
            "/admin/{restaurant_id}/categories/{id}",
            put(admin::update_category).delete(admin::delete_category),
        )
        .route(
            "/admin/{restaurant_id}/recipes",
            get(admin::list_recipes).post(admin::add_recipe),
        )
        .route(
            "/admin/{restaurant_id}/recipes/{id}",
            put(admin::update_recipe).delete(admin::delete_recipe),
        )
        .route(
            "/admin/{restaurant_id}/orders",
            get(admin::list_orders).post(admin::place_order),
        )
        .route(
            "/admin/{restaurant_id}/orders/{id}/status",
            put(admin::update_order_status),
        )
        .layer(DefaultBodyLimit::max(admin::MAX_BODY_BYTES))
        .layer(middleware::from_fn(auth::require_bearer));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use menuhub_core::{ErrorCode, InMemoryMediaHost, InMemoryStore};
    use menuhub_core::store::StoreOp;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const PNG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn app() -> (Router, Arc<InMemoryStore>, Arc<InMemoryMediaHost>) {
        let store = Arc::new(InMemoryStore::new());
        store.protect("restaurants");
        let media = Arc::new(InMemoryMediaHost::new());
        let state = AppState::new(store.clone(), media.clone(), Retention::Prune);
        (router(state), store, media)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn admin(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer test-token");
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _, _) = app();
        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_admin_requires_bearer() {
        let (app, _, _) = app();

        let (status, body) = send(&app, get("/admin/r1/categories")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_auth");

        let request = Request::builder()
            .uri("/admin/r1/categories")
            .header(header::AUTHORIZATION, "Basic abc")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_auth");
    }

    #[tokio::test]
    async fn test_blank_bearer_token_is_rejected() {
        let (app, store, _) = app();
        let request = Request::builder()
            .uri("/admin/r1/categories")
            .header(header::AUTHORIZATION, "Bearer    ")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_auth");
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_add_category_is_published() {
        let (app, _store, media) = app();
        let body = json!({
            "name": "Drinks",
            "image": {"filename": "drinks.png", "data_base64": STANDARD.encode(PNG)}
        });

        let (status, created) = send(&app, admin("POST", "/admin/r1/categories", Some(body))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["publish"]["status"], "synced");
        assert_eq!(media.len(), 1);

        let id = created["value"]["id"].as_str().unwrap().to_string();
        let (status, listed) = send(&app, get("/catalog/categories")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed[0]["id"], id.as_str());
        assert_eq!(listed[0]["restaurantId"], "r1");
        assert_eq!(listed[0]["imageUrl"], created["value"]["imageUrl"]);

        let (status, one) = send(&app, get(&format!("/catalog/categories/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["name"], "Drinks");
    }

    #[tokio::test]
    async fn test_recipes_filter_by_category() {
        let (app, _, _) = app();
        for (name, category) in [("Soup", "c1"), ("Cake", "c2"), ("Stew", "c1")] {
            let body = json!({"name": name, "categoryId": category, "price": 4.5});
            let (status, _) = send(&app, admin("POST", "/admin/r1/recipes", Some(body))).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, recipes) = send(&app, get("/catalog/recipes?category=c1")).await;
        let names: Vec<&str> = recipes
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Soup", "Stew"]);

        let (_, all) = send(&app, get("/catalog/recipes")).await;
        assert_eq!(all.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_input_and_missing_items() {
        let (app, _, _) = app();

        let body = json!({"name": "Soup", "categoryId": "c1", "price": -2.0});
        let (status, err) = send(&app, admin("POST", "/admin/r1/recipes", Some(body))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["error"], "invalid");

        let body = json!({"name": "X", "image": {"filename": "a.png", "data_base64": "!!"}});
        let (status, _) = send(&app, admin("POST", "/admin/r1/categories", Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let body = json!({"name": "Menu", "image": {"filename": "a.png", "data_base64": STANDARD.encode(b"%PDF-1.4")}});
        let (status, err) = send(&app, admin("POST", "/admin/r1/categories", Some(body))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["error"], "invalid");
        assert!(err["message"].as_str().unwrap().contains("image"));

        let (status, _) = send(&app, admin("DELETE", "/admin/r1/categories/ghost", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, get("/catalog/categories/ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_image_is_rejected_before_upload() {
        let (app, store, media) = app();
        let mut bytes = PNG.to_vec();
        bytes.resize(menuhub_core::catalog::MAX_IMAGE_BYTES + 1, 0);
        let body = json!({
            "name": "Drinks",
            "image": {"filename": "drinks.png", "data_base64": STANDARD.encode(&bytes)}
        });

        let (status, err) = send(&app, admin("POST", "/admin/r1/categories", Some(body))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["error"], "invalid");
        assert!(media.is_empty());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_store_permission_denied_maps_to_forbidden() {
        let (app, store, _) = app();
        store.fail(
            StoreOp::GetCollection,
            "restaurants/r1/categories",
            ErrorCode::PermissionDenied,
        );

        let (status, err) = send(&app, admin("GET", "/admin/r1/categories", None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(err["error"], "permission_denied");

        let (status, _) = send(&app, admin("POST", "/admin/r1/sync", None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_sync_and_status() {
        let (app, _, _) = app();
        let body = json!({"name": "Drinks"});
        send(&app, admin("POST", "/admin/r1/categories", Some(body))).await;

        let (status, report) = send(&app, admin("POST", "/admin/r1/sync", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["coalesced"], false);
        assert_eq!(report["categories"]["updated"].as_array().unwrap().len(), 1);

        let (_, sync_status) = send(&app, get("/sync/status")).await;
        assert_eq!(sync_status, json!({"categories": false, "recipes": false, "all": false}));
    }

    #[tokio::test]
    async fn test_update_and_delete_category() {
        let (app, store, _) = app();
        let (_, created) = send(
            &app,
            admin("POST", "/admin/r1/categories", Some(json!({"name": "Drinks"}))),
        )
        .await;
        let id = created["value"]["id"].as_str().unwrap().to_string();
        let uri = format!("/admin/r1/categories/{}", id);

        let (status, updated) =
            send(&app, admin("PUT", &uri, Some(json!({"name": "Cold Drinks"})))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["value"]["name"], "Cold Drinks");

        let (status, deleted) = send(&app, admin("DELETE", &uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["value"], id.as_str());
        assert!(!store.contains(&format!("public-categories/{}", id)));
    }

    #[tokio::test]
    async fn test_orders_lifecycle() {
        let (app, store, _) = app();
        let order = |user: &str| {
            json!({
                "userId": user,
                "items": [
                    {"id": "rec1", "name": "Tomato Soup", "price": 7.5, "quantity": 2},
                    {"id": "rec2", "name": "Lemonade", "price": 3.0, "quantity": 1}
                ],
                "deliveryAddress": "12 Main St",
                "phoneNumber": "555-0100"
            })
        };

        let (status, placed) =
            send(&app, admin("POST", "/admin/r1/orders", Some(order("u1")))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(placed["status"], "Pending");
        assert_eq!(placed["totalAmount"], 18.0);
        assert_eq!(placed["paymentMethod"], "Cash on Delivery");
        assert_eq!(placed["items"][0]["quantity"], 2);
        let id = placed["id"].as_str().unwrap().to_string();
        send(&app, admin("POST", "/admin/r1/orders", Some(order("u2")))).await;

        let (status, mine) = send(&app, admin("GET", "/admin/r1/orders?user=u1", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().unwrap().len(), 1);
        let (_, all) = send(&app, admin("GET", "/admin/r1/orders", None)).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let uri = format!("/admin/r1/orders/{}/status", id);
        let (status, updated) =
            send(&app, admin("PUT", &uri, Some(json!({"status": "delivered"})))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "Delivered");
        let stored = store.get(&format!("restaurants/r1/orders/{}", id)).unwrap();
        assert_eq!(stored.get_str("status"), Some("Delivered"));

        let (status, body) =
            send(&app, admin("PUT", &uri, Some(json!({"status": "Shipped"})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");

        let (status, _) = send(
            &app,
            admin("PUT", "/admin/r1/orders/missing/status", Some(json!({"status": "Failed"}))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut empty = order("u1");
        empty["items"] = json!([]);
        let (status, body) = send(&app, admin("POST", "/admin/r1/orders", Some(empty))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "invalid");
    }
}
