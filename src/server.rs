use axum::{
    extract::Request,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::catalog::CatalogClient;
use crate::db::Repository;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Repository>,
    pub catalog: CatalogClient,
}

impl AppState {
    pub fn new(db: Arc<dyn Repository>, catalog: CatalogClient) -> Self {
        Self { db, catalog }
    }
}

pub fn build_router(state: AppState) -> Router {
    // The by-type and membership routes share their second segment name;
    // the router rejects different names at the same position.
    let api_routes = Router::new()
        .route("/api/users", post(crate::api::create_user))
        .route("/api/users/:email", get(crate::api::get_user))
        .route(
            "/api/user-shows",
            post(crate::api::add_user_show)
                .put(crate::api::put_user_show)
                .delete(crate::api::remove_user_show),
        )
        .route("/api/user-shows/:user_id", get(crate::api::list_user_shows))
        .route(
            "/api/user-shows/:user_id/:key",
            get(crate::api::list_user_shows_by_type),
        )
        .route(
            "/api/user-shows/:user_id/:key/:list_type",
            get(crate::api::check_user_show),
        )
        .route(
            "/api/user-content",
            post(crate::api::add_user_content).delete(crate::api::remove_user_content),
        )
        .route(
            "/api/user-content/:user_id",
            get(crate::api::list_grouped_content),
        )
        .route(
            "/api/user-content/:user_id/:status",
            get(crate::api::list_content_ids),
        )
        .route("/api/thetvdb/token", get(crate::api::get_catalog_token));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api_routes)
        .fallback(fallback_handler)
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn fallback_handler(req: Request<axum::body::Body>) -> impl IntoResponse {
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
