use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Discovery
        .route("/stores", get(handlers::list_stores))
        .route("/stores/:store_id/score", get(handlers::store_score))
        // Preferences
        .route("/preferences", get(handlers::get_preferences))
        .route(
            "/preferences/categories/:category_id",
            put(handlers::set_category_preference),
        )
        .route(
            "/preferences/foods",
            post(handlers::add_food_preference),
        )
        .route(
            "/preferences/foods/:food_id",
            delete(handlers::remove_food_preference),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
