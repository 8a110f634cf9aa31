// Route definitions

use axum::{
    routing::get,
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::AppState;

mod admin;
mod api;

// Builds the full router: storefront JSON API, admin record endpoints, and the SPA bundle as fallback
pub fn create_router(app_state: AppState) -> Router {
    let static_dir = app_state.settings.static_dir.clone();

    Router::new()
        // Storefront listing and search
        .route("/search", get(api::search_cars))
        .route("/suggestions", get(api::get_suggestions))
        .route("/brands", get(api::list_brands))
        .route("/brands/popular", get(api::popular_brands))
        // Admin record editing
        .route("/api/car/:id", get(admin::get_car).put(admin::update_car))
        .with_state(app_state)
        // Anything else is served from the frontend bundle
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}
