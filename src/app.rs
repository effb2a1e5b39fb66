use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config;
use crate::handlers;
use crate::state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health::health))
        .merge(auth_routes())
        .merge(catalog_routes())
        .merge(activity_routes())
        .merge(children_routes())
        .with_state(state)
        .layer(cors_layer());

    if config::config().api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/me", get(handlers::auth::me))
}

fn catalog_routes() -> Router<Arc<AppState>> {
    use handlers::{quiz, shorts, videos};

    Router::new()
        .route("/api/videos", get(videos::list))
        .route("/api/videos/categories", get(videos::categories))
        .route("/api/videos/:slug", get(videos::show))
        .route("/api/videos/:slug/similar", get(videos::similar))
        .route("/api/videos/:slug/watch", post(videos::watch))
        .route("/api/videos/:slug/quiz", get(quiz::show))
        .route("/api/videos/:slug/quiz/submit", post(quiz::submit))
        .route("/api/shorts", get(shorts::feed))
        .route("/api/shorts/:slug/view", post(shorts::view))
}

fn activity_routes() -> Router<Arc<AppState>> {
    use handlers::favorites;

    Router::new()
        .route("/api/favorites", get(favorites::list))
        .route("/api/favorites/:video_id/toggle", post(favorites::toggle))
        .route("/api/history", get(favorites::history))
}

fn children_routes() -> Router<Arc<AppState>> {
    use handlers::children;

    Router::new()
        .route("/api/children", get(children::list).post(children::create))
        .route("/api/children/:child_id/switch", post(children::switch))
        .route("/api/parent/controls", post(children::update_controls))
        .route("/api/profile/language", post(handlers::profile::set_language))
}

/// Cookies need credentialed CORS, which only works with explicit origins
fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
