use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Router,
};

use crate::paste::{pages, routes as api};
use crate::state::AppState;

/// Permissive CORS so the JSON API can be called from any origin.
/// Preflight requests are answered here without reaching a handler.
async fn cors(req: Request<Body>, next: middleware::Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/get/{key}", axum::routing::get(api::api_get_paste))
        .route("/api/upload", axum::routing::post(api::api_upload))
        .route("/api/upload/raw", axum::routing::post(api::api_upload_raw));

    // Single-segment paths all belong to /{key}; nothing else may live at the top level
    let page_routes = Router::new()
        .route(
            "/",
            axum::routing::get(pages::index).post(pages::create_paste),
        )
        .route(
            "/{key}",
            axum::routing::get(pages::view_paste).post(pages::append_paste),
        );

    let health = Router::new().route("/api/health", axum::routing::get(health_check));

    Router::new()
        .merge(api_routes)
        .merge(page_routes)
        .merge(health)
        .layer(DefaultBodyLimit::max(state.max_paste_bytes))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
