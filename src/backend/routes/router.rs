/**
 * Router Configuration
 *
 * This module combines all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. API routes (public and protected)
 * 2. Actuator routes
 * 3. Fallback: static files from `server.static_dir`, with `index.html`
 *    served for any other path so client-side routes survive a reload
 *
 * Every request passes through the HTTP trace layer.
 */

use axum::{http::Request, response::Response, Router};
use std::time::Duration;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::backend::routes::actuator_routes::configure_actuator_routes;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let static_dir = app_state.config.server.static_dir.clone();
    let spa = ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let router = configure_api_routes(Router::new(), app_state.clone());
    let router = configure_actuator_routes(router);

    router
        .fallback_service(spa)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_response(|response: &Response, latency: Duration, _span: &Span| {
                    tracing::info!(
                        status = %response.status(),
                        latency_ms = latency.as_millis() as u64,
                        "Request completed"
                    );
                }),
        )
        .with_state(app_state)
}
