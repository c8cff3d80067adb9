/**
 * API Route Configuration
 *
 * # Routes
 *
 * ## Public
 * - `GET /api/config` - Client bootstrap settings
 * - `POST /api/auth/dev-token` - Development sign-in (404 unless enabled)
 *
 * ## Protected (bearer token)
 * - `GET /api/me` - Current user
 * - `GET /api/conversations` - List conversations
 * - `POST /api/conversations` - Create a conversation
 * - `GET /api/conversations/{id}` - Conversation with messages
 * - `PATCH /api/conversations/{id}` - Rename
 * - `DELETE /api/conversations/{id}` - Delete with messages
 * - `GET /api/conversations/{id}/messages` - Messages only
 * - `POST /api/conversations/{id}/chat` - Streamed reply (SSE)
 *
 * Unknown `/api` paths answer with a JSON 404 instead of the SPA shell.
 */

use axum::{
    http::StatusCode,
    middleware,
    response::Response,
    routing::{any, get, post},
    Router,
};

use crate::backend::auth::{dev_token, get_me, public_config};
use crate::backend::chat::stream_chat;
use crate::backend::conversations::handlers::{
    create_conversation, delete_conversation, get_conversation, list_conversations,
    list_messages, rename_conversation,
};
use crate::backend::error::status_response;
use crate::backend::middleware::auth_middleware;
use crate::backend::server::state::AppState;

/// Add the `/api` routes to `router`
///
/// The auth middleware is applied with `route_layer`, so it only runs for
/// requests that matched a protected route.
pub fn configure_api_routes(router: Router<AppState>, app_state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/me", get(get_me))
        .route(
            "/api/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/api/conversations/{id}",
            get(get_conversation)
                .patch(rename_conversation)
                .delete(delete_conversation),
        )
        .route("/api/conversations/{id}/messages", get(list_messages))
        .route("/api/conversations/{id}/chat", post(stream_chat))
        .route_layer(middleware::from_fn_with_state(app_state, auth_middleware));

    router
        .route("/api/config", get(public_config))
        .route("/api/auth/dev-token", post(dev_token))
        .merge(protected)
        .route("/api/{*rest}", any(api_not_found))
}

async fn api_not_found() -> Response {
    status_response(StatusCode::NOT_FOUND, "Not found")
}
