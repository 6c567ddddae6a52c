use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::AppState;

mod auth;
mod error;
mod forms;
mod guards;
mod handlers;
mod routes;
mod templates;

pub use auth::{login_url, AuthUser, Viewer, LOGIN_PATH, SESSION_COOKIE};
pub use error::{AppError, Rejection};

/// Form bodies are small; anything larger is refused before extraction.
const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .merge(routes::blog())
        .merge(routes::auth())
        .fallback(handlers::not_found)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
