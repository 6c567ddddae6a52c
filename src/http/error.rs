use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::http::templates::ErrorTemplate;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let template = ErrorTemplate {
            status: self.status.as_u16(),
            reason: self.status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.message,
        };
        match template.render() {
            Ok(body) => (self.status, Html(body)).into_response(),
            Err(err) => {
                tracing::error!(error = ?err, "failed to render error page");
                (self.status, template.message).into_response()
            }
        }
    }
}

/// Short-circuit of a handler: either an error page or a redirect. Missing
/// authentication and the post-owner guard redirect instead of failing.
#[derive(Debug)]
pub enum Rejection {
    Redirect(String),
    Error(AppError),
}

impl From<AppError> for Rejection {
    fn from(err: AppError) -> Self {
        Self::Error(err)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(location) => Redirect::to(&location).into_response(),
            Self::Error(err) => err.into_response(),
        }
    }
}
