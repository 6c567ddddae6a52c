use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::app::auth::{AuthService, SessionToken};
use crate::http::error::{AppError, Rejection};
use crate::http::templates::Nav;
use crate::AppState;

pub const SESSION_COOKIE: &str = "blogicum_session";
pub const LOGIN_PATH: &str = "/auth/login/";

/// Signed-in requester. Anonymous requests are redirected to the login page.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

/// Requester on public pages, signed in or not.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<AuthUser>);

impl Viewer {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|user| user.user_id)
    }

    pub fn nav(&self) -> Nav {
        Nav::new(self.0.as_ref().map(|user| user.username.clone()))
    }
}

impl AuthUser {
    pub fn nav(&self) -> Nav {
        Nav::new(Some(self.username.clone()))
    }
}

async fn session_user(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, AppError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    let service = AuthService::new(
        state.db.clone(),
        state.session_key,
        state.session_ttl_minutes,
    );
    let session = service.authenticate(cookie.value()).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to authenticate session");
        AppError::internal("failed to authenticate")
    })?;

    Ok(session.map(|session| AuthUser {
        user_id: session.user_id,
        username: session.username,
    }))
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Rejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await? {
            Some(user) => Ok(user),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|value| value.as_str())
                    .unwrap_or("/");
                Err(Rejection::Redirect(login_url(next)))
            }
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Viewer(session_user(parts, state).await?))
    }
}

/// Login page URL that brings the user back to `next` afterwards.
pub fn login_url(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{}?next={}", LOGIN_PATH, encoded)
}

/// Accepts only same-site absolute paths as post-login targets. The value
/// ends up in a `Location` header, so it must be visible ASCII.
pub fn safe_next(next: &str) -> Option<&str> {
    let next = next.trim();
    let local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && next.bytes().all(|byte| byte.is_ascii_graphic());
    local.then_some(next)
}

pub fn session_cookie(token: SessionToken, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .expires(token.expires_at)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
