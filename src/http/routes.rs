use axum::{routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn blog() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index))
        .route("/category/:slug/", get(handlers::category_posts))
        .route("/profile/:username/", get(handlers::profile))
        .route(
            "/profile_edit/",
            get(handlers::edit_profile_page).post(handlers::edit_profile),
        )
        .route(
            "/posts/create/",
            get(handlers::create_post_page).post(handlers::create_post),
        )
        .route("/posts/:id/", get(handlers::post_detail))
        .route(
            "/posts/:id/edit/",
            get(handlers::edit_post_page).post(handlers::edit_post),
        )
        .route(
            "/posts/:id/delete/",
            get(handlers::delete_post_page).post(handlers::delete_post),
        )
        .route(
            "/posts/:id/comment/",
            get(handlers::add_comment_page).post(handlers::add_comment),
        )
        .route(
            "/posts/:id/edit_comment/:comment_id/",
            get(handlers::edit_comment_page).post(handlers::edit_comment),
        )
        .route(
            "/posts/:id/delete_comment/:comment_id/",
            get(handlers::delete_comment_page).post(handlers::delete_comment),
        )
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route(
            "/auth/login/",
            get(handlers::login_page).post(handlers::login),
        )
        .route("/auth/logout/", post(handlers::logout))
        .route(
            "/auth/registration/",
            get(handlers::registration_page).post(handlers::register),
        )
}

pub fn post_detail_path(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn post_edit_path(post_id: i64) -> String {
    format!("/posts/{}/edit/", post_id)
}

pub fn post_comment_path(post_id: i64) -> String {
    format!("/posts/{}/comment/", post_id)
}

pub fn comment_edit_path(post_id: i64, comment_id: i64) -> String {
    format!("/posts/{}/edit_comment/{}/", post_id, comment_id)
}

pub fn comment_delete_path(post_id: i64, comment_id: i64) -> String {
    format!("/posts/{}/delete_comment/{}/", post_id, comment_id)
}

/// Usernames may hold non-ASCII letters, so the segment is percent-encoded.
pub fn profile_path(username: &str) -> String {
    let segment: String = url::form_urlencoded::byte_serialize(username.as_bytes()).collect();
    format!("/profile/{}/", segment)
}
