//! Ownership checks run by the edit and delete handlers before they touch
//! anything. A stranger editing a comment gets a 403 page; a stranger
//! editing a post is sent back to the post.

use crate::app::comments::CommentService;
use crate::app::posts::PostService;
use crate::domain::comment::Comment;
use crate::domain::post::Post;
use crate::http::auth::AuthUser;
use crate::http::error::{AppError, Rejection};
use crate::http::routes::post_detail_path;
use crate::AppState;

pub async fn require_post_author(
    state: &AppState,
    post_id: i64,
    user: &AuthUser,
) -> Result<Post, Rejection> {
    let service = PostService::new(state.db.clone());
    let post = service
        .get_post(post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to load post");
            AppError::internal("failed to load post")
        })?
        .ok_or_else(|| AppError::not_found("post not found"))?;

    if !post.is_authored_by(user.user_id) {
        tracing::debug!(post_id, user_id = user.user_id, "post owner check failed");
        return Err(Rejection::Redirect(post_detail_path(post_id)));
    }

    Ok(post)
}

pub async fn require_comment_author(
    state: &AppState,
    comment_id: i64,
    user: &AuthUser,
) -> Result<Comment, AppError> {
    let service = CommentService::new(state.db.clone());
    let comment = service
        .get_comment(comment_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, comment_id, "failed to load comment");
            AppError::internal("failed to load comment")
        })?
        .ok_or_else(|| AppError::not_found("comment not found"))?;

    if !comment.is_authored_by(user.user_id) {
        return Err(AppError::forbidden("you can only change your own comments"));
    }

    Ok(comment)
}
