use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::app::auth::AuthService;
use crate::app::categories::CategoryService;
use crate::app::comments::CommentService;
use crate::app::locations::LocationService;
use crate::app::pagination::PageNumber;
use crate::app::posts::PostService;
use crate::app::users::{is_unique_violation, UserService, USERNAME_CONSTRAINT};
use crate::domain::category::Category;
use crate::domain::location::Location;
use crate::domain::post::Post;
use crate::http::auth::{
    expired_session_cookie, safe_next, session_cookie, AuthUser, Viewer, LOGIN_PATH,
    SESSION_COOKIE,
};
use crate::http::error::{AppError, Rejection};
use crate::http::forms::{
    CommentForm, FormErrors, LoginForm, PostForm, ProfileForm, RegistrationForm, INVALID_LOGIN,
    USERNAME_TAKEN,
};
use crate::http::guards::{require_comment_author, require_post_author};
use crate::http::routes::{
    comment_delete_path, comment_edit_path, post_comment_path, post_detail_path, post_edit_path,
    profile_path,
};
use crate::http::templates::{
    render, CategoryTemplate, CommentFormTemplate, DeleteCommentTemplate, DeletePostTemplate,
    DetailTemplate, IndexTemplate, LoginTemplate, Nav, PostFormTemplate, ProfileTemplate,
    RegistrationTemplate, UserTemplate,
};
use crate::AppState;

const CREATE_POST_PATH: &str = "/posts/create/";

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

fn page_number(query: &PageQuery) -> Result<PageNumber, AppError> {
    PageNumber::parse(query.page.as_deref()).ok_or_else(|| AppError::not_found("page not found"))
}

async fn load_post(state: &AppState, post_id: i64) -> Result<Post, AppError> {
    PostService::new(state.db.clone())
        .get_post(post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to load post");
            AppError::internal("failed to load post")
        })?
        .ok_or_else(|| AppError::not_found("post not found"))
}

async fn load_choices(state: &AppState) -> Result<(Vec<Category>, Vec<Location>), AppError> {
    let categories = CategoryService::new(state.db.clone())
        .list_all()
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list categories");
            AppError::internal("failed to load categories")
        })?;
    let locations = LocationService::new(state.db.clone())
        .list_all()
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to list locations");
            AppError::internal("failed to load locations")
        })?;
    Ok((categories, locations))
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

pub async fn not_found() -> AppError {
    AppError::not_found("page not found")
}

pub async fn index(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let number = page_number(&query)?;
    let page = PostService::new(state.db.clone())
        .public_feed(number, OffsetDateTime::now_utc())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to load public feed");
            AppError::internal("failed to load posts")
        })?
        .ok_or_else(|| AppError::not_found("page not found"))?;

    render(&IndexTemplate {
        nav: viewer.nav(),
        page,
    })
}

pub async fn category_posts(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let number = page_number(&query)?;
    let category = CategoryService::new(state.db.clone())
        .get_published(&slug)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, slug = %slug, "failed to load category");
            AppError::internal("failed to load category")
        })?
        .ok_or_else(|| AppError::not_found("category not found"))?;

    let page = PostService::new(state.db.clone())
        .category_feed(category.id, number, OffsetDateTime::now_utc())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, category_id = category.id, "failed to load category feed");
            AppError::internal("failed to load posts")
        })?
        .ok_or_else(|| AppError::not_found("page not found"))?;

    render(&CategoryTemplate {
        nav: viewer.nav(),
        category,
        page,
    })
}

pub async fn profile(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let number = page_number(&query)?;
    let profile = UserService::new(state.db.clone())
        .get_by_username(&username)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, username = %username, "failed to load profile");
            AppError::internal("failed to load profile")
        })?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let page = PostService::new(state.db.clone())
        .author_feed(profile.id, number)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = profile.id, "failed to load author feed");
            AppError::internal("failed to load posts")
        })?
        .ok_or_else(|| AppError::not_found("page not found"))?;

    let is_owner = viewer.user_id() == Some(profile.id);
    render(&ProfileTemplate {
        nav: viewer.nav(),
        profile,
        page,
        is_owner,
    })
}

pub async fn post_detail(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(post_id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let post = load_post(&state, post_id).await?;
    if !post.is_viewable_by(viewer.user_id(), OffsetDateTime::now_utc()) {
        return Err(AppError::not_found("post not found"));
    }

    let comments = CommentService::new(state.db.clone())
        .list_for_post(post.id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to list comments");
            AppError::internal("failed to load comments")
        })?;

    render(&DetailTemplate {
        nav: viewer.nav(),
        post,
        comments,
        form: CommentForm::default(),
        errors: FormErrors::default(),
        viewer_id: viewer.user_id().unwrap_or(0),
    })
}

pub async fn create_post_page(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Html<String>, Rejection> {
    let (categories, locations) = load_choices(&state).await?;
    Ok(render(&PostFormTemplate {
        nav: user.nav(),
        is_edit: false,
        action: CREATE_POST_PATH.to_string(),
        categories,
        locations,
        form: PostForm::blank(OffsetDateTime::now_utc()),
        errors: FormErrors::default(),
    })?)
}

pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<PostForm>,
) -> Result<Response, Rejection> {
    let (categories, locations) = load_choices(&state).await?;
    let input = match form.validate(&categories, &locations) {
        Ok(input) => input,
        Err(errors) => {
            let page = render(&PostFormTemplate {
                nav: user.nav(),
                is_edit: false,
                action: CREATE_POST_PATH.to_string(),
                categories,
                locations,
                form,
                errors,
            })?;
            return Ok(page.into_response());
        }
    };

    let post = PostService::new(state.db.clone())
        .create_post(user.user_id, input)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = user.user_id, "failed to create post");
            AppError::internal("failed to create post")
        })?;
    tracing::info!(post_id = post.id, user_id = user.user_id, "post created");

    Ok(Redirect::to(&profile_path(&user.username)).into_response())
}

pub async fn edit_post_page(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Html<String>, Rejection> {
    let post = require_post_author(&state, post_id, &user).await?;
    let (categories, locations) = load_choices(&state).await?;
    Ok(render(&PostFormTemplate {
        nav: user.nav(),
        is_edit: true,
        action: post_edit_path(post.id),
        categories,
        locations,
        form: PostForm::from_post(&post),
        errors: FormErrors::default(),
    })?)
}

pub async fn edit_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i64>,
    Form(form): Form<PostForm>,
) -> Result<Response, Rejection> {
    let post = require_post_author(&state, post_id, &user).await?;
    let (categories, locations) = load_choices(&state).await?;
    let input = match form.validate(&categories, &locations) {
        Ok(input) => input,
        Err(errors) => {
            let page = render(&PostFormTemplate {
                nav: user.nav(),
                is_edit: true,
                action: post_edit_path(post.id),
                categories,
                locations,
                form,
                errors,
            })?;
            return Ok(page.into_response());
        }
    };

    PostService::new(state.db.clone())
        .update_post(post.id, user.user_id, input)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to update post");
            AppError::internal("failed to update post")
        })?
        .ok_or_else(|| AppError::not_found("post not found"))?;

    Ok(Redirect::to(&post_detail_path(post.id)).into_response())
}

pub async fn delete_post_page(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Html<String>, Rejection> {
    let post = require_post_author(&state, post_id, &user).await?;
    Ok(render(&DeletePostTemplate {
        nav: user.nav(),
        post,
    })?)
}

pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Redirect, Rejection> {
    let post = require_post_author(&state, post_id, &user).await?;
    let deleted = PostService::new(state.db.clone())
        .delete_post(post.id, user.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to delete post");
            AppError::internal("failed to delete post")
        })?;
    if !deleted {
        return Err(AppError::not_found("post not found").into());
    }
    tracing::info!(post_id, user_id = user.user_id, "post deleted");

    Ok(Redirect::to("/"))
}

pub async fn add_comment_page(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Html<String>, Rejection> {
    let post = load_post(&state, post_id).await?;
    Ok(render(&CommentFormTemplate {
        nav: user.nav(),
        is_edit: false,
        action: post_comment_path(post.id),
        post_id: post.id,
        form: CommentForm::default(),
        errors: FormErrors::default(),
    })?)
}

pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Result<Response, Rejection> {
    let post = load_post(&state, post_id).await?;
    let text = match form.validate() {
        Ok(text) => text,
        Err(errors) => {
            let page = render(&CommentFormTemplate {
                nav: user.nav(),
                is_edit: false,
                action: post_comment_path(post.id),
                post_id: post.id,
                form,
                errors,
            })?;
            return Ok(page.into_response());
        }
    };

    let comment = CommentService::new(state.db.clone())
        .create_comment(post.id, user.user_id, text)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to create comment");
            AppError::internal("failed to create comment")
        })?;
    tracing::info!(comment_id = comment.id, post_id, "comment created");

    Ok(Redirect::to(&post_detail_path(post.id)).into_response())
}

pub async fn edit_comment_page(
    State(state): State<AppState>,
    user: AuthUser,
    Path((_post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Html<String>, Rejection> {
    let comment = require_comment_author(&state, comment_id, &user).await?;
    Ok(render(&CommentFormTemplate {
        nav: user.nav(),
        is_edit: true,
        action: comment_edit_path(comment.post_id, comment.id),
        post_id: comment.post_id,
        form: CommentForm {
            text: comment.text,
        },
        errors: FormErrors::default(),
    })?)
}

pub async fn edit_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((_post_id, comment_id)): Path<(i64, i64)>,
    Form(form): Form<CommentForm>,
) -> Result<Response, Rejection> {
    let comment = require_comment_author(&state, comment_id, &user).await?;
    let text = match form.validate() {
        Ok(text) => text,
        Err(errors) => {
            let page = render(&CommentFormTemplate {
                nav: user.nav(),
                is_edit: true,
                action: comment_edit_path(comment.post_id, comment.id),
                post_id: comment.post_id,
                form,
                errors,
            })?;
            return Ok(page.into_response());
        }
    };

    CommentService::new(state.db.clone())
        .update_comment(comment.id, user.user_id, text)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, comment_id, "failed to update comment");
            AppError::internal("failed to update comment")
        })?
        .ok_or_else(|| AppError::not_found("comment not found"))?;

    Ok(Redirect::to(&post_detail_path(comment.post_id)).into_response())
}

pub async fn delete_comment_page(
    State(state): State<AppState>,
    user: AuthUser,
    Path((_post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Html<String>, Rejection> {
    let comment = require_comment_author(&state, comment_id, &user).await?;
    Ok(render(&DeleteCommentTemplate {
        nav: user.nav(),
        action: comment_delete_path(comment.post_id, comment.id),
        comment,
    })?)
}

pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((_post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Redirect, Rejection> {
    let comment = require_comment_author(&state, comment_id, &user).await?;
    let deleted = CommentService::new(state.db.clone())
        .delete_comment(comment.id, user.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, comment_id, "failed to delete comment");
            AppError::internal("failed to delete comment")
        })?;
    if !deleted {
        return Err(AppError::not_found("comment not found").into());
    }

    Ok(Redirect::to(&post_detail_path(comment.post_id)))
}

pub async fn edit_profile_page(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Html<String>, Rejection> {
    let profile = UserService::new(state.db.clone())
        .get_user(user.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = user.user_id, "failed to load user");
            AppError::internal("failed to load profile")
        })?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    Ok(render(&UserTemplate {
        nav: user.nav(),
        form: ProfileForm::from_user(&profile),
        errors: FormErrors::default(),
    })?)
}

pub async fn edit_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, Rejection> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let page = render(&UserTemplate {
                nav: user.nav(),
                form,
                errors,
            })?;
            return Ok(page.into_response());
        }
    };

    let updated = match UserService::new(state.db.clone())
        .update_profile(user.user_id, input)
        .await
    {
        Ok(updated) => updated.ok_or_else(|| AppError::not_found("user not found"))?,
        Err(err) if is_unique_violation(&err, USERNAME_CONSTRAINT) => {
            let mut errors = FormErrors::default();
            errors.add("username", USERNAME_TAKEN);
            let page = render(&UserTemplate {
                nav: user.nav(),
                form,
                errors,
            })?;
            return Ok(page.into_response());
        }
        Err(err) => {
            tracing::error!(error = ?err, user_id = user.user_id, "failed to update profile");
            return Err(AppError::internal("failed to update profile").into());
        }
    };

    Ok(Redirect::to(&profile_path(&updated.username)).into_response())
}

pub async fn login_page(
    viewer: Viewer,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>, AppError> {
    render(&LoginTemplate {
        nav: viewer.nav(),
        form: LoginForm {
            next: query.next.unwrap_or_default(),
            ..LoginForm::default()
        },
        errors: FormErrors::default(),
    })
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let (username, password) = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => return login_failed(form, errors),
    };

    let service = AuthService::new(
        state.db.clone(),
        state.session_key,
        state.session_ttl_minutes,
    );
    let token = service.login(&username, &password).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to log in");
        AppError::internal("failed to log in")
    })?;

    let Some(token) = token else {
        tracing::debug!(username = %username, "login rejected");
        let mut errors = FormErrors::default();
        errors.add_non_field(INVALID_LOGIN);
        return login_failed(form, errors);
    };

    let target = safe_next(&form.next).unwrap_or("/").to_string();
    let jar = jar.add(session_cookie(token, state.secure_cookies));
    Ok((jar, Redirect::to(&target)).into_response())
}

fn login_failed(form: LoginForm, errors: FormErrors) -> Result<Response, AppError> {
    let page = render(&LoginTemplate {
        nav: Nav::default(),
        form: LoginForm {
            password: String::new(),
            ..form
        },
        errors,
    })?;
    Ok(page.into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    if let Some(token) = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()) {
        let service = AuthService::new(
            state.db.clone(),
            state.session_key,
            state.session_ttl_minutes,
        );
        service.end_session(&token).await.map_err(|err| {
            tracing::error!(error = ?err, "failed to end session");
            AppError::internal("failed to log out")
        })?;
    }

    Ok((jar.remove(expired_session_cookie()), Redirect::to("/")))
}

pub async fn registration_page(viewer: Viewer) -> Result<Html<String>, AppError> {
    render(&RegistrationTemplate {
        nav: viewer.nav(),
        form: RegistrationForm::default(),
        errors: FormErrors::default(),
    })
}

pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, AppError> {
    let registration = match form.validate() {
        Ok(registration) => registration,
        Err(errors) => return registration_failed(form, errors),
    };

    let service = AuthService::new(
        state.db.clone(),
        state.session_key,
        state.session_ttl_minutes,
    );
    match service.register(registration).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "user registered");
            Ok(Redirect::to(LOGIN_PATH).into_response())
        }
        Err(err) if is_unique_violation(&err, USERNAME_CONSTRAINT) => {
            let mut errors = FormErrors::default();
            errors.add("username", USERNAME_TAKEN);
            registration_failed(form, errors)
        }
        Err(err) => {
            tracing::error!(error = ?err, "failed to register user");
            Err(AppError::internal("failed to register"))
        }
    }
}

fn registration_failed(form: RegistrationForm, errors: FormErrors) -> Result<Response, AppError> {
    let page = render(&RegistrationTemplate {
        nav: Nav::default(),
        form: RegistrationForm {
            password1: String::new(),
            password2: String::new(),
            ..form
        },
        errors,
    })?;
    Ok(page.into_response())
}
