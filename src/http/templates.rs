use askama::Template;
use axum::response::Html;

use crate::app::pagination::Page;
use crate::domain::category::Category;
use crate::domain::comment::Comment;
use crate::domain::location::Location;
use crate::domain::post::Post;
use crate::domain::user::User;
use crate::http::error::AppError;
use crate::http::forms::{
    CommentForm, FormErrors, LoginForm, PostForm, ProfileForm, RegistrationForm,
};

/// Navigation bar state shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    username: Option<String>,
}

impl Nav {
    pub fn new(username: Option<String>) -> Self {
        Self { username }
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or("")
    }
}

#[derive(Template)]
#[template(path = "blog/index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub page: Page<Post>,
}

#[derive(Template)]
#[template(path = "blog/category.html")]
pub struct CategoryTemplate {
    pub nav: Nav,
    pub category: Category,
    pub page: Page<Post>,
}

#[derive(Template)]
#[template(path = "blog/profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub profile: User,
    pub page: Page<Post>,
    pub is_owner: bool,
}

#[derive(Template)]
#[template(path = "blog/detail.html")]
pub struct DetailTemplate {
    pub nav: Nav,
    pub post: Post,
    pub comments: Vec<Comment>,
    pub form: CommentForm,
    pub errors: FormErrors,
    /// Requester id, `0` for anonymous viewers.
    pub viewer_id: i64,
}

#[derive(Template)]
#[template(path = "blog/create.html")]
pub struct PostFormTemplate {
    pub nav: Nav,
    pub is_edit: bool,
    pub action: String,
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
    pub form: PostForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "blog/delete_post.html")]
pub struct DeletePostTemplate {
    pub nav: Nav,
    pub post: Post,
}

#[derive(Template)]
#[template(path = "blog/comment.html")]
pub struct CommentFormTemplate {
    pub nav: Nav,
    pub is_edit: bool,
    pub action: String,
    pub post_id: i64,
    pub form: CommentForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "blog/delete_comment.html")]
pub struct DeleteCommentTemplate {
    pub nav: Nav,
    pub action: String,
    pub comment: Comment,
}

#[derive(Template)]
#[template(path = "blog/user.html")]
pub struct UserTemplate {
    pub nav: Nav,
    pub form: ProfileForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "registration/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub form: LoginForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "registration/registration_form.html")]
pub struct RegistrationTemplate {
    pub nav: Nav,
    pub form: RegistrationForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "pages/error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub reason: String,
    pub message: String,
}

pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    template.render().map(Html).map_err(|err| {
        tracing::error!(error = ?err, "failed to render template");
        AppError::internal("failed to render page")
    })
}
