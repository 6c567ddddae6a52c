//! Form bodies posted by the HTML pages and their validation.
//!
//! Every form deserializes from `application/x-www-form-urlencoded` into plain
//! strings so a failed submission can be rendered back exactly as typed.
//! `validate` either yields the typed input for the service layer or a
//! [`FormErrors`] map keyed by field name.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use serde::Deserialize;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::app::auth::Registration;
use crate::app::posts::PostInput;
use crate::app::users::ProfileInput;
use crate::domain::category::Category;
use crate::domain::location::Location;
use crate::domain::post::Post;
use crate::domain::user::User;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

const NON_FIELD: &str = "__all__";
const TITLE_MAX_CHARS: usize = 256;
const NAME_MAX_CHARS: usize = 150;
const EMAIL_MAX_CHARS: usize = 254;
const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_MAX_CHARS: usize = 128;

#[derive(Debug, Default, Clone)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(NON_FIELD, message);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[cfg(test)]
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        self.field(NON_FIELD)
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub category: String,
    pub location: String,
}

impl PostForm {
    /// Empty form with the publication date preset to `now`.
    pub fn blank(now: OffsetDateTime) -> Self {
        Self {
            pub_date: format_datetime_input(now),
            ..Self::default()
        }
    }

    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: format_datetime_input(post.pub_date),
            category: post
                .category
                .as_ref()
                .map(|category| category.id.to_string())
                .unwrap_or_default(),
            location: post
                .location
                .as_ref()
                .map(|location| location.id.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn is_category_selected(&self, category_id: impl Borrow<i64>) -> bool {
        self.category.trim() == category_id.borrow().to_string()
    }

    pub fn is_location_selected(&self, location_id: impl Borrow<i64>) -> bool {
        self.location.trim() == location_id.borrow().to_string()
    }

    pub fn validate(
        &self,
        categories: &[Category],
        locations: &[Location],
    ) -> Result<PostInput, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim().to_string();
        if title.is_empty() {
            errors.add("title", REQUIRED);
        } else {
            check_max_chars(&mut errors, "title", &title, TITLE_MAX_CHARS);
        }

        let text = self.text.trim().to_string();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }

        let pub_date = match self.pub_date.trim() {
            "" => {
                errors.add("pub_date", REQUIRED);
                None
            }
            value => {
                let parsed = parse_datetime_input(value);
                if parsed.is_none() {
                    errors.add("pub_date", "Enter a valid date/time.");
                }
                parsed
            }
        };

        let category_id = match self.category.trim() {
            "" => {
                errors.add("category", REQUIRED);
                None
            }
            value => {
                let id = value
                    .parse::<i64>()
                    .ok()
                    .filter(|id| categories.iter().any(|category| category.id == *id));
                if id.is_none() {
                    errors.add("category", INVALID_CHOICE);
                }
                id
            }
        };

        let location_id = match self.location.trim() {
            "" => None,
            value => {
                let id = value
                    .parse::<i64>()
                    .ok()
                    .filter(|id| locations.iter().any(|location| location.id == *id));
                if id.is_none() {
                    errors.add("location", INVALID_CHOICE);
                }
                id
            }
        };

        match (pub_date, category_id) {
            (Some(pub_date), Some(category_id)) if errors.is_empty() => Ok(PostInput {
                title,
                text,
                pub_date,
                category_id,
                location_id,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        let text = self.text.trim().to_string();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }
        errors.into_result(|| text)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }

    pub fn validate(&self) -> Result<ProfileInput, FormErrors> {
        let mut errors = FormErrors::default();
        let username = self.username.trim().to_string();
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let email = self.email.trim().to_string();

        check_username(&mut errors, &username);
        check_max_chars(&mut errors, "first_name", &first_name, NAME_MAX_CHARS);
        check_max_chars(&mut errors, "last_name", &last_name, NAME_MAX_CHARS);
        check_email(&mut errors, &email);

        errors.into_result(|| ProfileInput {
            username,
            first_name,
            last_name,
            email,
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: String,
}

impl LoginForm {
    /// Returns the trimmed username and the password as typed.
    pub fn validate(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::default();
        let username = self.username.trim().to_string();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result(|| (username, self.password.clone()))
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password1: String,
    pub password2: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<Registration, FormErrors> {
        let mut errors = FormErrors::default();
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_string();
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();

        check_username(&mut errors, &username);
        check_email(&mut errors, &email);
        check_max_chars(&mut errors, "first_name", &first_name, NAME_MAX_CHARS);
        check_max_chars(&mut errors, "last_name", &last_name, NAME_MAX_CHARS);

        let password_len = self.password1.chars().count();
        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if password_len < PASSWORD_MIN_CHARS {
            errors.add(
                "password1",
                "This password is too short. It must contain at least 8 characters.",
            );
        } else if password_len > PASSWORD_MAX_CHARS {
            errors.add("password1", "Ensure this value has at most 128 characters.");
        } else if self.password1.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password1", "This password is entirely numeric.");
        }

        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.into_result(|| Registration {
            username,
            email,
            first_name,
            last_name,
            password: self.password1.clone(),
        })
    }
}

fn check_max_chars(errors: &mut FormErrors, field: &'static str, value: &str, max: usize) {
    let count = value.chars().count();
    if count > max {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, count
            ),
        );
    }
}

fn check_username(errors: &mut FormErrors, username: &str) {
    if username.is_empty() {
        errors.add("username", REQUIRED);
        return;
    }
    check_max_chars(errors, "username", username, NAME_MAX_CHARS);
    let allowed = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !allowed {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn check_email(errors: &mut FormErrors, email: &str) {
    if email.is_empty() {
        return;
    }
    check_max_chars(errors, "email", email, EMAIL_MAX_CHARS);
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && (domain.contains('.') || domain == "localhost")
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        errors.add("email", "Enter a valid email address.");
    }
}

/// Accepts the values produced by `<input type="datetime-local">` and bare
/// dates, interpreted as UTC.
pub fn parse_datetime_input(value: &str) -> Option<OffsetDateTime> {
    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let without_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    let with_space = format_description!("[year]-[month]-[day] [hour]:[minute]");
    let date_only = format_description!("[year]-[month]-[day]");

    if let Ok(parsed) = PrimitiveDateTime::parse(value, &with_seconds) {
        return Some(parsed.assume_utc());
    }
    if let Ok(parsed) = PrimitiveDateTime::parse(value, &without_seconds) {
        return Some(parsed.assume_utc());
    }
    if let Ok(parsed) = PrimitiveDateTime::parse(value, &with_space) {
        return Some(parsed.assume_utc());
    }
    time::Date::parse(value, &date_only)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

pub fn format_datetime_input(value: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    value
        .to_offset(time::UtcOffset::UTC)
        .format(&format)
        .unwrap_or_default()
}
