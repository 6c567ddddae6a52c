use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::user::User;
use crate::infra::db::Db;

/// Name of the unique constraint guarding `users.username`.
pub const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Editable profile fields.
#[derive(Debug, Clone)]
pub struct ProfileInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, first_name, last_name, date_joined \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, first_name, last_name, date_joined \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn update_profile(&self, user_id: i64, input: ProfileInput) -> Result<Option<User>> {
        let row = sqlx::query(
            "UPDATE users \
             SET username = $2, first_name = $3, last_name = $4, email = $5 \
             WHERE id = $1 \
             RETURNING id, username, email, first_name, last_name, date_joined",
        )
        .bind(user_id)
        .bind(input.username)
        .bind(input.first_name)
        .bind(input.last_name)
        .bind(input.email)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }
}

pub(crate) fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        date_joined: row.get("date_joined"),
    }
}

/// True when `err` wraps a Postgres unique violation on `constraint`.
pub fn is_unique_violation(err: &anyhow::Error, constraint: &str) -> bool {
    let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() else {
        return false;
    };
    let Some(db_err) = sqlx_err.as_database_error() else {
        return false;
    };
    db_err.code().as_deref() == Some("23505")
        && db_err.constraint().unwrap_or_default().contains(constraint)
}
