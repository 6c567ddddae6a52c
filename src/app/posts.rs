use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::OffsetDateTime;

use crate::app::pagination::{Page, PageNumber, Paginator, POSTS_PER_PAGE};
use crate::domain::post::{CategoryRef, LocationRef, Post};
use crate::infra::db::Db;

/// Expands to the post projection (author, category, location and comment
/// count joined in) followed by the given clauses.
macro_rules! select_posts {
    ($($tail:literal),* $(,)?) => {
        concat!(
            "SELECT p.id, p.title, p.text, p.pub_date, p.is_published, p.created_at, \
                    p.author_id, u.username AS author_username, \
                    c.id AS category_id, c.title AS category_title, c.slug AS category_slug, \
                    c.is_published AS category_is_published, \
                    l.id AS location_id, l.name AS location_name, \
                    l.is_published AS location_is_published, \
                    (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count \
             FROM posts p \
             JOIN users u ON u.id = p.author_id \
             LEFT JOIN categories c ON c.id = p.category_id \
             LEFT JOIN locations l ON l.id = p.location_id ",
            $($tail),*
        )
    };
}

/// Validated fields of a post as submitted by its author.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub category_id: i64,
    pub location_id: Option<i64>,
}

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Published posts in published categories whose `pub_date` is before
    /// `now`, newest first. `None` when the requested page does not exist.
    pub async fn public_feed(
        &self,
        page: PageNumber,
        now: OffsetDateTime,
    ) -> Result<Option<Page<Post>>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts p \
             JOIN categories c ON c.id = p.category_id \
             WHERE p.is_published AND c.is_published AND p.pub_date < $1",
        )
        .bind(now)
        .fetch_one(self.db.pool())
        .await?;

        let paginator = Paginator::new(total, POSTS_PER_PAGE);
        let Some(number) = paginator.resolve(page) else {
            return Ok(None);
        };

        let rows = sqlx::query(select_posts!(
            "WHERE p.is_published AND c.is_published AND p.pub_date < $1 \
             ORDER BY p.pub_date DESC, p.id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(now)
        .bind(paginator.limit())
        .bind(paginator.offset(number))
        .fetch_all(self.db.pool())
        .await?;

        let posts = rows.iter().map(post_from_row).collect();
        Ok(Some(paginator.page(number, posts)))
    }

    /// The public feed restricted to one category. The caller checks the
    /// category itself is published.
    pub async fn category_feed(
        &self,
        category_id: i64,
        page: PageNumber,
        now: OffsetDateTime,
    ) -> Result<Option<Page<Post>>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts p \
             JOIN categories c ON c.id = p.category_id \
             WHERE p.category_id = $1 \
               AND p.is_published AND c.is_published AND p.pub_date < $2",
        )
        .bind(category_id)
        .bind(now)
        .fetch_one(self.db.pool())
        .await?;

        let paginator = Paginator::new(total, POSTS_PER_PAGE);
        let Some(number) = paginator.resolve(page) else {
            return Ok(None);
        };

        let rows = sqlx::query(select_posts!(
            "WHERE p.category_id = $1 \
               AND p.is_published AND c.is_published AND p.pub_date < $2 \
             ORDER BY p.pub_date DESC, p.id DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(category_id)
        .bind(now)
        .bind(paginator.limit())
        .bind(paginator.offset(number))
        .fetch_all(self.db.pool())
        .await?;

        let posts = rows.iter().map(post_from_row).collect();
        Ok(Some(paginator.page(number, posts)))
    }

    /// Every post by the author, whatever its publication state.
    pub async fn author_feed(&self, author_id: i64, page: PageNumber) -> Result<Option<Page<Post>>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(self.db.pool())
            .await?;

        let paginator = Paginator::new(total, POSTS_PER_PAGE);
        let Some(number) = paginator.resolve(page) else {
            return Ok(None);
        };

        let rows = sqlx::query(select_posts!(
            "WHERE p.author_id = $1 \
             ORDER BY p.pub_date DESC, p.id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(author_id)
        .bind(paginator.limit())
        .bind(paginator.offset(number))
        .fetch_all(self.db.pool())
        .await?;

        let posts = rows.iter().map(post_from_row).collect();
        Ok(Some(paginator.page(number, posts)))
    }

    pub async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(select_posts!("WHERE p.id = $1"))
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    pub async fn create_post(&self, author_id: i64, input: PostInput) -> Result<Post> {
        let post_id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (title, text, pub_date, author_id, category_id, location_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(input.title)
        .bind(input.text)
        .bind(input.pub_date)
        .bind(author_id)
        .bind(input.category_id)
        .bind(input.location_id)
        .fetch_one(self.db.pool())
        .await?;

        self.get_post(post_id)
            .await?
            .ok_or_else(|| anyhow!("post {} missing right after insert", post_id))
    }

    /// Updates the post only if `author_id` owns it.
    pub async fn update_post(
        &self,
        post_id: i64,
        author_id: i64,
        input: PostInput,
    ) -> Result<Option<Post>> {
        let result = sqlx::query(
            "UPDATE posts \
             SET title = $3, text = $4, pub_date = $5, category_id = $6, location_id = $7 \
             WHERE id = $1 AND author_id = $2",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(input.title)
        .bind(input.text)
        .bind(input.pub_date)
        .bind(input.category_id)
        .bind(input.location_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_post(post_id).await
    }

    /// Deletes the post (its comments go with it) only if `author_id` owns it.
    pub async fn delete_post(&self, post_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(post_id)
            .bind(author_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn post_from_row(row: &PgRow) -> Post {
    let category = row
        .get::<Option<i64>, _>("category_id")
        .map(|id| CategoryRef {
            id,
            title: row.get::<Option<String>, _>("category_title").unwrap_or_default(),
            slug: row.get::<Option<String>, _>("category_slug").unwrap_or_default(),
            is_published: row
                .get::<Option<bool>, _>("category_is_published")
                .unwrap_or(false),
        });
    let location = row
        .get::<Option<i64>, _>("location_id")
        .map(|id| LocationRef {
            id,
            name: row.get::<Option<String>, _>("location_name").unwrap_or_default(),
            is_published: row
                .get::<Option<bool>, _>("location_is_published")
                .unwrap_or(false),
        });

    Post {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        pub_date: row.get("pub_date"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        category,
        location,
        comment_count: row.get("comment_count"),
    }
}
