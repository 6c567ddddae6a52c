use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::comment::Comment;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// All comments on the post, oldest first.
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT cm.id, cm.text, cm.post_id, cm.author_id, u.username AS author_username, \
                    cm.is_published, cm.created_at \
             FROM comments cm \
             JOIN users u ON u.id = cm.author_id \
             WHERE cm.post_id = $1 \
             ORDER BY cm.created_at ASC, cm.id ASC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    pub async fn get_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT cm.id, cm.text, cm.post_id, cm.author_id, u.username AS author_username, \
                    cm.is_published, cm.created_at \
             FROM comments cm \
             JOIN users u ON u.id = cm.author_id \
             WHERE cm.id = $1",
        )
        .bind(comment_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(comment_from_row))
    }

    pub async fn create_comment(&self, post_id: i64, author_id: i64, text: String) -> Result<Comment> {
        let row = sqlx::query(
            "WITH inserted_comment AS ( \
                INSERT INTO comments (text, post_id, author_id) VALUES ($1, $2, $3) \
                RETURNING id, text, post_id, author_id, is_published, created_at \
             ) \
             SELECT cm.*, u.username AS author_username \
             FROM inserted_comment cm \
             JOIN users u ON u.id = cm.author_id",
        )
        .bind(text)
        .bind(post_id)
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(comment_from_row(&row))
    }

    /// Rewrites the text only if `author_id` wrote the comment.
    pub async fn update_comment(
        &self,
        comment_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "WITH updated_comment AS ( \
                UPDATE comments SET text = $3 \
                WHERE id = $1 AND author_id = $2 \
                RETURNING id, text, post_id, author_id, is_published, created_at \
             ) \
             SELECT cm.*, u.username AS author_username \
             FROM updated_comment cm \
             JOIN users u ON u.id = cm.author_id",
        )
        .bind(comment_id)
        .bind(author_id)
        .bind(text)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(comment_from_row))
    }

    pub async fn delete_comment(&self, comment_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND author_id = $2")
            .bind(comment_id)
            .bind(author_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        text: row.get("text"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
    }
}
