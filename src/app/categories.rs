use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::category::Category;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct CategoryService {
    db: Db,
}

impl CategoryService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Looks a category up by slug, hiding unpublished ones.
    pub async fn get_published(&self, slug: &str) -> Result<Option<Category>> {
        let row = sqlx::query(
            "SELECT id, title, description, slug, is_published, created_at \
             FROM categories WHERE slug = $1 AND is_published",
        )
        .bind(slug)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(category_from_row))
    }

    /// Choices offered by the post form.
    pub async fn list_all(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, title, description, slug, is_published, created_at \
             FROM categories ORDER BY title, id",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(category_from_row).collect())
    }
}

fn category_from_row(row: &PgRow) -> Category {
    Category {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        slug: row.get("slug"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
    }
}
