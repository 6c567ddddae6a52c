use anyhow::Result;
use sqlx::Row;

use crate::domain::location::Location;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct LocationService {
    db: Db,
}

impl LocationService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Choices offered by the post form.
    pub async fn list_all(&self) -> Result<Vec<Location>> {
        let rows = sqlx::query(
            "SELECT id, name, is_published, created_at FROM locations ORDER BY name, id",
        )
        .fetch_all(self.db.pool())
        .await?;

        let mut locations = Vec::with_capacity(rows.len());
        for row in rows {
            locations.push(Location {
                id: row.get("id"),
                name: row.get("name"),
                is_published: row.get("is_published"),
                created_at: row.get("created_at"),
            });
        }

        Ok(locations)
    }
}
