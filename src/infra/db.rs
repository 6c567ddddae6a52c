use anyhow::{Context, Result};
use sqlx::postgres::{PgPoolOptions, Postgres};
use sqlx::pool::PoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::AppConfig;

/// Shared handle to the blog's Postgres pool.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let pool = pool_options(config)
            .connect(&config.database_url)
            .await
            .context("failed to connect to the blog database")?;
        tracing::info!(
            max_connections = config.db_max_connections,
            "database pool ready"
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health probe used by `/health`.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Brings the users, taxonomy, post, comment and session tables up to date.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to apply blog migrations")?;
        tracing::info!("blog schema is up to date");
        Ok(())
    }
}

fn pool_options(config: &AppConfig) -> PoolOptions<Postgres> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout_seconds))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime_seconds))
}
