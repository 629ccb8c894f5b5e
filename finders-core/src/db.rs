use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::debug;

use crate::config::FinderConfig;
use crate::errors::Result;

/// Wrapper around the Postgres connection pool backing the SQL record sources.
#[derive(Clone)]
pub struct DatabasePool {
    pool: Pool<Postgres>,
}

impl DatabasePool {
    /// Establishes a new connection pool based on the finder configuration.
    pub async fn connect(config: &FinderConfig) -> Result<Self> {
        Self::connect_with_url(config.database_url()?).await
    }

    /// Establishes a connection pool directly from a database URL.
    pub async fn connect_with_url(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Builds a pool that only connects on first use.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    /// Applies the embedded schema migrations (`alert_management_alerts`, `snippets`).
    pub async fn migrate(&self) -> Result<()> {
        debug!("running finder migrations");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn inner(&self) -> &Pool<Postgres> {
        &self.pool
    }
}
