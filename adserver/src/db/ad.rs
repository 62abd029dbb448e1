use async_trait::async_trait;
use chrono::{DateTime, Utc};
use primitives::Advertisement;
use tokio_postgres::types::Json;

use crate::db::{AdRepository, DbPool, RepositoryError};

/// [`AdRepository`] backed by the `ads` table.
///
/// Conditions are stored as a single `JSONB` column; only the validity
/// window is part of the relational shape, so only the temporal gate is
/// pushed into SQL.
#[derive(Clone)]
pub struct PostgresAdRepository {
    pool: DbPool,
}

impl PostgresAdRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdRepository for PostgresAdRepository {
    async fn add(&self, ad: &Advertisement) -> Result<(), RepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare("INSERT INTO ads (title, start_at, end_at, conditions) VALUES ($1, $2, $3, $4)")
            .await?;

        client
            .execute(
                &stmt,
                &[&ad.title, &ad.start_at, &ad.end_at, &Json(&ad.conditions)],
            )
            .await?;

        Ok(())
    }

    async fn active(&self, now: DateTime<Utc>) -> Result<Vec<Advertisement>, RepositoryError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(
                "SELECT title, start_at, end_at, conditions FROM ads WHERE start_at <= $1 AND end_at >= $1",
            )
            .await?;

        let rows = client.query(&stmt, &[&now]).await?;

        // a single row failing to decode aborts the whole listing
        rows.iter()
            .map(|row| Advertisement::try_from(row).map_err(RepositoryError::from))
            .collect()
    }
}
