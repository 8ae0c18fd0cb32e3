use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{AggregateCacheRepo, RepoError},
    domain::entities::CachedAggregateRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct AggregateRow {
    key: String,
    value: serde_json::Value,
    updated_at: OffsetDateTime,
}

impl From<AggregateRow> for CachedAggregateRecord {
    fn from(row: AggregateRow) -> Self {
        Self {
            key: row.key,
            value: row.value,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl AggregateCacheRepo for PostgresRepositories {
    async fn find_aggregate(&self, key: &str) -> Result<Option<CachedAggregateRecord>, RepoError> {
        let row = sqlx::query_as::<_, AggregateRow>(
            r#"
            SELECT key, value, updated_at
            FROM aggregate_cache
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CachedAggregateRecord::from))
    }

    async fn upsert_aggregate(&self, record: CachedAggregateRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO aggregate_cache (key, value, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&record.key)
        .bind(&record.value)
        .bind(record.updated_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
