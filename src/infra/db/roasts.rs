use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{QuotaEventsRepo, RepoError, RoastsRepo},
    domain::entities::{NewRoastRecord, RoastRecord},
};

use super::{PostgresRepositories, map_sqlx_error, util::convert_count};

#[derive(sqlx::FromRow)]
struct RoastRow {
    id: Uuid,
    username: String,
    fid: String,
    cast_hash: Option<String>,
    roast: String,
    created_at: OffsetDateTime,
}

impl From<RoastRow> for RoastRecord {
    fn from(row: RoastRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            fid: row.fid,
            cast_hash: row.cast_hash,
            roast: row.roast,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl RoastsRepo for PostgresRepositories {
    async fn find_roast(&self, username: &str) -> Result<Option<RoastRecord>, RepoError> {
        let row = sqlx::query_as::<_, RoastRow>(
            r#"
            SELECT id, username, fid, cast_hash, roast, created_at
            FROM roasts
            WHERE LOWER(username) = LOWER($1)
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(RoastRecord::from))
    }

    async fn insert_roast(&self, roast: NewRoastRecord) -> Result<RoastRecord, RepoError> {
        let row = sqlx::query_as::<_, RoastRow>(
            r#"
            INSERT INTO roasts (id, username, fid, cast_hash, roast)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, fid, cast_hash, roast, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&roast.username)
        .bind(&roast.fid)
        .bind(&roast.cast_hash)
        .bind(&roast.roast)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(RoastRecord::from(row))
    }
}

#[async_trait]
impl QuotaEventsRepo for PostgresRepositories {
    async fn count_events_since(&self, since: OffsetDateTime) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roasts WHERE created_at >= $1")
            .bind(since)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        convert_count(count)
    }

    async fn count_events_for_identity(&self, identity: &str) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roasts WHERE fid = $1")
            .bind(identity)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        convert_count(count)
    }
}
