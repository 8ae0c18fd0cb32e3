//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{CachedAggregateRecord, NewRoastRecord, RoastRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Single-row-per-key store for expensive aggregates.
#[async_trait]
pub trait AggregateCacheRepo: Send + Sync {
    async fn find_aggregate(&self, key: &str) -> Result<Option<CachedAggregateRecord>, RepoError>;

    /// Insert or replace the row for `record.key`.
    async fn upsert_aggregate(&self, record: CachedAggregateRecord) -> Result<(), RepoError>;
}

/// Read side of the insertion-only quota event log.
#[async_trait]
pub trait QuotaEventsRepo: Send + Sync {
    async fn count_events_since(&self, since: OffsetDateTime) -> Result<u64, RepoError>;

    async fn count_events_for_identity(&self, identity: &str) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait RoastsRepo: Send + Sync {
    /// Case-insensitive lookup of the most recent roast for a profile.
    async fn find_roast(&self, username: &str) -> Result<Option<RoastRecord>, RepoError>;

    async fn insert_roast(&self, roast: NewRoastRecord) -> Result<RoastRecord, RepoError>;
}
