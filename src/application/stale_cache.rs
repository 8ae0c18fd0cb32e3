//! Stale-while-revalidate cache over the aggregate store.
//!
//! | stored row                 | response        | recompute            |
//! |----------------------------|-----------------|----------------------|
//! | missing or unreadable      | computed value  | inline, persisted    |
//! | `age < stale_after`        | stored value    | none                 |
//! | `age >= stale_after`       | stored value    | background, persisted|
//!
//! There is no single-flight guard: concurrent stale reads may each schedule a
//! refresh. Writes are whole-row upserts keyed by `key`, so the duplicates only
//! cost upstream calls.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::background::BackgroundTasks;
use super::clock::Clock;
use super::repos::{AggregateCacheRepo, RepoError};
use crate::domain::entities::CachedAggregateRecord;

const SOURCE: &str = "application::stale_cache";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to compute `{key}`: {message}")]
    Compute { key: String, message: String },
    #[error("failed to encode `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

impl Freshness {
    pub fn classify(updated_at: OffsetDateTime, now: OffsetDateTime, stale_after: Duration) -> Self {
        let threshold = time::Duration::try_from(stale_after).unwrap_or(time::Duration::MAX);
        if now - updated_at >= threshold {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }
}

#[derive(Clone)]
pub struct StaleCache {
    repo: Arc<dyn AggregateCacheRepo>,
    clock: Arc<dyn Clock>,
    tasks: BackgroundTasks,
}

impl StaleCache {
    pub fn new(
        repo: Arc<dyn AggregateCacheRepo>,
        clock: Arc<dyn Clock>,
        tasks: BackgroundTasks,
    ) -> Self {
        Self { repo, clock, tasks }
    }

    pub async fn get_or_compute<T, F, Fut, E>(
        &self,
        key: &str,
        stale_after: Duration,
        compute: F,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let stored = match self.repo.find_aggregate(key).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(target = SOURCE, key, error = %err, "aggregate lookup failed; recomputing");
                None
            }
        };

        let Some(record) = stored else {
            counter!("framecard_cache_miss_total").increment(1);
            return self.compute_now(key, compute).await;
        };

        let value: T = match serde_json::from_value(record.value) {
            Ok(value) => value,
            Err(err) => {
                warn!(target = SOURCE, key, error = %err, "stored aggregate no longer decodes");
                counter!("framecard_cache_miss_total").increment(1);
                return self.compute_now(key, compute).await;
            }
        };

        match Freshness::classify(record.updated_at, self.clock.now(), stale_after) {
            Freshness::Fresh => {
                counter!("framecard_cache_hit_total").increment(1);
                debug!(target = SOURCE, key, "serving fresh aggregate");
            }
            Freshness::Stale => {
                counter!("framecard_cache_stale_total").increment(1);
                debug!(target = SOURCE, key, "serving stale aggregate, refreshing");
                self.refresh_in_background(key.to_string(), compute);
            }
        }

        Ok(value)
    }

    async fn compute_now<T, F, Fut, E>(&self, key: &str, compute: F) -> Result<T, CacheError>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let value = compute().await.map_err(|err| CacheError::Compute {
            key: key.to_string(),
            message: err.to_string(),
        })?;

        let stored = match encode(key, &value) {
            Ok(encoded) => store(self.repo.as_ref(), self.clock.as_ref(), key, encoded).await,
            Err(err) => Err(err),
        };
        if let Err(err) = stored {
            warn!(target = SOURCE, key, error = %err, "failed to persist computed aggregate");
        }

        Ok(value)
    }

    fn refresh_in_background<T, F, Fut, E>(&self, key: String, compute: F)
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let repo = self.repo.clone();
        let clock = self.clock.clone();
        self.tasks.spawn("aggregate-refresh", async move {
            let value = compute().await.map_err(|err| CacheError::Compute {
                key: key.clone(),
                message: err.to_string(),
            })?;
            let encoded = encode(&key, &value)?;
            store(repo.as_ref(), clock.as_ref(), &key, encoded).await
        });
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<serde_json::Value, CacheError> {
    serde_json::to_value(value).map_err(|source| CacheError::Encode {
        key: key.to_string(),
        source,
    })
}

async fn store(
    repo: &dyn AggregateCacheRepo,
    clock: &dyn Clock,
    key: &str,
    value: serde_json::Value,
) -> Result<(), CacheError> {
    repo.upsert_aggregate(CachedAggregateRecord {
        key: key.to_string(),
        value,
        updated_at: clock.now(),
    })
    .await?;
    Ok(())
}
