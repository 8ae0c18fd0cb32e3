use std::sync::Arc;
use std::time::Duration;

use super::clock::Clock;
use super::stale_cache::{CacheError, StaleCache};
use super::upstream::{ChannelSource, UpstreamError};
use crate::domain::channels::ChannelStats;

/// Aggregate key in the cache table.
pub const CHANNEL_STATS_KEY: &str = "channel-stats";

#[derive(Clone)]
pub struct ChannelStatsService {
    cache: StaleCache,
    source: Arc<dyn ChannelSource>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

impl ChannelStatsService {
    pub fn new(
        cache: StaleCache,
        source: Arc<dyn ChannelSource>,
        clock: Arc<dyn Clock>,
        stale_after: Duration,
    ) -> Self {
        Self {
            cache,
            source,
            clock,
            stale_after,
        }
    }

    pub async fn stats(&self) -> Result<ChannelStats, CacheError> {
        let source = self.source.clone();
        let clock = self.clock.clone();
        self.cache
            .get_or_compute(CHANNEL_STATS_KEY, self.stale_after, move || async move {
                let channels = source.fetch_channels().await?;
                Ok::<_, UpstreamError>(ChannelStats::compute(&channels, clock.now()))
            })
            .await
    }
}
