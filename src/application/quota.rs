//! Two-counter quota gating roast generation.
//!
//! The tracker only reads. The caller records an event after producing the
//! artifact, so two concurrent submissions for the same identity can both pass
//! the check before either row lands. That window is accepted.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::debug;

use super::clock::Clock;
use super::repos::{QuotaEventsRepo, RepoError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    /// Events allowed across all identities within `window`.
    pub global_limit: u64,
    /// Lifetime events allowed per identity.
    pub identity_limit: u64,
    pub window: Duration,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            global_limit: 100,
            identity_limit: 10,
            window: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed,
    GlobalLimitExceeded,
    IdentityLimitExceeded,
}

#[derive(Clone)]
pub struct QuotaTracker {
    events: Arc<dyn QuotaEventsRepo>,
    clock: Arc<dyn Clock>,
    policy: QuotaPolicy,
}

impl QuotaTracker {
    pub fn new(events: Arc<dyn QuotaEventsRepo>, clock: Arc<dyn Clock>, policy: QuotaPolicy) -> Self {
        Self {
            events,
            clock,
            policy,
        }
    }

    /// Global window first, then the identity's lifetime count.
    pub async fn check(&self, identity: &str) -> Result<QuotaDecision, RepoError> {
        let window = time::Duration::try_from(self.policy.window).unwrap_or(time::Duration::MAX);
        let since = self
            .clock
            .now()
            .checked_sub(window)
            .unwrap_or(time::OffsetDateTime::UNIX_EPOCH);

        let global = self.events.count_events_since(since).await?;
        if global >= self.policy.global_limit {
            debug!(target = "framecard::quota", global, "global quota exhausted");
            counter!("framecard_quota_rejections_total", "scope" => "global").increment(1);
            return Ok(QuotaDecision::GlobalLimitExceeded);
        }

        let used = self.events.count_events_for_identity(identity).await?;
        if used >= self.policy.identity_limit {
            debug!(target = "framecard::quota", identity, used, "identity quota exhausted");
            counter!("framecard_quota_rejections_total", "scope" => "identity").increment(1);
            return Ok(QuotaDecision::IdentityLimitExceeded);
        }

        Ok(QuotaDecision::Allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::ManualClock;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::OffsetDateTime;
    use time::macros::datetime;

    #[derive(Default)]
    struct EventLog {
        events: Mutex<Vec<(String, OffsetDateTime)>>,
        identity_queries: AtomicUsize,
    }

    impl EventLog {
        fn record(&self, identity: &str, at: OffsetDateTime, times: usize) {
            let mut events = self.events.lock().unwrap();
            for _ in 0..times {
                events.push((identity.to_string(), at));
            }
        }
    }

    #[async_trait]
    impl QuotaEventsRepo for EventLog {
        async fn count_events_since(&self, since: OffsetDateTime) -> Result<u64, RepoError> {
            let events = self.events.lock().unwrap();
            Ok(events.iter().filter(|(_, at)| *at >= since).count() as u64)
        }

        async fn count_events_for_identity(&self, identity: &str) -> Result<u64, RepoError> {
            self.identity_queries.fetch_add(1, Ordering::SeqCst);
            let events = self.events.lock().unwrap();
            Ok(events.iter().filter(|(who, _)| who == identity).count() as u64)
        }
    }

    fn tracker(log: Arc<EventLog>) -> (QuotaTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(datetime!(2024-09-10 09:00 UTC)));
        let tracker = QuotaTracker::new(log, clock.clone(), QuotaPolicy::default());
        (tracker, clock)
    }

    #[tokio::test]
    async fn fresh_identity_is_allowed() {
        let (tracker, _) = tracker(Arc::new(EventLog::default()));
        assert_eq!(tracker.check("42").await.unwrap(), QuotaDecision::Allowed);
    }

    #[tokio::test]
    async fn hundred_events_in_window_exhaust_the_global_quota() {
        let log = Arc::new(EventLog::default());
        let (tracker, clock) = tracker(log.clone());
        log.record("1", clock.now() - time::Duration::hours(23), 99);
        assert_eq!(tracker.check("2").await.unwrap(), QuotaDecision::Allowed);

        log.record("1", clock.now(), 1);
        assert_eq!(
            tracker.check("2").await.unwrap(),
            QuotaDecision::GlobalLimitExceeded
        );
    }

    #[tokio::test]
    async fn global_exhaustion_wins_over_identity_headroom() {
        let log = Arc::new(EventLog::default());
        let (tracker, clock) = tracker(log.clone());
        log.record("1", clock.now(), 100);

        assert_eq!(
            tracker.check("fresh").await.unwrap(),
            QuotaDecision::GlobalLimitExceeded
        );
        assert_eq!(log.identity_queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn events_older_than_the_window_do_not_count_globally() {
        let log = Arc::new(EventLog::default());
        let (tracker, clock) = tracker(log.clone());
        log.record("1", clock.now() - time::Duration::hours(25), 100);
        assert_eq!(tracker.check("2").await.unwrap(), QuotaDecision::Allowed);
    }

    #[tokio::test]
    async fn identity_cap_is_lifetime() {
        let log = Arc::new(EventLog::default());
        let (tracker, clock) = tracker(log.clone());
        log.record("7", clock.now() - time::Duration::days(400), 10);

        assert_eq!(
            tracker.check("7").await.unwrap(),
            QuotaDecision::IdentityLimitExceeded
        );
        assert_eq!(tracker.check("8").await.unwrap(), QuotaDecision::Allowed);
    }
}
