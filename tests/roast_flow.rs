use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use time::macros::datetime;
use tokio::sync::Notify;
use uuid::Uuid;

use framecard::application::background::BackgroundTasks;
use framecard::application::clock::ManualClock;
use framecard::application::quota::{QuotaPolicy, QuotaTracker};
use framecard::application::repos::{QuotaEventsRepo, RepoError, RoastsRepo};
use framecard::application::roast::{
    RoastOutcome, RoastPolicy, RoastRequest, RoastService, Submission,
};
use framecard::application::upstream::{ProfileDirectory, RoastGenerator, UpstreamError};
use framecard::domain::entities::{NewRoastRecord, RoastRecord};
use framecard::domain::profile::ProfileName;

const NOW: OffsetDateTime = datetime!(2024-09-01 12:00 UTC);

#[derive(Default)]
struct MemoryRoasts {
    rows: Mutex<Vec<RoastRecord>>,
    /// Events attributed to other callers inside the window.
    other_events: u64,
    operations: AtomicUsize,
}

impl MemoryRoasts {
    fn with_other_events(count: u64) -> Self {
        Self {
            other_events: count,
            ..Self::default()
        }
    }

    fn seed(&self, username: &str, fid: &str, roast: &str) {
        self.rows.lock().unwrap().push(RoastRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            fid: fid.to_string(),
            cast_hash: None,
            roast: roast.to_string(),
            created_at: NOW,
        });
    }

    fn stored(&self) -> Vec<RoastRecord> {
        self.rows.lock().unwrap().clone()
    }

    fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoastsRepo for MemoryRoasts {
    async fn find_roast(&self, username: &str) -> Result<Option<RoastRecord>, RepoError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|row| row.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn insert_roast(&self, roast: NewRoastRecord) -> Result<RoastRecord, RepoError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        let record = RoastRecord {
            id: Uuid::new_v4(),
            username: roast.username,
            fid: roast.fid,
            cast_hash: roast.cast_hash,
            roast: roast.roast,
            created_at: NOW,
        };
        self.rows.lock().unwrap().push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl QuotaEventsRepo for MemoryRoasts {
    async fn count_events_since(&self, since: OffsetDateTime) -> Result<u64, RepoError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        let own = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.created_at >= since)
            .count() as u64;
        Ok(own + self.other_events)
    }

    async fn count_events_for_identity(&self, identity: &str) -> Result<u64, RepoError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.fid == identity)
            .count() as u64)
    }
}

struct Profiles {
    exists: bool,
    calls: AtomicUsize,
}

impl Profiles {
    fn new(exists: bool) -> Self {
        Self {
            exists,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProfileDirectory for Profiles {
    async fn profile_exists(&self, _profile: &ProfileName) -> Result<bool, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.exists)
    }
}

struct Generator {
    /// When set, generation waits for a permit.
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl Generator {
    fn immediate() -> Self {
        Self {
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoastGenerator for Generator {
    async fn generate(&self, profile: &ProfileName) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(format!("{profile} commits like it's 2009"))
    }
}

struct Harness {
    service: RoastService,
    roasts: Arc<MemoryRoasts>,
    profiles: Arc<Profiles>,
    generator: Arc<Generator>,
    tasks: BackgroundTasks,
}

fn harness(
    roasts: MemoryRoasts,
    profiles: Profiles,
    generator: Generator,
    timeout: Duration,
) -> Harness {
    let roasts = Arc::new(roasts);
    let profiles = Arc::new(profiles);
    let generator = Arc::new(generator);
    let tasks = BackgroundTasks::new();

    let quota = QuotaTracker::new(
        roasts.clone(),
        Arc::new(ManualClock::new(NOW)),
        QuotaPolicy::default(),
    );
    let service = RoastService::new(
        roasts.clone(),
        quota,
        profiles.clone(),
        generator.clone(),
        tasks.clone(),
        RoastPolicy {
            reserved_profile: "andrei0x309".to_string(),
            generation_timeout: timeout,
        },
    );

    Harness {
        service,
        roasts,
        profiles,
        generator,
        tasks,
    }
}

fn submit(subject: &str, fid: u64) -> RoastRequest {
    RoastRequest::submit(
        subject,
        Submission {
            fid,
            cast_hash: Some("0xa48d".to_string()),
        },
    )
}

fn profile(name: &str) -> ProfileName {
    ProfileName::parse(name).expect("valid profile")
}

#[tokio::test]
async fn reserved_subject_short_circuits_before_any_io() {
    let h = harness(
        MemoryRoasts::default(),
        Profiles::new(true),
        Generator::immediate(),
        Duration::from_secs(1),
    );

    let outcome = h.service.handle(submit("Andrei0x309", 7)).await;

    assert_eq!(outcome, RoastOutcome::Author);
    assert_eq!(h.roasts.operations(), 0);
    assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn unknown_subject_is_rejected_without_a_quota_check() {
    let h = harness(
        MemoryRoasts::default(),
        Profiles::new(false),
        Generator::immediate(),
        Duration::from_secs(1),
    );

    let outcome = h.service.handle(submit("ghost-user", 7)).await;

    assert_eq!(outcome, RoastOutcome::InvalidProfile);
    assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.roasts.operations(), 0);
}

#[tokio::test]
async fn malformed_subject_never_reaches_the_directory() {
    let h = harness(
        MemoryRoasts::default(),
        Profiles::new(true),
        Generator::immediate(),
        Duration::from_secs(1),
    );

    let outcome = h.service.handle(submit("not a profile!", 7)).await;

    assert_eq!(outcome, RoastOutcome::InvalidProfile);
    assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn global_limit_blocks_generation() {
    let h = harness(
        MemoryRoasts::with_other_events(100),
        Profiles::new(true),
        Generator::immediate(),
        Duration::from_secs(1),
    );

    let outcome = h.service.handle(submit("torvalds", 7)).await;

    assert_eq!(outcome, RoastOutcome::GlobalLimit);
    assert_eq!(h.generator.calls(), 0);
    assert!(h.roasts.stored().is_empty());
}

#[tokio::test]
async fn identity_limit_applies_per_fid() {
    let roasts = MemoryRoasts::default();
    for n in 0..10 {
        roasts.seed(&format!("user{n}"), "7", "old roast");
    }
    let h = harness(
        roasts,
        Profiles::new(true),
        Generator::immediate(),
        Duration::from_secs(1),
    );

    assert_eq!(
        h.service.handle(submit("torvalds", 7)).await,
        RoastOutcome::IdentityLimit
    );
    assert_eq!(h.generator.calls(), 0);

    let other = h.service.handle(submit("torvalds", 8)).await;
    assert!(matches!(other, RoastOutcome::Ready { submitted: true, .. }));
}

#[tokio::test]
async fn viewing_without_a_stored_roast_asks_for_a_submission() {
    let h = harness(
        MemoryRoasts::default(),
        Profiles::new(true),
        Generator::immediate(),
        Duration::from_secs(1),
    );

    let outcome = h.service.handle(RoastRequest::view("torvalds")).await;

    assert_eq!(
        outcome,
        RoastOutcome::NotFound {
            profile: profile("torvalds")
        }
    );
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn stored_roasts_are_found_case_insensitively() {
    let roasts = MemoryRoasts::default();
    roasts.seed("Torvalds", "3", "stored roast");
    let h = harness(
        roasts,
        Profiles::new(true),
        Generator::immediate(),
        Duration::from_secs(1),
    );

    let outcome = h.service.handle(RoastRequest::view("torvalds")).await;

    assert_eq!(
        outcome,
        RoastOutcome::Ready {
            profile: profile("torvalds"),
            roast: "stored roast".to_string(),
            submitted: false,
        }
    );
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn fast_generation_is_returned_and_stored() {
    let h = harness(
        MemoryRoasts::default(),
        Profiles::new(true),
        Generator::immediate(),
        Duration::from_secs(5),
    );

    let outcome = h.service.handle(submit("torvalds", 7)).await;

    assert_eq!(
        outcome,
        RoastOutcome::Ready {
            profile: profile("torvalds"),
            roast: "torvalds commits like it's 2009".to_string(),
            submitted: true,
        }
    );
    let stored = h.roasts.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].fid, "7");
    assert_eq!(stored[0].cast_hash.as_deref(), Some("0xa48d"));
}

#[tokio::test]
async fn slow_generation_reports_processing_and_persists_later() {
    let gate = Arc::new(Notify::new());
    let h = harness(
        MemoryRoasts::default(),
        Profiles::new(true),
        Generator::gated(gate.clone()),
        Duration::from_millis(20),
    );

    let outcome = h.service.handle(submit("torvalds", 7)).await;

    assert_eq!(
        outcome,
        RoastOutcome::Processing {
            profile: profile("torvalds")
        }
    );
    assert!(h.roasts.stored().is_empty());
    assert_eq!(h.tasks.in_flight(), 1);

    gate.notify_one();
    h.tasks.drain().await;

    let stored = h.roasts.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].username, "torvalds");

    let poll = h.service.handle(RoastRequest::view("torvalds")).await;
    assert!(matches!(poll, RoastOutcome::Ready { submitted: false, .. }));
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn stored_roasts_are_served_even_when_the_global_quota_is_spent() {
    let roasts = MemoryRoasts::with_other_events(100);
    roasts.seed("torvalds", "3", "stored roast");
    let h = harness(
        roasts,
        Profiles::new(true),
        Generator::immediate(),
        Duration::from_secs(1),
    );

    let outcome = h.service.handle(submit("torvalds", 8)).await;

    assert_eq!(
        outcome,
        RoastOutcome::Ready {
            profile: profile("torvalds"),
            roast: "stored roast".to_string(),
            submitted: true,
        }
    );
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn polling_with_a_submission_returns_the_roast_that_used_the_last_slot() {
    let roasts = MemoryRoasts::default();
    for n in 0..9 {
        roasts.seed(&format!("user{n}"), "7", "old roast");
    }
    let gate = Arc::new(Notify::new());
    let h = harness(
        roasts,
        Profiles::new(true),
        Generator::gated(gate.clone()),
        Duration::from_millis(20),
    );

    assert_eq!(
        h.service.handle(submit("torvalds", 7)).await,
        RoastOutcome::Processing {
            profile: profile("torvalds")
        }
    );

    gate.notify_one();
    h.tasks.drain().await;

    let poll = h.service.handle(submit("torvalds", 7)).await;
    assert_eq!(
        poll,
        RoastOutcome::Ready {
            profile: profile("torvalds"),
            roast: "torvalds commits like it's 2009".to_string(),
            submitted: true,
        }
    );
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn polling_while_generating_does_not_start_another_generation() {
    let gate = Arc::new(Notify::new());
    let h = harness(
        MemoryRoasts::default(),
        Profiles::new(true),
        Generator::gated(gate.clone()),
        Duration::from_millis(20),
    );

    let first = h.service.handle(submit("torvalds", 7)).await;
    let poll = h.service.handle(submit("Torvalds", 7)).await;
    let view = h.service.handle(RoastRequest::view("torvalds")).await;

    assert!(matches!(first, RoastOutcome::Processing { .. }));
    assert!(matches!(poll, RoastOutcome::Processing { .. }));
    assert!(matches!(view, RoastOutcome::Processing { .. }));
    assert_eq!(h.generator.calls(), 1);

    gate.notify_one();
    h.tasks.drain().await;

    let stored = h.roasts.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored.iter().filter(|row| row.fid == "7").count(), 1);

    let after = h.service.handle(submit("torvalds", 7)).await;
    assert!(matches!(after, RoastOutcome::Ready { submitted: true, .. }));
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn quota_rejection_releases_the_subject() {
    let h = harness(
        MemoryRoasts::with_other_events(100),
        Profiles::new(true),
        Generator::immediate(),
        Duration::from_secs(1),
    );

    assert_eq!(
        h.service.handle(submit("torvalds", 7)).await,
        RoastOutcome::GlobalLimit
    );
    assert_eq!(
        h.service.handle(RoastRequest::view("torvalds")).await,
        RoastOutcome::NotFound {
            profile: profile("torvalds")
        }
    );
}
