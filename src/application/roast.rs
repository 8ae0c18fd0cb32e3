//! Roast orchestration: validation, lookup, quota and detached generation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use metrics::{counter, histogram};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::background::BackgroundTasks;
use super::quota::{QuotaDecision, QuotaTracker};
use super::repos::RoastsRepo;
use super::upstream::{ProfileDirectory, RoastGenerator, UpstreamError, degrade};
use crate::domain::entities::NewRoastRecord;
use crate::domain::profile::ProfileName;

const SOURCE: &str = "framecard::roast";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoastPolicy {
    /// Profile that is never roasted.
    pub reserved_profile: String,
    pub generation_timeout: Duration,
}

/// Caller details present only on button presses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub fid: u64,
    pub cast_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoastRequest {
    pub subject: String,
    pub submission: Option<Submission>,
}

impl RoastRequest {
    pub fn view(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            submission: None,
        }
    }

    pub fn submit(subject: impl Into<String>, submission: Submission) -> Self {
        Self {
            subject: subject.into(),
            submission: Some(submission),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoastOutcome {
    Author,
    InvalidProfile,
    GlobalLimit,
    IdentityLimit,
    /// Viewed without submitting and nothing stored yet.
    NotFound { profile: ProfileName },
    /// Generation outlived the timeout; the result will be stored when done.
    Processing { profile: ProfileName },
    Ready {
        profile: ProfileName,
        roast: String,
        submitted: bool,
    },
    Unavailable { profile: ProfileName },
}

impl RoastOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RoastOutcome::Author => "author",
            RoastOutcome::InvalidProfile => "invalid_profile",
            RoastOutcome::GlobalLimit => "global_limit",
            RoastOutcome::IdentityLimit => "identity_limit",
            RoastOutcome::NotFound { .. } => "not_found",
            RoastOutcome::Processing { .. } => "processing",
            RoastOutcome::Ready { .. } => "ready",
            RoastOutcome::Unavailable { .. } => "unavailable",
        }
    }
}

#[derive(Clone)]
pub struct RoastService {
    roasts: Arc<dyn RoastsRepo>,
    quota: QuotaTracker,
    profiles: Arc<dyn ProfileDirectory>,
    generator: Arc<dyn RoastGenerator>,
    tasks: BackgroundTasks,
    policy: RoastPolicy,
    in_flight: InFlightSubjects,
}

impl RoastService {
    pub fn new(
        roasts: Arc<dyn RoastsRepo>,
        quota: QuotaTracker,
        profiles: Arc<dyn ProfileDirectory>,
        generator: Arc<dyn RoastGenerator>,
        tasks: BackgroundTasks,
        policy: RoastPolicy,
    ) -> Self {
        Self {
            roasts,
            quota,
            profiles,
            generator,
            tasks,
            policy,
            in_flight: InFlightSubjects::default(),
        }
    }

    pub async fn handle(&self, request: RoastRequest) -> RoastOutcome {
        let outcome = self.resolve(request).await;
        counter!("framecard_roast_requests_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    async fn resolve(&self, request: RoastRequest) -> RoastOutcome {
        let Ok(profile) = ProfileName::parse(&request.subject) else {
            debug!(target = SOURCE, subject = %request.subject, "rejecting malformed profile");
            return RoastOutcome::InvalidProfile;
        };

        if profile.eq_ignore_case(&self.policy.reserved_profile) {
            return RoastOutcome::Author;
        }

        if !degrade(self.profiles.profile_exists(&profile).await, false) {
            return RoastOutcome::InvalidProfile;
        }

        let stored = match self.roasts.find_roast(profile.as_str()).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(target = SOURCE, %profile, error = %err, "roast lookup failed");
                return RoastOutcome::Unavailable { profile };
            }
        };

        if let Some(record) = stored {
            return RoastOutcome::Ready {
                profile,
                roast: record.roast,
                submitted: request.submission.is_some(),
            };
        }

        let Some(submission) = request.submission else {
            if self.in_flight.contains(&profile) {
                return RoastOutcome::Processing { profile };
            }
            return RoastOutcome::NotFound { profile };
        };

        // Polls for a subject that is still generating never reach the quota.
        let Some(claim) = self.in_flight.claim(&profile) else {
            debug!(target = SOURCE, %profile, "generation already running");
            return RoastOutcome::Processing { profile };
        };

        match self.quota.check(&submission.fid.to_string()).await {
            Ok(QuotaDecision::Allowed) => self.generate(profile, submission, claim).await,
            Ok(QuotaDecision::GlobalLimitExceeded) => RoastOutcome::GlobalLimit,
            Ok(QuotaDecision::IdentityLimitExceeded) => RoastOutcome::IdentityLimit,
            Err(err) => {
                warn!(target = SOURCE, error = %err, "quota check failed");
                RoastOutcome::Unavailable { profile }
            }
        }
    }

    /// Race the detached generation against the timeout. Losing the race does
    /// not cancel the task; it still stores the roast when it completes.
    async fn generate(
        &self,
        profile: ProfileName,
        submission: Submission,
        claim: InFlightClaim,
    ) -> RoastOutcome {
        let started = Instant::now();
        let generator = self.generator.clone();
        let roasts = self.roasts.clone();
        let task_profile = profile.clone();

        let handle = self.tasks.spawn("roast-generation", async move {
            let _claim = claim;
            let roast = generator.generate(&task_profile).await?;
            if roast.trim().is_empty() {
                return Err(UpstreamError::decode("roast generator", "empty roast"));
            }
            histogram!("framecard_roast_generation_seconds")
                .record(started.elapsed().as_secs_f64());

            let record = NewRoastRecord {
                username: task_profile.to_string(),
                fid: submission.fid.to_string(),
                cast_hash: submission.cast_hash,
                roast: roast.clone(),
            };
            match roasts.insert_roast(record).await {
                Ok(_) => info!(target = SOURCE, profile = %task_profile, "roast stored"),
                Err(err) => {
                    warn!(target = SOURCE, profile = %task_profile, error = %err, "failed to store roast")
                }
            }
            Ok::<_, UpstreamError>(roast)
        });

        match tokio::time::timeout(self.policy.generation_timeout, handle).await {
            Ok(Ok(Some(roast))) => RoastOutcome::Ready {
                profile,
                roast,
                submitted: true,
            },
            Ok(Ok(None)) => RoastOutcome::Unavailable { profile },
            Ok(Err(join)) => {
                warn!(target = SOURCE, %profile, error = %join, "roast generation task aborted");
                RoastOutcome::Unavailable { profile }
            }
            Err(_) => {
                debug!(target = SOURCE, %profile, "roast still generating");
                RoastOutcome::Processing { profile }
            }
        }
    }
}

/// Subjects with a generation task still running, keyed case-insensitively.
#[derive(Clone, Default)]
struct InFlightSubjects {
    subjects: Arc<Mutex<HashSet<String>>>,
}

impl InFlightSubjects {
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.subjects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn contains(&self, profile: &ProfileName) -> bool {
        self.lock().contains(&profile.as_str().to_ascii_lowercase())
    }

    /// `None` when a generation for `profile` is already running.
    fn claim(&self, profile: &ProfileName) -> Option<InFlightClaim> {
        let key = profile.as_str().to_ascii_lowercase();
        if !self.lock().insert(key.clone()) {
            return None;
        }
        Some(InFlightClaim {
            subjects: self.clone(),
            key,
        })
    }
}

/// Releases the subject when dropped, whether the task stored a roast or not.
struct InFlightClaim {
    subjects: InFlightSubjects,
    key: String,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.subjects.lock().remove(&self.key);
    }
}
