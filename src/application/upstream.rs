//! Ports for the third-party services the frames depend on.
//!
//! Adapters report failures as [`UpstreamError`]; the services decide how a
//! failure degrades (usually to a negative answer) through [`degrade`].

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tracing::warn;

use crate::domain::channels::Channel;
use crate::domain::profile::ProfileName;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to {service} failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },
    #[error("{service} responded with status {status}")]
    Status { service: &'static str, status: u16 },
    #[error("{service} returned an unexpected payload: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl UpstreamError {
    pub fn transport(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            service,
            message: err.to_string(),
        }
    }

    pub fn decode(service: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            service,
            message: message.into(),
        }
    }

    pub fn service(&self) -> &'static str {
        match self {
            UpstreamError::Transport { service, .. }
            | UpstreamError::Status { service, .. }
            | UpstreamError::Decode { service, .. } => service,
        }
    }
}

/// Collapse an upstream failure into `fallback`, logging it on the way.
pub fn degrade<T>(result: Result<T, UpstreamError>, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            let service = err.service();
            warn!(
                target = "framecard::upstream",
                service,
                error = %err,
                "upstream call failed; using fallback"
            );
            counter!("framecard_upstream_failures_total", "service" => service).increment(1);
            fallback
        }
    }
}

/// Reputation score for a wallet address.
#[async_trait]
pub trait ReputationLookup: Send + Sync {
    async fn score(&self, address: &str) -> Result<Option<f64>, UpstreamError>;
}

/// Account registry of the reputation service.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn account_exists(&self, address: &str) -> Result<bool, UpstreamError>;

    async fn is_eligible(&self, address: &str) -> Result<bool, UpstreamError>;
}

/// Maps a social account id to its first verified wallet address.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn verified_address(&self, fid: u64) -> Result<Option<String>, UpstreamError>;
}

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn profile_exists(&self, profile: &ProfileName) -> Result<bool, UpstreamError>;
}

#[async_trait]
pub trait RoastGenerator: Send + Sync {
    async fn generate(&self, profile: &ProfileName) -> Result<String, UpstreamError>;
}

/// Opaque check of a signed frame message.
#[async_trait]
pub trait MessageVerifier: Send + Sync {
    async fn verify(&self, message_bytes: &str) -> Result<bool, UpstreamError>;
}

#[async_trait]
pub trait ChannelSource: Send + Sync {
    async fn fetch_channels(&self) -> Result<Vec<Channel>, UpstreamError>;
}
