//! HTTP adapters for the upstream ports.

mod github;
mod hub;
mod reputation;
mod warpcast;

pub use github::{GithubProfiles, RoastApi};
pub use hub::HubClient;
pub use reputation::ReputationApi;
pub use warpcast::ChannelDirectoryClient;

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::application::upstream::UpstreamError;
use crate::infra::error::InfraError;

const USER_AGENT: &str = concat!("framecard/", env!("CARGO_PKG_VERSION"));

/// Shared client for every adapter.
pub fn build_client(timeout: Duration) -> Result<Client, InfraError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(InfraError::http_client)
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Decode a successful JSON response, mapping everything else to an error.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: Result<Response, reqwest::Error>,
) -> Result<T, UpstreamError> {
    let response = response.map_err(|err| UpstreamError::transport(service, err))?;
    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Status {
            service,
            status: status.as_u16(),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|err| UpstreamError::decode(service, err.to_string()))
}
