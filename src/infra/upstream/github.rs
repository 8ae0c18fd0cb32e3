use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::application::upstream::{ProfileDirectory, RoastGenerator, UpstreamError};
use crate::domain::profile::ProfileName;

use super::read_json;

const PROFILE_SERVICE: &str = "profile proxy";
const ROAST_SERVICE: &str = "roast generator";

/// Username lookups through the GitHub profile proxy.
#[derive(Clone)]
pub struct GithubProfiles {
    client: Client,
    url: String,
}

#[derive(Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    id: Option<serde_json::Value>,
}

impl GithubProfiles {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ProfileDirectory for GithubProfiles {
    async fn profile_exists(&self, profile: &ProfileName) -> Result<bool, UpstreamError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "username": profile.as_str() }))
            .send()
            .await;
        let body: ProfileResponse = read_json(PROFILE_SERVICE, response).await?;
        Ok(matches!(body.id, Some(ref id) if !id.is_null()))
    }
}

#[derive(Clone)]
pub struct RoastApi {
    client: Client,
    url: String,
}

#[derive(Deserialize)]
struct RoastResponse {
    roast: Option<String>,
}

impl RoastApi {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RoastGenerator for RoastApi {
    async fn generate(&self, profile: &ProfileName) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "username": profile.as_str(), "language": "english" }))
            .send()
            .await;
        let body: RoastResponse = read_json(ROAST_SERVICE, response).await?;
        body.roast
            .ok_or_else(|| UpstreamError::decode(ROAST_SERVICE, "response has no roast"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn profile(name: &str) -> ProfileName {
        ProfileName::parse(name).unwrap()
    }

    #[tokio::test]
    async fn profile_exists_when_an_id_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "username": "torvalds" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1024025 })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "username": "ghost-user" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Not Found" })))
            .mount(&server)
            .await;

        let profiles = GithubProfiles::new(Client::new(), server.uri());
        assert!(profiles.profile_exists(&profile("torvalds")).await.unwrap());
        assert!(!profiles.profile_exists(&profile("ghost-user")).await.unwrap());
    }

    #[tokio::test]
    async fn roast_text_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "username": "torvalds", "language": "english" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "roast": "Ah, Linus." })))
            .mount(&server)
            .await;

        let api = RoastApi::new(Client::new(), server.uri());
        assert_eq!(api.generate(&profile("torvalds")).await.unwrap(), "Ah, Linus.");
    }

    #[tokio::test]
    async fn roast_without_text_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "busy" })))
            .mount(&server)
            .await;

        let api = RoastApi::new(Client::new(), server.uri());
        assert!(matches!(
            api.generate(&profile("torvalds")).await,
            Err(UpstreamError::Decode { .. })
        ));
    }
}
