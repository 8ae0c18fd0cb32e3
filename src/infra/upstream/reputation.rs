use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::form_urlencoded;

use crate::application::upstream::{AccountDirectory, ReputationLookup, UpstreamError};

use super::{join_url, read_json};

const SERVICE: &str = "reputation";

/// Client for the Yup API: scores, accounts and sign-up eligibility.
#[derive(Clone)]
pub struct ReputationApi {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    #[serde(default)]
    yup_score: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct EligibilityResponse {
    #[serde(default)]
    eligible: bool,
}

impl ReputationApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ReputationLookup for ReputationApi {
    async fn score(&self, address: &str) -> Result<Option<f64>, UpstreamError> {
        let url = join_url(&self.base_url, &format!("web3-profiles/{address}"));
        let profile: ProfileResponse = read_json(SERVICE, self.client.get(url).send().await).await?;

        // The score arrives as a number or a numeric string depending on the profile.
        Ok(profile.yup_score.and_then(|score| match score {
            serde_json::Value::Number(number) => number.as_f64(),
            serde_json::Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }))
    }
}

#[async_trait]
impl AccountDirectory for ReputationApi {
    async fn account_exists(&self, address: &str) -> Result<bool, UpstreamError> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("address", address)
            .finish();
        let url = join_url(&self.base_url, &format!("accounts/eth?{query}"));
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| UpstreamError::transport(SERVICE, err))?;
        Ok(response.status() == StatusCode::OK)
    }

    async fn is_eligible(&self, address: &str) -> Result<bool, UpstreamError> {
        let url = join_url(&self.base_url, &format!("accounts/sign-up/eligible/{address}"));
        let body: EligibilityResponse = read_json(SERVICE, self.client.get(url).send().await).await?;
        Ok(body.eligible)
    }
}
