use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use serde::Deserialize;

use crate::application::upstream::{IdentityResolver, MessageVerifier, UpstreamError};

use super::{join_url, read_json};

const SERVICE: &str = "hub";

/// Farcaster hub HTTP API.
#[derive(Clone)]
pub struct HubClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct VerificationsResponse {
    #[serde(default)]
    messages: Vec<VerificationMessage>,
}

#[derive(Deserialize)]
struct VerificationMessage {
    data: Option<VerificationData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerificationData {
    #[serde(alias = "verificationAddAddressBody")]
    verification_add_eth_address_body: Option<VerificationBody>,
}

#[derive(Deserialize)]
struct VerificationBody {
    address: String,
}

#[derive(Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    valid: bool,
}

impl HubClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl IdentityResolver for HubClient {
    async fn verified_address(&self, fid: u64) -> Result<Option<String>, UpstreamError> {
        let url = join_url(&self.base_url, &format!("v1/verificationsByFid?fid={fid}"));
        let body: VerificationsResponse = read_json(SERVICE, self.client.get(url).send().await).await?;

        Ok(body
            .messages
            .into_iter()
            .next()
            .and_then(|message| message.data)
            .and_then(|data| data.verification_add_eth_address_body)
            .map(|body| body.address)
            .filter(|address| !address.is_empty()))
    }
}

#[async_trait]
impl MessageVerifier for HubClient {
    async fn verify(&self, message_bytes: &str) -> Result<bool, UpstreamError> {
        let bytes = hex::decode(message_bytes.trim_start_matches("0x"))
            .map_err(|err| UpstreamError::decode(SERVICE, format!("message bytes: {err}")))?;
        let url = join_url(&self.base_url, "v1/validateMessage");
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await;
        let body: ValidateResponse = read_json(SERVICE, response).await?;
        Ok(body.valid)
    }
}
