use async_trait::async_trait;
use reqwest::Client;

use crate::application::upstream::{ChannelSource, UpstreamError};
use crate::domain::channels::{Channel, ChannelDirectory};

use super::read_json;

const SERVICE: &str = "channel directory";

#[derive(Clone)]
pub struct ChannelDirectoryClient {
    client: Client,
    url: String,
}

impl ChannelDirectoryClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ChannelSource for ChannelDirectoryClient {
    async fn fetch_channels(&self) -> Result<Vec<Channel>, UpstreamError> {
        let directory: ChannelDirectory =
            read_json(SERVICE, self.client.get(&self.url).send().await).await?;
        Ok(directory.result.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn unwraps_the_channel_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "channels": [{
                    "id": "rust",
                    "name": "Rust",
                    "url": "chain://eip155:1/erc721:0x0",
                    "leadFid": 3,
                    "moderatorFids": [3],
                    "createdAt": 1712000000,
                    "followerCount": 1200,
                    "memberCount": 30
                }] }
            })))
            .mount(&server)
            .await;

        let channels = ChannelDirectoryClient::new(Client::new(), server.uri())
            .fetch_channels()
            .await
            .unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].follower_count, 1200);
        assert_eq!(channels[0].moderator_fids, vec![3]);
    }
}
