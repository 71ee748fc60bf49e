//! Convoke game-room client.

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::convoke::{CreateGameRequest, CreateGameResponse};

/// Typed HTTP client for the Convoke `create-game` endpoint.
///
/// The API key travels in the request body rather than a header.
#[derive(Debug, Clone)]
pub struct ConvokeClient {
    http: Client,
    api_url: Url,
    api_key: String,
}

impl ConvokeClient {
    /// * `api_url` – full URL of the create-game endpoint.
    /// * `api_key` – the Convoke API key.
    pub fn new(api_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_url,
            api_key: api_key.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Create a private game room.
    pub async fn create_game(
        &self,
        name: impl Into<String>,
        seat_limit: u32,
        format: impl Into<String>,
    ) -> Result<CreateGameResponse, ClientError> {
        let body = CreateGameRequest {
            api_key: self.api_key.clone(),
            name: name.into(),
            is_public: false,
            seat_limit,
            format: format.into(),
        };
        let resp = self
            .http
            .post(self.api_url.clone())
            .json(&body)
            .send()
            .await?;
        parse_response(resp).await
    }
}
