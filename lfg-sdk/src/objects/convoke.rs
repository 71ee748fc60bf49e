//! Convoke game-room wire objects.

use serde::{Deserialize, Serialize};

/// Request body of the Convoke `create-game` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub api_key: String,
    pub name: String,
    pub is_public: bool,
    pub seat_limit: u32,
    pub format: String,
}

/// Response body of the Convoke `create-game` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateGameResponse {
    #[serde(default)]
    pub data: Option<CreateGameData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateGameData {
    #[serde(default)]
    pub url: Option<String>,
}

impl CreateGameResponse {
    /// The joinable room URL, if the platform returned one.
    pub fn join_url(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.url.as_deref())
            .filter(|u| !u.is_empty())
    }
}
