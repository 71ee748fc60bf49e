//! Discourse API client.
//!
//! Every request is authenticated with the `Api-Key` / `Api-Username`
//! header pair, acting as the bot account.

use reqwest::Client;
use url::Url;

use super::{ClientError, expect_success, parse_response};
use crate::objects::discourse::{
    CreatePostRequest, CreatePostResponse, PollVotersResponse, Post, TimingsRequest,
    TopicListItem, TopicListResponse, TopicPostsResponse, TopicView,
};

const API_KEY_HEADER: &str = "Api-Key";
const API_USERNAME_HEADER: &str = "Api-Username";

/// Typed HTTP client for the subset of the Discourse API the matchmaker uses.
#[derive(Debug, Clone)]
pub struct DiscourseClient {
    http: Client,
    base_url: Url,
    api_key: String,
    username: String,
}

impl DiscourseClient {
    /// Create a new `DiscourseClient`.
    ///
    /// * `base_url` – root URL of the forum (e.g. `https://forum.example.com`).
    /// * `api_key` – an API key allowed to act as `username`.
    /// * `username` – the bot account.
    pub fn new(base_url: Url, api_key: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            api_key: api_key.into(),
            username: username.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// The account this client acts as.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Public URL of a topic.
    pub fn topic_url(&self, topic_id: u64) -> String {
        format!(
            "{}/t/{}",
            self.base_url.as_str().trim_end_matches('/'),
            topic_id
        )
    }

    /// `GET /topics/private-messages/{user}.json` – the bot's PM inbox.
    pub async fn private_messages(&self) -> Result<Vec<TopicListItem>, ClientError> {
        let path = format!(
            "/topics/private-messages/{}.json",
            urlencoding::encode(&self.username)
        );
        let list: TopicListResponse = self.get_json(&path, &[]).await?;
        Ok(list.topic_list.topics)
    }

    /// `GET /c/{category}.json` – topics listed in a category.
    pub async fn category_topics(&self, category: u64) -> Result<Vec<TopicListItem>, ClientError> {
        let list: TopicListResponse = self.get_json(&format!("/c/{category}.json"), &[]).await?;
        Ok(list.topic_list.topics)
    }

    /// `GET /t/{id}.json?include_raw=true` – a topic with its first chunk
    /// of posts and the ids of all the others.
    pub async fn topic(&self, topic_id: u64) -> Result<TopicView, ClientError> {
        self.get_json(&format!("/t/{topic_id}.json"), &[("include_raw", "true")])
            .await
    }

    /// `GET /t/{id}/posts.json?post_ids[]=…` – specific posts of a topic.
    pub async fn topic_posts(
        &self,
        topic_id: u64,
        post_ids: &[u64],
    ) -> Result<Vec<Post>, ClientError> {
        let ids: Vec<String> = post_ids.iter().map(u64::to_string).collect();
        let query: Vec<(&str, &str)> = std::iter::once(("include_raw", "true"))
            .chain(ids.iter().map(|id| ("post_ids[]", id.as_str())))
            .collect();
        let response: TopicPostsResponse = self
            .get_json(&format!("/t/{topic_id}/posts.json"), &query)
            .await?;
        Ok(response.post_stream.posts)
    }

    /// `GET /polls/voters.json` – voters of a regular poll, grouped by option.
    pub async fn poll_voters(
        &self,
        post_id: u64,
        poll_name: &str,
    ) -> Result<PollVotersResponse, ClientError> {
        let post_id = post_id.to_string();
        self.get_json(
            "/polls/voters.json",
            &[("post_id", post_id.as_str()), ("poll_name", poll_name)],
        )
        .await
    }

    /// `POST /posts.json` – reply, new topic or new private message.
    pub async fn create_post(
        &self,
        request: &CreatePostRequest,
    ) -> Result<CreatePostResponse, ClientError> {
        let url = self.base_url.join("/posts.json")?;
        let resp = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_USERNAME_HEADER, &self.username)
            .json(request)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `DELETE /t/{id}.json` – delete a topic.
    pub async fn delete_topic(&self, topic_id: u64) -> Result<(), ClientError> {
        let url = self.base_url.join(&format!("/t/{topic_id}.json"))?;
        let resp = self
            .http
            .delete(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_USERNAME_HEADER, &self.username)
            .send()
            .await?;
        expect_success(resp).await
    }

    /// `POST /topics/timings` – record read timings so unread counters drop.
    pub async fn mark_read(&self, request: &TimingsRequest) -> Result<(), ClientError> {
        let url = self.base_url.join("/topics/timings")?;
        let resp = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_USERNAME_HEADER, &self.username)
            .json(request)
            .send()
            .await?;
        expect_success(resp).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let url = self.base_url.join(path)?;
        let resp = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_USERNAME_HEADER, &self.username)
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_url_ignores_trailing_slash() {
        let client = DiscourseClient::new(
            Url::parse("https://forum.example.com/").unwrap(),
            "key",
            "Matchmaker",
        );
        assert_eq!(client.topic_url(42), "https://forum.example.com/t/42");
    }
}
