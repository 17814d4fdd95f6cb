// Upstream gateway: typed facade over the five YouTube Data API reads

pub mod types;

pub use types::{Channel, PlaylistItem, SearchResult, Video};

use crate::auth::{AuthMode, Credentials};
use crate::error::{YouTubeError, YouTubeResult};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use types::{ApiErrorResponse, ListResponse};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// Shared HTTP client for the gateway and the token endpoint. No request
/// timeout is set; calls block until the platform answers or the
/// connection fails.
pub fn http_client(user_agent: &str) -> YouTubeResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .map_err(|e| YouTubeError::Config(format!("failed to create HTTP client: {}", e)))
}

const OP_SEARCH_VIDEOS: &str = "searching videos";
const OP_CHANNEL_INFO: &str = "getting channel info";
const OP_VIDEO_DETAILS: &str = "getting video details";
const OP_PLAYLIST_ITEMS: &str = "getting playlist items";
const OP_SEARCH_CHANNELS: &str = "searching channels";

/// Read operations against the video platform.
///
/// Implementations hold no per-call state and are safe to call concurrently.
#[async_trait::async_trait]
pub trait YouTubeApi: Send + Sync {
    /// Relevance-ordered video search, optionally within one channel.
    async fn search_videos(
        &self,
        query: &str,
        max_results: u32,
        channel_id: Option<&str>,
    ) -> YouTubeResult<Vec<SearchResult>>;

    /// Look up a channel by id, or the authorized user's own channel when
    /// `channel_id` is `None`.
    async fn get_channel_info(&self, channel_id: Option<&str>) -> YouTubeResult<Channel>;

    async fn get_video_details(&self, video_id: &str) -> YouTubeResult<Video>;

    /// Items of a playlist. An unknown playlist yields an empty list.
    async fn get_playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
    ) -> YouTubeResult<Vec<PlaylistItem>>;

    /// Relevance-ordered channel search.
    async fn search_channels(&self, query: &str, max_results: u32) -> YouTubeResult<Vec<SearchResult>>;
}

/// HTTP implementation of [`YouTubeApi`] owning the process's credentials.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<Credentials>,
}

impl YouTubeClient {
    pub fn new(http: reqwest::Client, credentials: Credentials) -> YouTubeResult<Self> {
        Self::with_base_url(http, credentials, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        http: reqwest::Client,
        credentials: Credentials,
        base_url: &str,
    ) -> YouTubeResult<Self> {
        // `Url::join` drops the last segment unless the base ends with '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| YouTubeError::Config(format!("invalid API base URL {}: {}", base_url, e)))?;

        Ok(Self {
            http,
            base_url,
            credentials: Arc::new(credentials),
        })
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.credentials.mode()
    }

    async fn list<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        resource: &str,
        query: &[(&str, String)],
    ) -> YouTubeResult<Vec<T>> {
        let url = self
            .base_url
            .join(resource)
            .map_err(|e| YouTubeError::upstream(operation, format!("invalid resource URL: {}", e)))?;

        tracing::debug!(operation, url = %url, "YouTube API request");

        let request = self.http.get(url).query(query);
        let request = self.credentials.authorize(operation, request).await?;

        let response = request
            .send()
            .await
            .map_err(|e| YouTubeError::upstream(operation, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| YouTubeError::upstream(operation, format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .map(|e| e.error.summary())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

            tracing::warn!(operation, status = status.as_u16(), %message, "YouTube API request failed");

            return Err(YouTubeError::Upstream {
                operation,
                status: Some(status.as_u16()),
                message,
            });
        }

        let list: ListResponse<T> = serde_json::from_str(&body)
            .map_err(|e| YouTubeError::upstream(operation, format!("failed to decode response: {}", e)))?;

        Ok(list.items)
    }
}

#[async_trait::async_trait]
impl YouTubeApi for YouTubeClient {
    async fn search_videos(
        &self,
        query: &str,
        max_results: u32,
        channel_id: Option<&str>,
    ) -> YouTubeResult<Vec<SearchResult>> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("q", query.to_string()),
            ("type", "video".to_string()),
            ("maxResults", max_results.to_string()),
            ("order", "relevance".to_string()),
        ];
        if let Some(channel_id) = channel_id {
            params.push(("channelId", channel_id.to_string()));
        }

        self.list(OP_SEARCH_VIDEOS, "search", &params).await
    }

    async fn get_channel_info(&self, channel_id: Option<&str>) -> YouTubeResult<Channel> {
        let mut params = vec![("part", "snippet,statistics,contentDetails".to_string())];
        match channel_id {
            Some(id) => params.push(("id", id.to_string())),
            None => {
                // "mine" needs a user identity; an API key has none
                if self.credentials.mode() == AuthMode::ApiKey {
                    return Err(YouTubeError::Upstream {
                        operation: OP_CHANNEL_INFO,
                        status: None,
                        message: "the caller's own channel requires OAuth2 authorization; \
                                  pass channel_id when using an API key"
                            .to_string(),
                    });
                }
                params.push(("mine", "true".to_string()));
            }
        }

        let channels: Vec<Channel> = self.list(OP_CHANNEL_INFO, "channels", &params).await?;
        channels.into_iter().next().ok_or_else(|| YouTubeError::NotFound {
            kind: "channel",
            id: channel_id.unwrap_or("mine").to_string(),
        })
    }

    async fn get_video_details(&self, video_id: &str) -> YouTubeResult<Video> {
        let params = [
            ("part", "snippet,statistics,contentDetails".to_string()),
            ("id", video_id.to_string()),
        ];

        let videos: Vec<Video> = self.list(OP_VIDEO_DETAILS, "videos", &params).await?;
        videos.into_iter().next().ok_or_else(|| YouTubeError::NotFound {
            kind: "video",
            id: video_id.to_string(),
        })
    }

    async fn get_playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
    ) -> YouTubeResult<Vec<PlaylistItem>> {
        let params = [
            ("part", "snippet,contentDetails".to_string()),
            ("playlistId", playlist_id.to_string()),
            ("maxResults", max_results.to_string()),
        ];

        self.list(OP_PLAYLIST_ITEMS, "playlistItems", &params).await
    }

    async fn search_channels(&self, query: &str, max_results: u32) -> YouTubeResult<Vec<SearchResult>> {
        let params = [
            ("part", "snippet".to_string()),
            ("q", query.to_string()),
            ("type", "channel".to_string()),
            ("maxResults", max_results.to_string()),
            ("order", "relevance".to_string()),
        ];

        self.list(OP_SEARCH_CHANNELS, "search", &params).await
    }
}
