// YouTube Data API v3 response shapes, restricted to the parts we read.
// Every field defaults so that partial responses still decode, and an
// explicit `null` reads the same as a missing key.

use serde::{Deserialize, Deserializer};

/// `items` wrapper shared by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_default")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Thumbnail {
    #[serde(deserialize_with = "null_default")]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Thumbnails {
    pub medium: Option<Thumbnail>,
}

impl Thumbnails {
    /// URL of the medium rendition, empty when absent.
    pub fn medium_url(&self) -> String {
        self.medium
            .as_ref()
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceId {
    #[serde(deserialize_with = "null_default")]
    pub video_id: String,
    #[serde(deserialize_with = "null_default")]
    pub channel_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(deserialize_with = "null_default")]
    pub id: ResourceId,
    #[serde(deserialize_with = "null_default")]
    pub snippet: SearchSnippet,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchSnippet {
    #[serde(deserialize_with = "null_default")]
    pub published_at: String,
    #[serde(deserialize_with = "null_default")]
    pub channel_id: String,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
    #[serde(deserialize_with = "null_default")]
    pub thumbnails: Thumbnails,
    #[serde(deserialize_with = "null_default")]
    pub channel_title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Channel {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub snippet: ChannelSnippet,
    #[serde(deserialize_with = "null_default")]
    pub statistics: ChannelStatistics,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelSnippet {
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
    #[serde(deserialize_with = "null_default")]
    pub custom_url: String,
    #[serde(deserialize_with = "null_default")]
    pub published_at: String,
    #[serde(deserialize_with = "null_default")]
    pub thumbnails: Thumbnails,
    #[serde(deserialize_with = "null_default")]
    pub country: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(deserialize_with = "count")]
    pub view_count: u64,
    #[serde(deserialize_with = "count")]
    pub subscriber_count: u64,
    #[serde(deserialize_with = "count")]
    pub video_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Video {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub snippet: VideoSnippet,
    #[serde(deserialize_with = "null_default")]
    pub statistics: VideoStatistics,
    #[serde(deserialize_with = "null_default")]
    pub content_details: VideoContentDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(deserialize_with = "null_default")]
    pub published_at: String,
    #[serde(deserialize_with = "null_default")]
    pub channel_id: String,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
    #[serde(deserialize_with = "null_default")]
    pub thumbnails: Thumbnails,
    #[serde(deserialize_with = "null_default")]
    pub channel_title: String,
    #[serde(deserialize_with = "null_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub category_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(deserialize_with = "count")]
    pub view_count: u64,
    #[serde(deserialize_with = "count")]
    pub like_count: u64,
    #[serde(deserialize_with = "count")]
    pub comment_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoContentDetails {
    /// ISO 8601 duration, e.g. `PT4M13S`.
    #[serde(deserialize_with = "null_default")]
    pub duration: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaylistItem {
    #[serde(deserialize_with = "null_default")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub snippet: PlaylistItemSnippet,
    #[serde(deserialize_with = "null_default")]
    pub content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    #[serde(deserialize_with = "null_default")]
    pub published_at: String,
    #[serde(deserialize_with = "null_default")]
    pub channel_id: String,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
    #[serde(deserialize_with = "null_default")]
    pub thumbnails: Thumbnails,
    #[serde(deserialize_with = "null_default")]
    pub channel_title: String,
    #[serde(deserialize_with = "null_default")]
    pub position: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    #[serde(deserialize_with = "null_default")]
    pub video_id: String,
}

/// Google error envelope: `{"error": {"code": 403, "message": "...", "errors": [...]}}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    pub code: u16,
    pub message: String,
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiErrorDetail {
    pub reason: String,
    pub message: String,
}

impl ApiErrorBody {
    /// Message plus the first machine-readable reason, if any.
    pub fn summary(&self) -> String {
        match self.errors.first().map(|e| e.reason.as_str()) {
            Some(reason) if !reason.is_empty() => format!("{} ({})", self.message, reason),
            _ => self.message.clone(),
        }
    }
}

/// Treat `null` like a missing key.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Statistics arrive as decimal strings; accept numbers and null as well.
/// Unparseable values fall back to zero.
fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Count>::deserialize(deserializer)? {
        Some(Count::Number(n)) => n,
        Some(Count::Text(s)) => s.trim().parse().unwrap_or_default(),
        None => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_from_strings_and_numbers() {
        let stats: VideoStatistics = serde_json::from_value(serde_json::json!({
            "viewCount": "1500",
            "likeCount": 42,
            "commentCount": null
        }))
        .unwrap();

        assert_eq!(stats.view_count, 1500);
        assert_eq!(stats.like_count, 42);
        assert_eq!(stats.comment_count, 0);
    }

    #[test]
    fn test_partial_video_decodes() {
        let video: Video = serde_json::from_value(serde_json::json!({
            "id": "dQw4w9WgXcQ",
            "snippet": {"title": "Only a title"}
        }))
        .unwrap();

        assert_eq!(video.id, "dQw4w9WgXcQ");
        assert_eq!(video.snippet.title, "Only a title");
        assert!(video.snippet.tags.is_empty());
        assert_eq!(video.snippet.thumbnails.medium_url(), "");
        assert_eq!(video.content_details.duration, "");
    }

    #[test]
    fn test_nulls_decode_as_defaults() {
        let video: Video = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "snippet": {"title": "t", "tags": null, "description": null, "thumbnails": null},
            "contentDetails": null
        }))
        .unwrap();

        assert_eq!(video.snippet.title, "t");
        assert!(video.snippet.tags.is_empty());
        assert_eq!(video.snippet.description, "");
        assert_eq!(video.content_details.duration, "");

        let item: PlaylistItem = serde_json::from_value(serde_json::json!({
            "snippet": {"title": "first", "position": null},
            "contentDetails": {"videoId": null}
        }))
        .unwrap();

        assert_eq!(item.snippet.position, 0);
        assert_eq!(item.content_details.video_id, "");
    }

    #[test]
    fn test_list_without_items() {
        let list: ListResponse<PlaylistItem> =
            serde_json::from_value(serde_json::json!({"kind": "youtube#playlistItemListResponse"}))
                .unwrap();
        assert!(list.items.is_empty());
    }

    #[test]
    fn test_error_summary() {
        let err: ApiErrorResponse = serde_json::from_value(serde_json::json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota.",
                "errors": [{"reason": "quotaExceeded", "domain": "youtube.quota"}]
            }
        }))
        .unwrap();

        assert_eq!(err.error.code, 403);
        assert!(err.error.summary().ends_with("(quotaExceeded)"));
    }
}
