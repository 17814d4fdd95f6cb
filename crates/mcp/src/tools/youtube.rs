// YouTube tools: argument validation, default filling, gateway call and
// projection for each of the five read-only tools.

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{json_schema_integer, json_schema_object, json_schema_string, Tool, ToolRegistry};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use youtube_mcp_core::projection::{
    project_all, ChannelInfo, ChannelSummary, PlaylistEntry, VideoDetails, VideoSummary,
};
use youtube_mcp_core::{YouTubeApi, YouTubeError, YouTubeResult};

/// Used when `max_results` is absent or zero.
pub const DEFAULT_MAX_RESULTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    SearchVideos,
    GetChannelInfo,
    GetVideoDetails,
    GetPlaylistItems,
    SearchChannels,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::SearchVideos,
        ToolKind::GetChannelInfo,
        ToolKind::GetVideoDetails,
        ToolKind::GetPlaylistItems,
        ToolKind::SearchChannels,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::SearchVideos => "search_videos",
            Self::GetChannelInfo => "get_channel_info",
            Self::GetVideoDetails => "get_video_details",
            Self::GetPlaylistItems => "get_playlist_items",
            Self::SearchChannels => "search_channels",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::SearchVideos => {
                "Search for YouTube videos based on a query. Accepts query string, optional \
                 max_results (default 10), and optional channel_id to limit search to a specific channel."
            }
            Self::GetChannelInfo => {
                "Get information about a YouTube channel. Omit channel_id to get the authenticated \
                 user's own channel (requires OAuth2)."
            }
            Self::GetVideoDetails => "Get detailed information about a YouTube video",
            Self::GetPlaylistItems => "Get items from a YouTube playlist",
            Self::SearchChannels => "Search for YouTube channels based on a query",
        }
    }

    pub fn input_schema(self) -> serde_json::Value {
        let max_results = json_schema_integer("Maximum number of results to return (default: 10)", 0);

        match self {
            Self::SearchVideos => json_schema_object(
                serde_json::json!({
                    "query": json_schema_string("Search query for videos"),
                    "max_results": max_results,
                    "channel_id": json_schema_string("Optional channel ID to search within")
                }),
                vec!["query"],
            ),
            Self::GetChannelInfo => json_schema_object(
                serde_json::json!({
                    "channel_id": json_schema_string(
                        "Channel ID to get info for (if empty, uses authenticated user's channel)"
                    )
                }),
                vec![],
            ),
            Self::GetVideoDetails => json_schema_object(
                serde_json::json!({
                    "video_id": json_schema_string("YouTube video ID")
                }),
                vec!["video_id"],
            ),
            Self::GetPlaylistItems => json_schema_object(
                serde_json::json!({
                    "playlist_id": json_schema_string("YouTube playlist ID"),
                    "max_results": max_results
                }),
                vec!["playlist_id"],
            ),
            Self::SearchChannels => json_schema_object(
                serde_json::json!({
                    "query": json_schema_string("Search query for channels"),
                    "max_results": max_results
                }),
                vec!["query"],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchVideosArgs {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<u32>,
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct GetChannelInfoArgs {
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetVideoDetailsArgs {
    pub video_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetPlaylistItemsArgs {
    pub playlist_id: String,
    #[serde(default)]
    pub max_results: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchChannelsArgs {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<u32>,
}

/// A validated tool call, one variant per tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    SearchVideos(SearchVideosArgs),
    GetChannelInfo(GetChannelInfoArgs),
    GetVideoDetails(GetVideoDetailsArgs),
    GetPlaylistItems(GetPlaylistItemsArgs),
    SearchChannels(SearchChannelsArgs),
}

/// Projected result of a tool call, one variant per tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ToolResponse {
    Videos(Vec<VideoSummary>),
    Channel(ChannelInfo),
    Video(VideoDetails),
    PlaylistItems(Vec<PlaylistEntry>),
    Channels(Vec<ChannelSummary>),
}

impl ToolRequest {
    /// Validate raw arguments against `kind`'s schema. Absent arguments are
    /// treated as an empty object.
    pub fn parse(kind: ToolKind, arguments: serde_json::Value) -> YouTubeResult<Self> {
        let arguments = match arguments {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            value @ serde_json::Value::Object(_) => value,
            other => {
                return Err(YouTubeError::InvalidArgument(format!(
                    "arguments for {} must be an object, got {}",
                    kind.name(),
                    json_type_name(&other)
                )))
            }
        };

        let request = match kind {
            ToolKind::SearchVideos => {
                let args: SearchVideosArgs = decode(kind, arguments)?;
                require_non_empty(kind, "query", &args.query)?;
                Self::SearchVideos(args)
            }
            ToolKind::GetChannelInfo => Self::GetChannelInfo(decode(kind, arguments)?),
            ToolKind::GetVideoDetails => {
                let args: GetVideoDetailsArgs = decode(kind, arguments)?;
                require_non_empty(kind, "video_id", &args.video_id)?;
                Self::GetVideoDetails(args)
            }
            ToolKind::GetPlaylistItems => {
                let args: GetPlaylistItemsArgs = decode(kind, arguments)?;
                require_non_empty(kind, "playlist_id", &args.playlist_id)?;
                Self::GetPlaylistItems(args)
            }
            ToolKind::SearchChannels => {
                let args: SearchChannelsArgs = decode(kind, arguments)?;
                require_non_empty(kind, "query", &args.query)?;
                Self::SearchChannels(args)
            }
        };

        Ok(request)
    }
}

fn decode<T: DeserializeOwned>(kind: ToolKind, arguments: serde_json::Value) -> YouTubeResult<T> {
    serde_json::from_value(arguments).map_err(|e| {
        YouTubeError::InvalidArgument(format!("invalid arguments for {}: {}", kind.name(), e))
    })
}

fn require_non_empty(kind: ToolKind, field: &str, value: &str) -> YouTubeResult<()> {
    if value.trim().is_empty() {
        return Err(YouTubeError::InvalidArgument(format!(
            "{} requires a non-empty {}",
            kind.name(),
            field
        )));
    }
    Ok(())
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Zero or absent means the default page size.
pub fn effective_max_results(max_results: Option<u32>) -> u32 {
    match max_results {
        None | Some(0) => DEFAULT_MAX_RESULTS,
        Some(n) => n,
    }
}

/// Empty optional ids are the same as absent ones.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Run a validated request against the gateway and project the result.
pub async fn dispatch(api: &dyn YouTubeApi, request: &ToolRequest) -> YouTubeResult<ToolResponse> {
    let response = match request {
        ToolRequest::SearchVideos(args) => {
            let results = api
                .search_videos(
                    &args.query,
                    effective_max_results(args.max_results),
                    non_empty(&args.channel_id),
                )
                .await?;
            ToolResponse::Videos(project_all(&results))
        }
        ToolRequest::GetChannelInfo(args) => {
            let channel = api.get_channel_info(non_empty(&args.channel_id)).await?;
            ToolResponse::Channel(ChannelInfo::from(&channel))
        }
        ToolRequest::GetVideoDetails(args) => {
            let video = api.get_video_details(&args.video_id).await?;
            ToolResponse::Video(VideoDetails::from(&video))
        }
        ToolRequest::GetPlaylistItems(args) => {
            let items = api
                .get_playlist_items(&args.playlist_id, effective_max_results(args.max_results))
                .await?;
            ToolResponse::PlaylistItems(project_all(&items))
        }
        ToolRequest::SearchChannels(args) => {
            let results = api
                .search_channels(&args.query, effective_max_results(args.max_results))
                .await?;
            ToolResponse::Channels(project_all(&results))
        }
    };

    Ok(response)
}

/// One MCP tool backed by the YouTube gateway.
pub struct YouTubeTool {
    kind: ToolKind,
    api: Arc<dyn YouTubeApi>,
}

impl YouTubeTool {
    pub fn new(kind: ToolKind, api: Arc<dyn YouTubeApi>) -> Self {
        Self { kind, api }
    }

    async fn call(&self, arguments: serde_json::Value) -> YouTubeResult<ToolResponse> {
        let request = ToolRequest::parse(self.kind, arguments)?;
        dispatch(self.api.as_ref(), &request).await
    }
}

#[async_trait::async_trait]
impl Tool for YouTubeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.kind.name().to_string(),
            description: self.kind.description().to_string(),
            input_schema: self.kind.input_schema(),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        match self.call(arguments).await {
            Ok(response) => {
                let json = serde_json::to_string_pretty(&response)
                    .with_context(|| format!("Failed to serialize {} response", self.kind.name()))?;
                Ok(CallToolResult::text(json))
            }
            Err(e) => {
                tracing::warn!(tool = self.kind.name(), kind = e.kind(), error = %e, "Tool call failed");
                Ok(CallToolResult::error(e.to_string()))
            }
        }
    }
}

/// Register all five YouTube tools against one gateway.
pub fn register_youtube_tools(registry: &mut ToolRegistry, api: Arc<dyn YouTubeApi>) {
    for kind in ToolKind::ALL {
        registry.register(Arc::new(YouTubeTool::new(kind, api.clone())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ToolContent;
    use std::sync::Mutex;
    use youtube_mcp_core::youtube::{Channel, PlaylistItem, SearchResult, Video};

    /// Records every gateway call and answers from canned data.
    #[derive(Default)]
    struct FakeYouTube {
        calls: Mutex<Vec<String>>,
        search_items: Vec<SearchResult>,
        own_channel: bool,
    }

    impl FakeYouTube {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl YouTubeApi for FakeYouTube {
        async fn search_videos(
            &self,
            query: &str,
            max_results: u32,
            channel_id: Option<&str>,
        ) -> YouTubeResult<Vec<SearchResult>> {
            self.record(format!("search_videos({query}, {max_results}, {channel_id:?})"));
            Ok(self
                .search_items
                .iter()
                .take(max_results as usize)
                .cloned()
                .collect())
        }

        async fn get_channel_info(&self, channel_id: Option<&str>) -> YouTubeResult<Channel> {
            self.record(format!("get_channel_info({channel_id:?})"));
            match channel_id {
                None if self.own_channel => Ok(serde_json::from_value(serde_json::json!({
                    "id": "UCmine", "snippet": {"title": "Mine"}
                }))
                .unwrap()),
                None => Err(YouTubeError::Upstream {
                    operation: "getting channel info",
                    status: None,
                    message: "requires OAuth2".to_string(),
                }),
                Some(id) => Err(YouTubeError::NotFound {
                    kind: "channel",
                    id: id.to_string(),
                }),
            }
        }

        async fn get_video_details(&self, video_id: &str) -> YouTubeResult<Video> {
            self.record(format!("get_video_details({video_id})"));
            Ok(serde_json::from_value(serde_json::json!({
                "id": video_id,
                "snippet": {"title": "A video"}
            }))
            .unwrap())
        }

        async fn get_playlist_items(
            &self,
            playlist_id: &str,
            max_results: u32,
        ) -> YouTubeResult<Vec<PlaylistItem>> {
            self.record(format!("get_playlist_items({playlist_id}, {max_results})"));
            Ok(Vec::new())
        }

        async fn search_channels(&self, query: &str, max_results: u32) -> YouTubeResult<Vec<SearchResult>> {
            self.record(format!("search_channels({query}, {max_results})"));
            Ok(Vec::new())
        }
    }

    fn video_results(count: usize) -> Vec<SearchResult> {
        (0..count)
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "id": {"kind": "youtube#video", "videoId": format!("v{i}")},
                    "snippet": {
                        "title": format!("Video {i}"),
                        "channelId": "UCgo",
                        "publishedAt": "2024-05-01T00:00:00Z",
                        "thumbnails": {"medium": {"url": format!("https://i.ytimg.com/vi/v{i}/mqdefault.jpg")}}
                    }
                }))
                .unwrap()
            })
            .collect()
    }

    fn result_text(result: &CallToolResult) -> &str {
        match &result.content[0] {
            ToolContent::Text { text } => text,
        }
    }

    #[test]
    fn test_tool_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("delete_video"), None);
    }

    #[test]
    fn test_effective_max_results() {
        assert_eq!(effective_max_results(None), 10);
        assert_eq!(effective_max_results(Some(0)), 10);
        assert_eq!(effective_max_results(Some(5)), 5);
    }

    #[test]
    fn test_parse_rejects_missing_required_field() {
        let err = ToolRequest::parse(ToolKind::GetVideoDetails, serde_json::json!({})).unwrap_err();
        assert!(matches!(err, YouTubeError::InvalidArgument(_)));
        assert!(err.to_string().contains("video_id"));
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        let err = ToolRequest::parse(
            ToolKind::SearchVideos,
            serde_json::json!({"query": "rust", "max_results": "five"}),
        )
        .unwrap_err();
        assert!(matches!(err, YouTubeError::InvalidArgument(_)));

        let err = ToolRequest::parse(
            ToolKind::SearchChannels,
            serde_json::json!({"query": "rust", "max_results": -1}),
        )
        .unwrap_err();
        assert!(matches!(err, YouTubeError::InvalidArgument(_)));

        let err = ToolRequest::parse(ToolKind::SearchChannels, serde_json::json!(["rust"])).unwrap_err();
        assert!(err.to_string().contains("must be an object"));
    }

    #[test]
    fn test_parse_rejects_blank_ids() {
        let err = ToolRequest::parse(
            ToolKind::GetPlaylistItems,
            serde_json::json!({"playlist_id": "  "}),
        )
        .unwrap_err();
        assert!(matches!(err, YouTubeError::InvalidArgument(_)));
    }

    #[test]
    fn test_parse_channel_info_without_arguments() {
        let request = ToolRequest::parse(ToolKind::GetChannelInfo, serde_json::Value::Null).unwrap();
        assert_eq!(request, ToolRequest::GetChannelInfo(GetChannelInfoArgs::default()));
    }

    #[tokio::test]
    async fn test_default_max_results_reaches_gateway() {
        let fake = Arc::new(FakeYouTube::default());

        for (kind, args) in [
            (ToolKind::SearchVideos, serde_json::json!({"query": "q"})),
            (ToolKind::SearchVideos, serde_json::json!({"query": "q", "max_results": 0})),
            (ToolKind::GetPlaylistItems, serde_json::json!({"playlist_id": "PL1"})),
            (ToolKind::SearchChannels, serde_json::json!({"query": "q", "max_results": 0})),
        ] {
            let request = ToolRequest::parse(kind, args).unwrap();
            dispatch(fake.as_ref(), &request).await.unwrap();
        }

        assert_eq!(
            fake.calls(),
            vec![
                "search_videos(q, 10, None)",
                "search_videos(q, 10, None)",
                "get_playlist_items(PL1, 10)",
                "search_channels(q, 10)",
            ]
        );
    }

    #[tokio::test]
    async fn test_search_videos_scenario() {
        let fake = Arc::new(FakeYouTube {
            search_items: video_results(8),
            ..Default::default()
        });
        let tool = YouTubeTool::new(ToolKind::SearchVideos, fake.clone());

        let result = tool
            .execute(serde_json::json!({"query": "golang tutorial", "max_results": 5}))
            .await
            .unwrap();

        assert!(result.is_error.is_none());
        assert_eq!(fake.calls(), vec!["search_videos(golang tutorial, 5, None)"]);

        let videos: Vec<serde_json::Value> = serde_json::from_str(result_text(&result)).unwrap();
        assert_eq!(videos.len(), 5);
        for video in &videos {
            for field in ["video_id", "title", "channel_id", "published_at", "thumbnail_url"] {
                assert!(video.get(field).is_some(), "missing {field}");
            }
        }
        assert_eq!(videos[0]["video_id"], "v0");
        assert_eq!(videos[4]["video_id"], "v4");
    }

    #[tokio::test]
    async fn test_empty_channel_id_means_own_channel() {
        let fake = Arc::new(FakeYouTube {
            own_channel: true,
            ..Default::default()
        });
        let tool = YouTubeTool::new(ToolKind::GetChannelInfo, fake.clone());

        let result = tool.execute(serde_json::json!({"channel_id": ""})).await.unwrap();

        assert!(result.is_error.is_none());
        assert_eq!(fake.calls(), vec!["get_channel_info(None)"]);
        let channel: serde_json::Value = serde_json::from_str(result_text(&result)).unwrap();
        assert_eq!(channel["channel_id"], "UCmine");
    }

    #[tokio::test]
    async fn test_gateway_errors_become_tool_errors() {
        let fake = Arc::new(FakeYouTube::default());

        let own = YouTubeTool::new(ToolKind::GetChannelInfo, fake.clone())
            .execute(serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(own.is_error, Some(true));
        assert!(result_text(&own).contains("requires OAuth2"));

        let missing = YouTubeTool::new(ToolKind::GetChannelInfo, fake.clone())
            .execute(serde_json::json!({"channel_id": "UCnope"}))
            .await
            .unwrap();
        assert_eq!(missing.is_error, Some(true));
        assert_eq!(result_text(&missing), "Error: channel not found: UCnope");
    }

    #[tokio::test]
    async fn test_invalid_arguments_never_reach_gateway() {
        let fake = Arc::new(FakeYouTube::default());
        let tool = YouTubeTool::new(ToolKind::SearchVideos, fake.clone());

        let result = tool.execute(serde_json::json!({"max_results": 3})).await.unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).starts_with("Error: Invalid argument"));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_playlist_is_empty_array() {
        let fake = Arc::new(FakeYouTube::default());
        let tool = YouTubeTool::new(ToolKind::GetPlaylistItems, fake);

        let result = tool
            .execute(serde_json::json!({"playlist_id": "PLunknown", "max_results": 3}))
            .await
            .unwrap();

        assert!(result.is_error.is_none());
        assert_eq!(result_text(&result), "[]");
    }

    #[test]
    fn test_register_youtube_tools() {
        let mut registry = ToolRegistry::new();
        register_youtube_tools(&mut registry, Arc::new(FakeYouTube::default()));

        let names: Vec<_> = registry.list_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "get_channel_info",
                "get_playlist_items",
                "get_video_details",
                "search_channels",
                "search_videos",
            ]
        );

        let schema = registry.get("search_videos").unwrap().schema();
        assert_eq!(schema.input_schema["required"], serde_json::json!(["query"]));
    }
}
