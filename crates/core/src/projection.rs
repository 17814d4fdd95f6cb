// Response projector: upstream records -> minimal, stable JSON records.
// Projection is total; absent upstream fields become empty/zero values.

use crate::youtube::{Channel, PlaylistItem, SearchResult, Video};
use serde::{Deserialize, Serialize};

/// `search_videos` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: String,
    pub thumbnail_url: String,
}

/// `get_channel_info` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub custom_url: String,
    pub published_at: String,
    pub country: String,
    pub thumbnail_url: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub view_count: u64,
}

/// `get_video_details` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: String,
    pub duration: String,
    pub thumbnail_url: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub tags: Vec<String>,
    pub category_id: String,
}

/// `get_playlist_items` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: String,
    pub position: i64,
    pub thumbnail_url: String,
}

/// `search_channels` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub thumbnail_url: String,
}

impl From<&SearchResult> for VideoSummary {
    fn from(item: &SearchResult) -> Self {
        Self {
            video_id: item.id.video_id.clone(),
            title: item.snippet.title.clone(),
            description: item.snippet.description.clone(),
            channel_id: item.snippet.channel_id.clone(),
            channel_title: item.snippet.channel_title.clone(),
            published_at: item.snippet.published_at.clone(),
            thumbnail_url: item.snippet.thumbnails.medium_url(),
        }
    }
}

impl From<&Channel> for ChannelInfo {
    fn from(channel: &Channel) -> Self {
        Self {
            channel_id: channel.id.clone(),
            title: channel.snippet.title.clone(),
            description: channel.snippet.description.clone(),
            custom_url: channel.snippet.custom_url.clone(),
            published_at: channel.snippet.published_at.clone(),
            country: channel.snippet.country.clone(),
            thumbnail_url: channel.snippet.thumbnails.medium_url(),
            subscriber_count: channel.statistics.subscriber_count,
            video_count: channel.statistics.video_count,
            view_count: channel.statistics.view_count,
        }
    }
}

impl From<&Video> for VideoDetails {
    fn from(video: &Video) -> Self {
        Self {
            video_id: video.id.clone(),
            title: video.snippet.title.clone(),
            description: video.snippet.description.clone(),
            channel_id: video.snippet.channel_id.clone(),
            channel_title: video.snippet.channel_title.clone(),
            published_at: video.snippet.published_at.clone(),
            duration: video.content_details.duration.clone(),
            thumbnail_url: video.snippet.thumbnails.medium_url(),
            view_count: video.statistics.view_count,
            like_count: video.statistics.like_count,
            comment_count: video.statistics.comment_count,
            tags: video.snippet.tags.clone(),
            category_id: video.snippet.category_id.clone(),
        }
    }
}

impl From<&PlaylistItem> for PlaylistEntry {
    fn from(item: &PlaylistItem) -> Self {
        Self {
            video_id: item.content_details.video_id.clone(),
            title: item.snippet.title.clone(),
            description: item.snippet.description.clone(),
            channel_id: item.snippet.channel_id.clone(),
            channel_title: item.snippet.channel_title.clone(),
            published_at: item.snippet.published_at.clone(),
            position: item.snippet.position,
            thumbnail_url: item.snippet.thumbnails.medium_url(),
        }
    }
}

impl From<&SearchResult> for ChannelSummary {
    fn from(item: &SearchResult) -> Self {
        Self {
            channel_id: item.id.channel_id.clone(),
            title: item.snippet.title.clone(),
            description: item.snippet.description.clone(),
            published_at: item.snippet.published_at.clone(),
            thumbnail_url: item.snippet.thumbnails.medium_url(),
        }
    }
}

/// Project a list element-wise, preserving upstream order.
pub fn project_all<'a, S: 'a, T>(items: impl IntoIterator<Item = &'a S>) -> Vec<T>
where
    T: From<&'a S>,
{
    items.into_iter().map(T::from).collect()
}
