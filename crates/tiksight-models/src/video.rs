//! Video library models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One entry of the user's video library, as returned by the video-list
/// endpoint.
///
/// The backend stores whatever the source platform reported, so everything
/// beyond the row ID is optional and the engagement counters default to
/// zero when missing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    /// Database row ID
    pub id: i64,

    /// Original source URL
    #[serde(default)]
    pub url: Option<String>,

    /// Served location of the downloaded file
    #[serde(default)]
    pub file_path: Option<String>,

    /// Video description from the source platform
    #[serde(default)]
    pub description: Option<String>,

    /// Full transcript extracted on import
    #[serde(default)]
    pub transcript: Option<String>,

    /// AI-generated summary
    #[serde(default)]
    pub summary: Option<String>,

    /// Upload timestamp as reported by the source platform
    #[serde(default)]
    pub video_timestamp: Option<String>,

    /// Play count
    #[serde(default)]
    pub video_playcount: u64,

    /// Like count
    #[serde(default)]
    pub video_diggcount: u64,

    /// Comment count
    #[serde(default)]
    pub video_commentcount: u64,

    /// Share count
    #[serde(default)]
    pub video_sharecount: u64,
}

impl Video {
    /// Weighted engagement score used to rank library entries.
    ///
    /// Comments weigh double a like, shares double a comment.
    pub fn engagement_score(&self) -> f64 {
        (self.video_diggcount as f64) * 0.5
            + (self.video_commentcount as f64)
            + (self.video_sharecount as f64) * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_deserializes_sparse_row() {
        let video: Video = serde_json::from_value(serde_json::json!({
            "id": 7,
            "url": "https://www.tiktok.com/@user/video/1",
            "transcript": "hello"
        }))
        .unwrap();

        assert_eq!(video.id, 7);
        assert_eq!(video.video_playcount, 0);
        assert!(video.summary.is_none());
    }

    #[test]
    fn test_engagement_score() {
        let video: Video = serde_json::from_value(serde_json::json!({
            "id": 1,
            "video_diggcount": 100,
            "video_commentcount": 10,
            "video_sharecount": 5
        }))
        .unwrap();

        assert_eq!(video.engagement_score(), 70.0);
    }
}
