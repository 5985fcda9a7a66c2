//! Media models shared by the collection, the query view and the transports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Moderation state of a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    /// Uploaded, analysis not started
    Pending,
    /// Sensitivity analysis running
    Processing,
    /// Cleared for playback
    Safe,
    /// Flagged as sensitive, never played
    Flagged,
}

impl MediaStatus {
    pub const ALL: [MediaStatus; 4] = [
        MediaStatus::Pending,
        MediaStatus::Processing,
        MediaStatus::Safe,
        MediaStatus::Flagged,
    ];

    /// Only videos that passed analysis may be streamed
    pub fn is_playable(self) -> bool {
        self == MediaStatus::Safe
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaStatus::Pending => "pending",
            MediaStatus::Processing => "processing",
            MediaStatus::Safe => "safe",
            MediaStatus::Flagged => "flagged",
        }
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        MediaStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| format!("Unknown media status: {}", s))
    }
}

/// Video as listed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: MediaStatus,
    /// Username of the uploader
    #[serde(default)]
    pub uploaded_by: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// File size in bytes
    #[serde(default)]
    pub size: Option<u64>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    /// Analysis score between 0 and 1
    #[serde(default)]
    pub sensitivity_score: Option<f64>,
}

/// Status change pushed by the server for one video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub id: Uuid,
    pub status: MediaStatus,
}
