use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type DatasetId = i64;

/// How the gallery lays out thumbnails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Grid,
    #[default]
    List,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(Self::Grid),
            "list" => Ok(Self::List),
            other => anyhow::bail!("unknown view mode '{other}', expected grid or list"),
        }
    }
}

/// One generated clip kept for fine-tuning a video model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoExample {
    pub id: String,
    pub prompt: String,
    pub video_url: String,
    pub model: Option<String>,
    pub duration: Option<f64>,
    pub quality_score: Option<f64>,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDataset {
    pub id: DatasetId,
    pub name: String,
    pub examples: Vec<VideoExample>,
    pub created_at: String,
    pub updated_at: String,
}

/// Size and modification time of a file on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub modified_ms: i64,
}
