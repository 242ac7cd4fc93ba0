use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// User-editable descriptive metadata for one image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub author: Option<String>,
    pub copyright: Option<String>,
    /// 0 to 5 stars.
    pub rating: Option<u8>,
    pub camera: Option<String>,
    pub date_taken: Option<String>,
    /// Fields this model does not know about, preserved as-is.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl MetadataRecord {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("parse metadata JSON")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read metadata {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize metadata")
    }

    /// Parse a comma-separated keyword field, dropping empty entries.
    pub fn set_keywords_from_str(&mut self, raw: &str) {
        self.keywords = raw
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
    }

    pub fn set_rating(&mut self, stars: u8) {
        self.rating = Some(stars.min(5));
    }

    pub fn summary_lines(&self) -> Vec<(String, String)> {
        let mut lines = Vec::new();

        if let Some(ref title) = self.title {
            lines.push(("Title".into(), title.clone()));
        }
        if let Some(ref author) = self.author {
            lines.push(("Author".into(), author.clone()));
        }
        if let Some(ref camera) = self.camera {
            lines.push(("Camera".into(), camera.clone()));
        }
        if let Some(ref date) = self.date_taken {
            lines.push(("Date".into(), date.clone()));
        }
        if let Some(rating) = self.rating {
            lines.push(("Rating".into(), format!("{rating}/5")));
        }
        if !self.keywords.is_empty() {
            lines.push(("Keywords".into(), self.keywords.join(", ")));
        }
        if let Some(ref copyright) = self.copyright {
            lines.push(("Copyright".into(), copyright.clone()));
        }

        lines
    }
}
