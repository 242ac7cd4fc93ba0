//! Request and response payloads exchanged with the host.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vixynt_core::MaskedFill;
use vixynt_core::mask::mask_data_url;

use crate::error::BridgeError;

pub const DEFAULT_FILL_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_FILL_PROVIDER: &str = "gemini";
pub const DEFAULT_GENERATED_FILENAME: &str = "vixynt_gen";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    pub count: u32,
    pub model: String,
    pub provider: String,
    /// Reference images passed along with the prompt.
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
    pub base_filename: String,
    pub output_dir: PathBuf,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.prompt.trim().is_empty() {
            return Err(BridgeError::validation("Need a prompt"));
        }
        if self.count == 0 {
            return Err(BridgeError::validation("Need at least one image to generate"));
        }
        Ok(())
    }
}

/// A generated image is either written to disk by the host or returned
/// inline as a data URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratedImage {
    Path(PathBuf),
    Inline(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillRequest {
    pub image_path: PathBuf,
    /// `data:image/png;base64,...` mask, white where the fill applies.
    pub mask: String,
    pub prompt: String,
    pub model: String,
    pub provider: String,
}

impl FillRequest {
    /// Build the host payload from an editor fill request. Empty model or
    /// provider names fall back to the defaults.
    pub fn from_masked(fill: MaskedFill, model: &str, provider: &str) -> Self {
        let or_default = |value: &str, default: &str| {
            if value.trim().is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };
        Self {
            image_path: fill.image_path,
            mask: mask_data_url(&fill.mask_png),
            prompt: fill.prompt,
            model: or_default(model, DEFAULT_FILL_MODEL),
            provider: or_default(provider, DEFAULT_FILL_PROVIDER),
        }
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.prompt.trim().is_empty() {
            return Err(BridgeError::validation("Need a prompt"));
        }
        if self.mask.is_empty() || self.image_path.as_os_str().is_empty() {
            return Err(BridgeError::validation(
                "Need image and selection for generative fill",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub value: String,
    pub display_name: String,
    pub provider: String,
}

/// The model a generator panel selects first: a fine-tuned diffusers model,
/// then a stock stable-diffusion one, then whatever comes first.
pub fn preferred_model(models: &[ModelInfo]) -> Option<&ModelInfo> {
    models
        .iter()
        .find(|m| m.provider == "diffusers" && m.display_name.contains("Fine-tuned Diffuser"))
        .or_else(|| {
            models.iter().find(|m| {
                m.provider == "diffusers" && m.value.to_lowercase().contains("stable-diffusion")
            })
        })
        .or_else(|| models.first())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionMode {
    /// Left empty for the trainer to caption.
    #[default]
    Auto,
    Manual,
    /// Derived from the file stem.
    Filename,
}

/// `beach_sunset-02.png` becomes `beach sunset 02`.
pub fn caption_from_filename(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FineTuneConfig {
    pub images: Vec<PathBuf>,
    pub captions: Vec<String>,
    pub output_name: String,
    pub epochs: u32,
    pub batch_size: u32,
    pub learning_rate: f64,
    pub output_path: String,
}

impl Default for FineTuneConfig {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            captions: Vec::new(),
            output_name: "my_diffusion_model".into(),
            epochs: 100,
            batch_size: 4,
            learning_rate: 1e-4,
            output_path: "~/.npcsh/models".into(),
        }
    }
}

impl FineTuneConfig {
    /// Fill `captions` for the current image list. Manual captions are looked
    /// up by path and default to empty.
    pub fn assign_captions(
        &mut self,
        mode: CaptionMode,
        manual: &std::collections::HashMap<PathBuf, String>,
    ) {
        self.captions = match mode {
            CaptionMode::Auto => Vec::new(),
            CaptionMode::Manual => self
                .images
                .iter()
                .map(|p| manual.get(p).cloned().unwrap_or_default())
                .collect(),
            CaptionMode::Filename => self.images.iter().map(|p| caption_from_filename(p)).collect(),
        };
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.images.is_empty() {
            return Err(BridgeError::validation("Select images first"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FineTuneSubmission {
    pub job_id: String,
}

/// One poll of a training job. Hosts report progress loosely, so every
/// field is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FineTuneStatus {
    pub status: String,
    pub epoch: u32,
    pub total_epochs: u32,
    pub batch: u32,
    pub total_batches: u32,
    pub step: u64,
    pub loss: Option<f64>,
    pub loss_history: Vec<f64>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    pub complete: Option<bool>,
    pub error: Option<String>,
}

impl FineTuneStatus {
    pub fn running() -> Self {
        Self {
            status: "running".into(),
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == "complete" || self.complete == Some(true)
    }

    pub fn is_error(&self) -> bool {
        self.status == "error" || self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub fn is_terminal(&self) -> bool {
        self.is_complete() || self.is_error()
    }

    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}
