use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use vixynt_catalog::FileStats;
use vixynt_labels::{Label, MetadataRecord};

use crate::error::BridgeError;
use crate::types::{
    FillRequest, FineTuneConfig, FineTuneStatus, FineTuneSubmission, GenerateRequest,
    GeneratedImage, ModelInfo,
};

/// Everything the viewer asks of its host process: file system access,
/// sidecar metadata and labels, image generation and model training.
///
/// Paths are absolute. Callers go through [`request_images`],
/// [`request_fill`] and [`start_fine_tune`] rather than the raw generation
/// methods so that invalid requests never reach the host.
pub trait HostBridge: Send + Sync {
    fn ensure_directory(&self, dir: &Path) -> impl Future<Output = Result<(), BridgeError>> + Send;

    fn list_images(&self, dir: &Path)
    -> impl Future<Output = Result<Vec<PathBuf>, BridgeError>> + Send;

    fn rename(&self, from: &Path, to: &Path)
    -> impl Future<Output = Result<(), BridgeError>> + Send;

    fn delete(&self, path: &Path) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Write `bytes` to `dir/name`, returning the full path.
    fn save_blob(
        &self,
        dir: &Path,
        name: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<PathBuf, BridgeError>> + Send;

    fn file_stats(&self, path: &Path)
    -> impl Future<Output = Result<FileStats, BridgeError>> + Send;

    fn read_metadata(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<MetadataRecord, BridgeError>> + Send;

    fn write_metadata(
        &self,
        path: &Path,
        metadata: &MetadataRecord,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    fn read_labels(&self, path: &Path)
    -> impl Future<Output = Result<Vec<Label>, BridgeError>> + Send;

    fn write_labels(
        &self,
        path: &Path,
        labels: &[Label],
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    fn generate_images(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<Vec<GeneratedImage>, BridgeError>> + Send;

    /// Returns the path of the filled image.
    fn generative_fill(
        &self,
        request: &FillRequest,
    ) -> impl Future<Output = Result<PathBuf, BridgeError>> + Send;

    fn suggest_labels(&self, path: &Path)
    -> impl Future<Output = Result<Vec<Label>, BridgeError>> + Send;

    fn list_models(&self) -> impl Future<Output = Result<Vec<ModelInfo>, BridgeError>> + Send;

    fn submit_fine_tune(
        &self,
        config: &FineTuneConfig,
    ) -> impl Future<Output = Result<FineTuneSubmission, BridgeError>> + Send;

    fn fine_tune_status(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<FineTuneStatus, BridgeError>> + Send;
}

pub async fn request_images<B: HostBridge>(
    bridge: &B,
    request: &GenerateRequest,
) -> Result<Vec<GeneratedImage>, BridgeError> {
    request.validate()?;
    debug!(count = request.count, model = %request.model, "generating images");
    let images = bridge.generate_images(request).await?;
    info!(returned = images.len(), "generation finished");
    Ok(images)
}

pub async fn request_fill<B: HostBridge>(
    bridge: &B,
    request: &FillRequest,
) -> Result<PathBuf, BridgeError> {
    request.validate()?;
    debug!(image = ?request.image_path, model = %request.model, "generative fill");
    let path = bridge.generative_fill(request).await?;
    info!(result = ?path, "generative fill finished");
    Ok(path)
}

pub async fn start_fine_tune<B: HostBridge>(
    bridge: &B,
    config: &FineTuneConfig,
) -> Result<FineTuneSubmission, BridgeError> {
    config.validate()?;
    let submission = bridge.submit_fine_tune(config).await?;
    info!(job_id = %submission.job_id, images = config.images.len(), "fine-tune started");
    Ok(submission)
}
