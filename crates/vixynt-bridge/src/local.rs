//! Host bridge backed by the local file system.
//!
//! Metadata and labels are stored next to each image in sidecar JSON files,
//! `photo.jpg.meta.json` and `photo.jpg.labels.json`. The generation and
//! training calls need a model server and report
//! [`BridgeError::Unavailable`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tokio::fs;
use tracing::{debug, info};
use vixynt_catalog::FileStats;
use vixynt_catalog::scan;
use vixynt_labels::{Label, MetadataRecord, export_json, import_json};

use crate::bridge::HostBridge;
use crate::error::BridgeError;
use crate::types::{
    FillRequest, FineTuneConfig, FineTuneStatus, FineTuneSubmission, GenerateRequest,
    GeneratedImage, ModelInfo,
};

const META_SUFFIX: &str = ".meta.json";
const LABELS_SUFFIX: &str = ".labels.json";

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

pub fn metadata_sidecar(path: &Path) -> PathBuf {
    sidecar(path, META_SUFFIX)
}

pub fn labels_sidecar(path: &Path) -> PathBuf {
    sidecar(path, LABELS_SUFFIX)
}

/// Read a sidecar, treating a missing file as absent.
async fn read_optional(path: &Path) -> Result<Option<String>, BridgeError> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(BridgeError::io(path, err)),
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), BridgeError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(BridgeError::io(path, err)),
    }
}

async fn rename_if_exists(from: &Path, to: &Path) -> Result<(), BridgeError> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(BridgeError::io(from, err)),
    }
}

#[derive(Clone, Debug, Default)]
pub struct LocalBridge;

impl LocalBridge {
    pub fn new() -> Self {
        Self
    }
}

impl HostBridge for LocalBridge {
    async fn ensure_directory(&self, dir: &Path) -> Result<(), BridgeError> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| BridgeError::io(dir, e))
    }

    async fn list_images(&self, dir: &Path) -> Result<Vec<PathBuf>, BridgeError> {
        let mut entries = fs::read_dir(dir).await.map_err(|e| BridgeError::io(dir, e))?;
        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BridgeError::io(dir, e))?
        {
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            files.push((entry.path(), is_file));
        }
        let images = scan::select_images(files);
        debug!(?dir, count = images.len(), "listed images");
        Ok(images)
    }

    /// Renames the image and carries its sidecars along.
    async fn rename(&self, from: &Path, to: &Path) -> Result<(), BridgeError> {
        fs::rename(from, to)
            .await
            .map_err(|e| BridgeError::io(from, e))?;
        rename_if_exists(&metadata_sidecar(from), &metadata_sidecar(to)).await?;
        rename_if_exists(&labels_sidecar(from), &labels_sidecar(to)).await?;
        info!(?from, ?to, "renamed");
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<(), BridgeError> {
        fs::remove_file(path)
            .await
            .map_err(|e| BridgeError::io(path, e))?;
        remove_if_exists(&metadata_sidecar(path)).await?;
        remove_if_exists(&labels_sidecar(path)).await?;
        info!(?path, "deleted");
        Ok(())
    }

    async fn save_blob(&self, dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, BridgeError> {
        self.ensure_directory(dir).await?;
        let path = dir.join(name);
        fs::write(&path, bytes)
            .await
            .map_err(|e| BridgeError::io(&path, e))?;
        debug!(?path, size = bytes.len(), "saved blob");
        Ok(path)
    }

    async fn file_stats(&self, path: &Path) -> Result<FileStats, BridgeError> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| BridgeError::io(path, e))?;
        let modified_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Ok(FileStats {
            size: metadata.len(),
            modified_ms,
        })
    }

    async fn read_metadata(&self, path: &Path) -> Result<MetadataRecord, BridgeError> {
        let sidecar = metadata_sidecar(path);
        match read_optional(&sidecar).await? {
            Some(content) => serde_json::from_str(&content)
                .map_err(|source| BridgeError::Sidecar { path: sidecar, source }),
            None => Ok(MetadataRecord::default()),
        }
    }

    async fn write_metadata(&self, path: &Path, metadata: &MetadataRecord) -> Result<(), BridgeError> {
        let sidecar = metadata_sidecar(path);
        let json = serde_json::to_string_pretty(metadata).map_err(|source| BridgeError::Sidecar {
            path: sidecar.clone(),
            source,
        })?;
        fs::write(&sidecar, json)
            .await
            .map_err(|e| BridgeError::io(&sidecar, e))?;
        debug!(?path, "metadata written");
        Ok(())
    }

    async fn read_labels(&self, path: &Path) -> Result<Vec<Label>, BridgeError> {
        match read_optional(&labels_sidecar(path)).await? {
            Some(content) => Ok(import_json(&content)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_labels(&self, path: &Path, labels: &[Label]) -> Result<(), BridgeError> {
        let sidecar = labels_sidecar(path);
        let image = path.to_string_lossy();
        let json = export_json(Some(&*image), labels).map_err(|source| BridgeError::Sidecar {
            path: sidecar.clone(),
            source,
        })?;
        fs::write(&sidecar, json)
            .await
            .map_err(|e| BridgeError::io(&sidecar, e))?;
        debug!(?path, count = labels.len(), "labels written");
        Ok(())
    }

    async fn generate_images(&self, _request: &GenerateRequest) -> Result<Vec<GeneratedImage>, BridgeError> {
        Err(BridgeError::Unavailable("image generation"))
    }

    async fn generative_fill(&self, _request: &FillRequest) -> Result<PathBuf, BridgeError> {
        Err(BridgeError::Unavailable("generative fill"))
    }

    async fn suggest_labels(&self, _path: &Path) -> Result<Vec<Label>, BridgeError> {
        Err(BridgeError::Unavailable("label suggestion"))
    }

    /// Always empty without a model server.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, BridgeError> {
        Ok(Vec::new())
    }

    async fn submit_fine_tune(&self, _config: &FineTuneConfig) -> Result<FineTuneSubmission, BridgeError> {
        Err(BridgeError::Unavailable("fine-tuning"))
    }

    async fn fine_tune_status(&self, _job_id: &str) -> Result<FineTuneStatus, BridgeError> {
        Err(BridgeError::Unavailable("fine-tuning"))
    }
}
