use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use vixynt_catalog::FileStats;
use vixynt_labels::{Label, MetadataRecord};

use crate::bridge::HostBridge;
use crate::error::BridgeError;
use crate::types::{
    FillRequest, FineTuneConfig, FineTuneStatus, FineTuneSubmission, GenerateRequest,
    GeneratedImage, ModelInfo,
};

/// Scriptable in-memory host for tests.
#[derive(Default)]
pub(crate) struct FakeBridge {
    calls: AtomicUsize,
    pub stats: HashMap<PathBuf, FileStats>,
    pub failing: HashSet<PathBuf>,
    pub deleted: Mutex<Vec<PathBuf>>,
    pub saved: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    /// Returned in order by `fine_tune_status`. Once empty, jobs report running.
    pub statuses: Mutex<VecDeque<Result<FineTuneStatus, String>>>,
    pub status_polls: AtomicUsize,
}

impl FakeBridge {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check(&self, path: &Path) -> Result<(), BridgeError> {
        if self.failing.contains(path) {
            Err(BridgeError::Host(format!("refused {}", path.display())))
        } else {
            Ok(())
        }
    }
}

impl HostBridge for FakeBridge {
    async fn ensure_directory(&self, _dir: &Path) -> Result<(), BridgeError> {
        self.hit();
        Ok(())
    }

    async fn list_images(&self, _dir: &Path) -> Result<Vec<PathBuf>, BridgeError> {
        self.hit();
        let mut paths: Vec<_> = self.stats.keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }

    async fn rename(&self, from: &Path, _to: &Path) -> Result<(), BridgeError> {
        self.hit();
        self.check(from)
    }

    async fn delete(&self, path: &Path) -> Result<(), BridgeError> {
        self.hit();
        self.check(path)?;
        self.deleted.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn save_blob(&self, dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, BridgeError> {
        self.hit();
        let path = dir.join(name);
        self.saved.lock().unwrap().push((path.clone(), bytes.to_vec()));
        Ok(path)
    }

    async fn file_stats(&self, path: &Path) -> Result<FileStats, BridgeError> {
        self.hit();
        self.check(path)?;
        self.stats
            .get(path)
            .copied()
            .ok_or_else(|| BridgeError::NotFound(path.to_path_buf()))
    }

    async fn read_metadata(&self, path: &Path) -> Result<MetadataRecord, BridgeError> {
        self.hit();
        self.check(path)?;
        Ok(MetadataRecord::default())
    }

    async fn write_metadata(&self, path: &Path, _metadata: &MetadataRecord) -> Result<(), BridgeError> {
        self.hit();
        self.check(path)
    }

    async fn read_labels(&self, path: &Path) -> Result<Vec<Label>, BridgeError> {
        self.hit();
        self.check(path)?;
        Ok(Vec::new())
    }

    async fn write_labels(&self, path: &Path, _labels: &[Label]) -> Result<(), BridgeError> {
        self.hit();
        self.check(path)
    }

    async fn generate_images(&self, request: &GenerateRequest) -> Result<Vec<GeneratedImage>, BridgeError> {
        self.hit();
        Ok((0..request.count)
            .map(|i| {
                GeneratedImage::Path(
                    request
                        .output_dir
                        .join(format!("{}_{i}.png", request.base_filename)),
                )
            })
            .collect())
    }

    async fn generative_fill(&self, request: &FillRequest) -> Result<PathBuf, BridgeError> {
        self.hit();
        Ok(request.image_path.with_extension("filled.png"))
    }

    async fn suggest_labels(&self, _path: &Path) -> Result<Vec<Label>, BridgeError> {
        self.hit();
        Ok(Vec::new())
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, BridgeError> {
        self.hit();
        Ok(Vec::new())
    }

    async fn submit_fine_tune(&self, _config: &FineTuneConfig) -> Result<FineTuneSubmission, BridgeError> {
        self.hit();
        Ok(FineTuneSubmission {
            job_id: "job-1".into(),
        })
    }

    async fn fine_tune_status(&self, _job_id: &str) -> Result<FineTuneStatus, BridgeError> {
        self.hit();
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        match self.statuses.lock().unwrap().pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(message)) => Err(BridgeError::Host(message)),
            None => Ok(FineTuneStatus::running()),
        }
    }
}
