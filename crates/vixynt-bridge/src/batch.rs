//! Fan-out helpers that run one bridge call per item concurrently. A failing
//! item is logged and degraded. It never aborts the rest of the batch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use tokio::task::JoinSet;
use tracing::{info, warn};
use vixynt_catalog::FileStats;

use crate::bridge::HostBridge;
use crate::types::GeneratedImage;

#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Stats for every path. Paths whose lookup fails map to zeroed stats.
pub async fn stats_for_all<B>(bridge: Arc<B>, paths: Vec<PathBuf>) -> HashMap<PathBuf, FileStats>
where
    B: HostBridge + 'static,
{
    let mut tasks = JoinSet::new();
    for path in paths.iter().cloned() {
        let bridge = Arc::clone(&bridge);
        tasks.spawn(async move {
            let result = bridge.file_stats(&path).await;
            (path, result)
        });
    }

    let mut stats = HashMap::with_capacity(paths.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((path, Ok(s))) => {
                stats.insert(path, s);
            }
            Ok((path, Err(err))) => {
                warn!(?path, %err, "file stats failed");
                stats.insert(path, FileStats::default());
            }
            Err(err) => warn!(%err, "file stats task failed"),
        }
    }
    for path in paths {
        stats.entry(path).or_default();
    }
    stats
}

pub async fn delete_all<B>(bridge: Arc<B>, paths: Vec<PathBuf>) -> BatchReport
where
    B: HostBridge + 'static,
{
    let mut tasks = JoinSet::new();
    for path in paths {
        let bridge = Arc::clone(&bridge);
        tasks.spawn(async move {
            let result = bridge.delete(&path).await;
            (path, result)
        });
    }

    let mut report = BatchReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((path, Ok(()))) => report.succeeded.push(path),
            Ok((path, Err(err))) => {
                warn!(?path, %err, "delete failed");
                report.failed.push((path, err.to_string()));
            }
            Err(err) => warn!(%err, "delete task failed"),
        }
    }
    report.succeeded.sort();
    report.failed.sort();
    info!(
        deleted = report.succeeded.len(),
        failed = report.failed.len(),
        "batch delete complete"
    );
    report
}

fn decode_data_url(data: &str) -> Option<Vec<u8>> {
    let (_, payload) = data.split_once(";base64,")?;
    BASE64.decode(payload).ok()
}

/// Resolve generated images to files. Images the host already wrote are
/// kept. Inline images are decoded and saved as `{base}_{n}.png` in
/// `dir`.
pub async fn save_generated<B: HostBridge>(
    bridge: &B,
    images: &[GeneratedImage],
    dir: &Path,
    base_filename: &str,
) -> BatchReport {
    let mut report = BatchReport::default();
    for (n, image) in images.iter().enumerate() {
        match image {
            GeneratedImage::Path(path) => report.succeeded.push(path.clone()),
            GeneratedImage::Inline(data) => {
                let name = format!("{base_filename}_{n}.png");
                let target = dir.join(&name);
                let Some(bytes) = decode_data_url(data) else {
                    warn!(?target, "generated image is not base64 data");
                    report.failed.push((target, "invalid inline image data".into()));
                    continue;
                };
                match bridge.save_blob(dir, &name, &bytes).await {
                    Ok(path) => report.succeeded.push(path),
                    Err(err) => {
                        warn!(?target, %err, "saving generated image failed");
                        report.failed.push((target, err.to_string()));
                    }
                }
            }
        }
    }
    report
}
