use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::models::FileStats;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff"];

pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

/// Lowercased extension of `path`, empty when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Image files directly inside `dir`, sorted by path. Subdirectories are not
/// descended into and unreadable entries are skipped.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(?dir, %err, "readdir error");
                continue;
            }
        };
        let path = entry.path();
        let is_file = path.is_file();
        files.push((path, is_file));
    }
    let images = select_images(files);

    info!(?dir, count = images.len(), "scanned directory");
    Ok(images)
}

/// Keep the regular files with an image extension, sorted by path. Takes
/// `(path, is_file)` pairs so async listers can share the same rule.
pub fn select_images(entries: impl IntoIterator<Item = (PathBuf, bool)>) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = entries
        .into_iter()
        .filter(|(path, is_file)| *is_file && is_image_extension(&extension_of(path)))
        .map(|(path, _)| path)
        .collect();
    images.sort();
    images
}

pub fn file_stats(path: &Path) -> Result<FileStats> {
    let metadata =
        fs::metadata(path).with_context(|| format!("failed to stat: {}", path.display()))?;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_images_filters_and_sorts() {
        let picked = select_images([
            (PathBuf::from("/p/z.webp"), true),
            (PathBuf::from("/p/folder.png"), false),
            (PathBuf::from("/p/a.GIF"), true),
            (PathBuf::from("/p/notes.md"), true),
        ]);
        assert_eq!(
            picked,
            vec![PathBuf::from("/p/a.GIF"), PathBuf::from("/p/z.webp")]
        );
    }

    #[test]
    fn lists_only_images_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt", "c.jpeg", "d.tiff", "e"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let names: Vec<_> = list_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG", "c.jpeg", "d.tiff"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_images(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn stats_report_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        fs::write(&path, vec![0u8; 1234]).unwrap();
        let stats = file_stats(&path).unwrap();
        assert_eq!(stats.size, 1234);
        assert!(stats.modified_ms > 0);
    }
}
