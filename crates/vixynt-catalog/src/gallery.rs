//! Gallery search, type filter, sort and paging over a scanned image list.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::FileStats;
use crate::scan::extension_of;

pub const IMAGES_PER_PAGE: usize = 24;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Jpg,
    Png,
    Webp,
    Gif,
}

impl TypeFilter {
    pub fn matches(self, ext: &str) -> bool {
        match self {
            Self::All => true,
            Self::Jpg => ext == "jpg" || ext == "jpeg",
            Self::Png => ext == "png",
            Self::Webp => ext == "webp",
            Self::Gif => ext == "gif",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Type,
    Size,
    Date,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryQuery {
    pub search: String,
    pub filter: TypeFilter,
    pub sort: SortKey,
    pub order: SortOrder,
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Apply `query` to `images`. Sizes and dates come from `stats`, and an
/// image with no cached stats sorts as if both were zero.
pub fn sort_and_filter(
    images: &[PathBuf],
    stats: &HashMap<PathBuf, FileStats>,
    query: &GalleryQuery,
) -> Vec<PathBuf> {
    let needle = query.search.to_lowercase();
    let mut result: Vec<PathBuf> = images
        .iter()
        .filter(|p| p.to_string_lossy().to_lowercase().contains(&needle))
        .filter(|p| query.filter.matches(&extension_of(p)))
        .cloned()
        .collect();

    let stat = |p: &PathBuf| stats.get(p).copied().unwrap_or_default();
    result.sort_by(|a, b| {
        let ordering = match query.sort {
            SortKey::Name => file_name_lower(a).cmp(&file_name_lower(b)),
            SortKey::Type => extension_of(a).cmp(&extension_of(b)),
            SortKey::Size => stat(a).size.cmp(&stat(b).size),
            SortKey::Date => stat(a).modified_ms.cmp(&stat(b).modified_ms),
        };
        match query.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    result
}

pub fn page_count(total: usize) -> usize {
    total.div_ceil(IMAGES_PER_PAGE)
}

/// The first `pages` pages of `images`, as shown by a "load more" gallery.
pub fn visible(images: &[PathBuf], pages: usize) -> &[PathBuf] {
    let end = images.len().min(pages.saturating_mul(IMAGES_PER_PAGE));
    &images[..end]
}
