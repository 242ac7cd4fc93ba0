pub mod db;
pub mod gallery;
pub mod models;
pub mod scan;

pub use db::Catalog;
pub use gallery::{GalleryQuery, IMAGES_PER_PAGE, SortKey, SortOrder, TypeFilter, sort_and_filter};
pub use models::{DatasetId, FileStats, VideoDataset, VideoExample, ViewMode};
