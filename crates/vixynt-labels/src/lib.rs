//! Image annotation labels (JSON and CSV interchange) and descriptive
//! image metadata.
pub mod labels;
pub mod metadata;

pub use labels::{
    ImportError, Label, LabelFile, export_csv, export_json, image_file_name, import_csv,
    import_file, import_json,
};
pub use metadata::MetadataRecord;
