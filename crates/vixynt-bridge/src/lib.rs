//! Async boundary between the viewer and its host: file access, sidecar
//! metadata, image generation and fine-tuning.
pub mod batch;
pub mod bridge;
pub mod error;
pub mod error_slot;
pub mod finetune;
pub mod local;
pub mod types;

#[cfg(test)]
mod testing;

pub use bridge::{HostBridge, request_fill, request_images, start_fine_tune};
pub use error::BridgeError;
pub use error_slot::ErrorSlot;
pub use finetune::{CancelHandle, FineTuneMonitor, FineTuneOutcome};
pub use local::LocalBridge;
pub use types::{
    FillRequest, FineTuneConfig, FineTuneStatus, FineTuneSubmission, GenerateRequest,
    GeneratedImage, ModelInfo,
};
