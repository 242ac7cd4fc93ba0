//! Multi-track clip timeline for the video editor: placement, trimming,
//! splitting, transitions and text overlays.

pub mod model;
pub mod timeline;

pub use model::{Clip, ClipId, MediaKind, TextAlign, TextOverlay, Track, TrackId, Transition, TransitionKind};
pub use timeline::{Timeline, TrimOrigin, format_time, pixels_per_second};
