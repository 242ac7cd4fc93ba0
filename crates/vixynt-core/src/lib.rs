pub mod adjustments;
pub mod compose;
pub mod editor;
pub mod history;
pub mod layer;
pub mod mask;
pub mod selection;
pub mod workflow;

pub use adjustments::{AdjustmentField, Adjustments};
pub use compose::CombinedFilter;
pub use editor::{EditorMode, EditorSession, MaskedFill};
pub use layer::{Layer, LayerId, LayerKind};
pub use selection::{Crop, Point, Selection, SelectionTool};
pub use workflow::{NodeKind, NodeParams, Workflow};
