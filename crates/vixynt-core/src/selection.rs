use serde::{Deserialize, Serialize};
use tracing::debug;

/// A point in image-normalized percent coordinates (0..=100 on both axes).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 100.0),
            y: self.y.clamp(0.0, 100.0),
        }
    }
}

/// Crop rectangle in percent of the image. The default keeps everything.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Crop {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        }
    }
}

impl Crop {
    pub fn is_full(&self) -> bool {
        *self == Self::default()
    }

    /// Pull the rect back inside the image.
    pub fn clamped(self) -> Self {
        let x = self.x.clamp(0.0, 100.0);
        let y = self.y.clamp(0.0, 100.0);
        Self {
            x,
            y,
            width: self.width.clamp(0.0, 100.0 - x),
            height: self.height.clamp(0.0, 100.0 - y),
        }
    }
}

/// A user-drawn region over the image, in percent of the image bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Selection {
    Rect { x1: f32, y1: f32, x2: f32, y2: f32 },
    Lasso { points: Vec<Point> },
}

impl Selection {
    /// Bounding box as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        match self {
            Selection::Rect { x1, y1, x2, y2 } => {
                (x1.min(*x2), y1.min(*y2), x1.max(*x2), y1.max(*y2))
            }
            Selection::Lasso { points } => points.iter().fold(
                (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
                |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
            ),
        }
    }

    /// Whether `p` lies inside a rect selection (edges inclusive). Lassos
    /// never report a hit since they cannot be dragged.
    pub fn rect_contains(&self, p: Point) -> bool {
        match self {
            Selection::Rect { .. } => {
                let (x0, y0, x1, y1) = self.bounds();
                p.x >= x0 && p.x <= x1 && p.y >= y0 && p.y <= y1
            }
            Selection::Lasso { .. } => false,
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            Selection::Rect { x1, y1, x2, y2 } => {
                *x1 += dx;
                *x2 += dx;
                *y1 += dy;
                *y2 += dy;
            }
            Selection::Lasso { points } => {
                for p in points {
                    p.x += dx;
                    p.y += dy;
                }
            }
        }
    }
}

/// Which selection tool the pointer is driving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionTool {
    /// Moves an existing rect; draws a new rect when pressed outside one.
    #[default]
    Select,
    Rect,
    Lasso,
}

#[derive(Clone, Debug, Default, PartialEq)]
enum GestureState {
    #[default]
    Idle,
    DrawingRect,
    DraggingRect {
        last: Point,
    },
    DrawingLasso {
        points: Vec<Point>,
    },
}

/// Pointer-driven state machine that builds, moves and finalizes selections.
///
/// The active selection is owned by the caller and passed in on every event,
/// so the gesture itself only tracks the in-flight interaction.
#[derive(Clone, Debug, Default)]
pub struct SelectionGesture {
    state: GestureState,
}

/// A lasso needs at least this many points to become a selection.
pub const MIN_LASSO_POINTS: usize = 3;

impl SelectionGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.state != GestureState::Idle
    }

    /// Points collected so far by an in-progress lasso, for preview drawing.
    pub fn lasso_preview(&self) -> &[Point] {
        match &self.state {
            GestureState::DrawingLasso { points } => points,
            _ => &[],
        }
    }

    pub fn pointer_down(
        &mut self,
        tool: SelectionTool,
        at: Point,
        selection: &mut Option<Selection>,
    ) {
        let at = at.clamped();

        if tool == SelectionTool::Select
            && let Some(sel) = selection.as_ref()
            && sel.rect_contains(at)
        {
            debug!(x = at.x, y = at.y, "start dragging selection");
            self.state = GestureState::DraggingRect { last: at };
            return;
        }

        match tool {
            SelectionTool::Select | SelectionTool::Rect => {
                *selection = Some(Selection::Rect {
                    x1: at.x,
                    y1: at.y,
                    x2: at.x,
                    y2: at.y,
                });
                self.state = GestureState::DrawingRect;
            }
            SelectionTool::Lasso => {
                *selection = None;
                self.state = GestureState::DrawingLasso { points: vec![at] };
            }
        }
    }

    pub fn pointer_move(&mut self, at: Point, selection: &mut Option<Selection>) {
        let at = at.clamped();
        match &mut self.state {
            GestureState::Idle => {}
            GestureState::DrawingRect => {
                if let Some(Selection::Rect { x2, y2, .. }) = selection {
                    *x2 = at.x;
                    *y2 = at.y;
                }
            }
            GestureState::DraggingRect { last } => {
                let (dx, dy) = (at.x - last.x, at.y - last.y);
                if let Some(sel) = selection {
                    sel.translate(dx, dy);
                }
                *last = at;
            }
            GestureState::DrawingLasso { points } => points.push(at),
        }
    }

    /// Finish the gesture. Returns true if a new selection was created.
    pub fn pointer_up(&mut self, selection: &mut Option<Selection>) -> bool {
        match std::mem::take(&mut self.state) {
            GestureState::DrawingLasso { points } => {
                if points.len() >= MIN_LASSO_POINTS {
                    debug!(points = points.len(), "lasso selection created");
                    *selection = Some(Selection::Lasso { points });
                    true
                } else {
                    debug!(points = points.len(), "lasso discarded, too few points");
                    false
                }
            }
            GestureState::DrawingRect => selection.is_some(),
            GestureState::DraggingRect { .. } | GestureState::Idle => false,
        }
    }

    /// Abort any gesture and drop the active selection (Escape).
    pub fn cancel(&mut self, selection: &mut Option<Selection>) {
        self.state = GestureState::Idle;
        *selection = None;
    }
}
