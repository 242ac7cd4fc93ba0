use std::path::{Path, PathBuf};

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adjustments::{AdjustmentField, Adjustments};
use crate::compose::{self, CombinedFilter};
use crate::history::{History, HistoryEntry};
use crate::layer::{
    Layer, LayerId, LayerKind, LayerParamsPatch, LayerPatch, LayerStack, TransformPatch,
};
use crate::mask;
use crate::selection::{Crop, Point, Selection, SelectionGesture, SelectionTool};

/// Which top-level view the session belongs to. History shortcuts only act
/// in the editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditorMode {
    #[default]
    Gallery,
    Editor,
    Generator,
    VideoEditor,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OpenImage {
    pub path: PathBuf,
    /// Native pixel dimensions.
    pub width: u32,
    pub height: u32,
}

/// Everything a generative-fill request needs from the editor.
#[derive(Clone, Debug)]
pub struct MaskedFill {
    pub image_path: PathBuf,
    /// Black/white PNG at the image's native size.
    pub mask_png: Vec<u8>,
    pub prompt: String,
}

/// Live darkroom state for one open image.
///
/// Mutations that are not committed right away (slider drags) remember the
/// state from before the first change, so the eventual commit records an
/// undo point that actually reverts the whole gesture.
#[derive(Debug, Default)]
pub struct EditorSession {
    mode: EditorMode,
    image: Option<OpenImage>,
    adjustments: Adjustments,
    layers: LayerStack,
    selected_layer_id: Option<LayerId>,
    crop: Crop,
    selection: Option<Selection>,
    tool: SelectionTool,
    gesture: SelectionGesture,
    history: History,
    pending: Option<HistoryEntry>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to a new image. Adjustments, layers, selection and history all
    /// start over.
    pub fn open_image(&mut self, path: impl Into<PathBuf>, width: u32, height: u32) {
        let path = path.into();
        info!(?path, width, height, "open image in editor");
        self.image = Some(OpenImage {
            path,
            width,
            height,
        });
        self.adjustments = Adjustments::default();
        self.layers.clear();
        self.selected_layer_id = None;
        self.crop = Crop::default();
        self.gesture.cancel(&mut self.selection);
        self.history.clear();
        self.pending = None;
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn image(&self) -> Option<&OpenImage> {
        self.image.as_ref()
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.image.as_ref().map(|i| i.path.as_path())
    }

    pub fn adjustments(&self) -> &Adjustments {
        &self.adjustments
    }

    pub fn layers(&self) -> &[Layer] {
        self.layers.layers()
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn selected_layer_id(&self) -> Option<&str> {
        self.selected_layer_id.as_deref()
    }

    pub fn crop(&self) -> Crop {
        self.crop
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        self.pending.is_some()
    }

    fn snapshot(&self, label: &str) -> HistoryEntry {
        HistoryEntry {
            label: label.to_string(),
            layers: self.layers.layers().to_vec(),
            adjustments: self.adjustments.clone(),
            selected_layer_id: self.selected_layer_id.clone(),
            crop: self.crop,
        }
    }

    fn restore(&mut self, entry: HistoryEntry) {
        self.layers.replace(entry.layers);
        self.adjustments = entry.adjustments;
        self.selected_layer_id = entry.selected_layer_id;
        self.crop = entry.crop;
    }

    /// Run a mutation. `f` returns `None` when nothing changed, in which case
    /// no history is touched.
    fn edit<R>(
        &mut self,
        label: &str,
        commit: bool,
        f: impl FnOnce(&mut Self) -> Option<R>,
    ) -> Option<R> {
        let before = self.pending.is_none().then(|| self.snapshot(label));
        let out = f(self)?;
        if let Some(before) = before {
            self.pending = Some(before);
        }
        if commit {
            self.commit(label);
        }
        Some(out)
    }

    /// Record an undo point covering every change since the last commit.
    /// Without pending changes the current state is recorded as-is.
    pub fn commit(&mut self, label: &str) {
        let mut entry = self.pending.take().unwrap_or_else(|| self.snapshot(label));
        entry.label = label.to_string();
        self.history.commit(entry);
    }

    fn flush_pending(&mut self) {
        if self.pending.is_some() {
            self.commit("Edit");
        }
    }

    pub fn undo(&mut self) -> bool {
        if self.mode != EditorMode::Editor {
            debug!(mode = ?self.mode, "undo ignored outside editor");
            return false;
        }
        self.flush_pending();
        let current = self.snapshot("");
        match self.history.undo(current) {
            Some(entry) => {
                self.restore(entry);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.mode != EditorMode::Editor {
            debug!(mode = ?self.mode, "redo ignored outside editor");
            return false;
        }
        // The live state, uncommitted edits included, becomes the undo point.
        let current = self.snapshot("");
        match self.history.redo(current) {
            Some(entry) => {
                self.pending = None;
                self.restore(entry);
                true
            }
            None => false,
        }
    }

    /// Change one base slider without committing; call [`commit`] when the
    /// drag ends.
    ///
    /// [`commit`]: Self::commit
    pub fn set_adjustment(&mut self, field: AdjustmentField, value: f32) {
        self.edit("Adjust", false, |s| {
            s.adjustments.set(field, value);
            Some(())
        });
    }

    /// Set the crop rect, clamped to the image. An unchanged crop leaves
    /// history alone.
    pub fn set_crop(&mut self, crop: Crop, commit: bool) -> bool {
        let crop = crop.clamped();
        self.edit("Crop", commit, |s| {
            (s.crop != crop).then(|| s.crop = crop)
        })
        .is_some()
    }

    /// Append a layer of `kind`, select it and commit.
    pub fn add_layer(&mut self, kind: LayerKind) -> LayerId {
        let label = format!("Add {} Layer", kind.display_name());
        let id = self.edit(&label, true, |s| {
            let id = s.layers.push(kind).id.clone();
            s.selected_layer_id = Some(id.clone());
            Some(id)
        });
        id.unwrap_or_default()
    }

    /// Like [`add_layer`](Self::add_layer) but by tag; unknown tags are a
    /// no-op.
    pub fn add_layer_named(&mut self, tag: &str) -> Option<LayerId> {
        let kind = LayerKind::from_tag(tag)?;
        Some(self.add_layer(kind))
    }

    pub fn update_layer_params(
        &mut self,
        layer_id: &str,
        patch: &LayerParamsPatch,
        commit: bool,
    ) -> bool {
        self.edit("Update Layer Params", commit, |s| {
            let layer = s.layers.get_mut(layer_id)?;
            layer.params.merge(patch).then_some(())
        })
        .is_some()
    }

    pub fn update_layer_transform(
        &mut self,
        layer_id: &str,
        patch: &TransformPatch,
        commit: bool,
    ) -> bool {
        self.edit("Transform Layer", commit, |s| {
            s.layers.get_mut(layer_id)?.transform.merge(patch);
            Some(())
        })
        .is_some()
    }

    pub fn update_layer(&mut self, layer_id: &str, patch: &LayerPatch, commit: bool) -> bool {
        self.edit("Update Layer", commit, |s| {
            s.layers.get_mut(layer_id)?.merge(patch);
            Some(())
        })
        .is_some()
    }

    pub fn remove_layer(&mut self, layer_id: &str, commit: bool) -> bool {
        self.edit("Delete Layer", commit, |s| {
            s.layers.remove(layer_id)?;
            if s.selected_layer_id.as_deref() == Some(layer_id) {
                s.selected_layer_id = None;
            }
            Some(())
        })
        .is_some()
    }

    pub fn move_layer(&mut self, layer_id: &str, index: usize, commit: bool) -> bool {
        self.edit("Reorder Layers", commit, |s| {
            s.layers.move_to(layer_id, index).then_some(())
        })
        .is_some()
    }

    /// Selecting a layer is not an undoable action on its own.
    pub fn select_layer(&mut self, layer_id: Option<&str>) -> bool {
        match layer_id {
            Some(id) if !self.layers.contains(id) => false,
            _ => {
                self.selected_layer_id = layer_id.map(str::to_string);
                true
            }
        }
    }

    pub fn combined_filter(&self) -> CombinedFilter {
        compose::combined_filter(&self.adjustments, self.layers.layers())
    }

    pub fn set_tool(&mut self, tool: SelectionTool) {
        self.tool = tool;
    }

    pub fn tool(&self) -> SelectionTool {
        self.tool
    }

    pub fn pointer_down(&mut self, at: Point) {
        self.gesture.pointer_down(self.tool, at, &mut self.selection);
    }

    pub fn pointer_move(&mut self, at: Point) {
        self.gesture.pointer_move(at, &mut self.selection);
    }

    pub fn pointer_up(&mut self) -> bool {
        self.gesture.pointer_up(&mut self.selection)
    }

    pub fn lasso_preview(&self) -> &[Point] {
        self.gesture.lasso_preview()
    }

    pub fn clear_selection(&mut self) {
        self.gesture.cancel(&mut self.selection);
    }

    /// Copy the active selection onto the selected layer's mask, commit, and
    /// drop the selection.
    pub fn apply_selection_as_mask(&mut self) -> bool {
        let (Some(selection), Some(layer_id)) =
            (self.selection.clone(), self.selected_layer_id.clone())
        else {
            return false;
        };
        let patch = LayerPatch {
            mask: Some(Some(selection)),
            ..Default::default()
        };
        if !self.update_layer(&layer_id, &patch, true) {
            return false;
        }
        self.selection = None;
        true
    }

    /// Validate and build a generative-fill payload from the active
    /// selection. The selection is consumed on success.
    pub fn fill_request(&mut self, prompt: &str) -> Result<MaskedFill> {
        ensure!(!prompt.trim().is_empty(), "Need a prompt");
        let (Some(image), Some(selection)) = (self.image.as_ref(), self.selection.as_ref()) else {
            anyhow::bail!("Need image and selection for generative fill");
        };
        let mask_png = mask::selection_to_png(selection, image.width, image.height)?;
        let request = MaskedFill {
            image_path: image.path.clone(),
            mask_png,
            prompt: prompt.trim().to_string(),
        };
        self.selection = None;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerParams;

    fn session() -> EditorSession {
        let mut s = EditorSession::new();
        s.open_image("/photos/a.jpg", 400, 200);
        s.set_mode(EditorMode::Editor);
        s
    }

    fn exposure_patch(v: f32) -> LayerParamsPatch {
        LayerParamsPatch::Adjustments(vec![(AdjustmentField::Exposure, v)])
    }

    #[test]
    fn add_layer_selects_and_commits() {
        let mut s = session();
        let id = s.add_layer(LayerKind::Adjustments);
        assert_eq!(s.selected_layer_id(), Some(id.as_str()));
        assert_eq!(s.layers().len(), 1);
        assert_eq!(s.history().undo_len(), 1);
        assert_eq!(s.history().undo_label(), Some("Add Adjustments Layer"));
    }

    #[test]
    fn unknown_layer_tag_is_noop() {
        let mut s = session();
        assert!(s.add_layer_named("CURVES").is_none());
        assert!(s.layers().is_empty());
        assert_eq!(s.history().undo_len(), 0);
        assert!(s.add_layer_named("TEXT").is_some());
    }

    #[test]
    fn undo_reverts_add_layer() {
        let mut s = session();
        s.add_layer(LayerKind::Text);
        assert!(s.undo());
        assert!(s.layers().is_empty());
        assert_eq!(s.selected_layer_id(), None);
        assert!(s.redo());
        assert_eq!(s.layers().len(), 1);
        assert!(s.selected_layer_id().is_some());
    }

    #[test]
    fn undo_round_trip_restores_start_state() {
        let mut s = session();
        let start = (s.layers().to_vec(), s.adjustments().clone());

        let id = s.add_layer(LayerKind::Adjustments);
        s.update_layer_params(&id, &exposure_patch(20.0), true);
        s.set_adjustment(AdjustmentField::Contrast, 15.0);
        s.commit("Adjust Contrast");
        assert_eq!(s.history().undo_len(), 3);

        for _ in 0..3 {
            assert!(s.undo());
        }
        assert_eq!((s.layers().to_vec(), s.adjustments().clone()), start);
        assert_eq!(s.history().redo_len(), 3);
    }

    #[test]
    fn slider_drag_commits_once_and_undoes_whole_gesture() {
        let mut s = session();
        for v in [10.0, 20.0, 30.0] {
            s.set_adjustment(AdjustmentField::Exposure, v);
        }
        assert!(s.has_uncommitted_changes());
        s.commit("Adjust Exposure");
        assert_eq!(s.history().undo_len(), 1);
        assert!(s.undo());
        assert_eq!(s.adjustments().exposure, 0.0);
        assert!(s.redo());
        assert_eq!(s.adjustments().exposure, 30.0);
    }

    #[test]
    fn redo_after_commit_is_noop() {
        let mut s = session();
        s.add_layer(LayerKind::Text);
        s.add_layer(LayerKind::Transform);
        s.undo();
        s.add_layer(LayerKind::Adjustments);
        assert!(!s.redo());
        assert_eq!(s.layers().len(), 2);
    }

    #[test]
    fn redo_replays_over_uncommitted_edit() {
        let mut s = session();
        s.add_layer(LayerKind::Text);
        assert!(s.undo());
        s.set_adjustment(AdjustmentField::Exposure, 5.0);

        assert!(s.redo());
        assert_eq!(s.layers().len(), 1);
        assert_eq!(s.adjustments().exposure, 0.0);
        assert_eq!(s.history().redo_len(), 0);
        assert_eq!(s.history().undo_len(), 1);
        assert!(!s.has_uncommitted_changes());

        // The uncommitted edit is what undo brings back.
        assert!(s.undo());
        assert!(s.layers().is_empty());
        assert_eq!(s.adjustments().exposure, 5.0);
    }

    #[test]
    fn redo_with_empty_stack_keeps_pending_edit() {
        let mut s = session();
        s.set_adjustment(AdjustmentField::Exposure, 5.0);
        assert!(!s.redo());
        assert!(s.has_uncommitted_changes());
        assert_eq!(s.adjustments().exposure, 5.0);
    }

    #[test]
    fn crop_is_part_of_history() {
        let mut s = session();
        let crop = Crop {
            x: 10.0,
            y: 10.0,
            width: 50.0,
            height: 40.0,
        };
        assert!(s.set_crop(crop, true));
        assert!(!s.set_crop(crop, true));
        assert_eq!(s.history().undo_len(), 1);
        assert_eq!(s.history().undo_label(), Some("Crop"));

        assert!(s.undo());
        assert!(s.crop().is_full());
        assert!(s.redo());
        assert_eq!(s.crop(), crop);

        s.open_image("/photos/b.jpg", 100, 100);
        assert!(s.crop().is_full());
    }

    #[test]
    fn undo_outside_editor_is_noop() {
        let mut s = session();
        s.add_layer(LayerKind::Text);
        s.set_mode(EditorMode::Gallery);
        assert!(!s.undo());
        assert_eq!(s.layers().len(), 1);
        assert_eq!(s.history().undo_len(), 1);
    }

    #[test]
    fn uncommitted_change_is_undoable() {
        let mut s = session();
        s.set_adjustment(AdjustmentField::Tint, 12.0);
        assert!(s.undo());
        assert_eq!(s.adjustments().tint, 0.0);
        assert!(!s.has_uncommitted_changes());
    }

    #[test]
    fn update_unknown_layer_is_noop() {
        let mut s = session();
        assert!(!s.update_layer_params("nope", &exposure_patch(1.0), true));
        assert!(!s.update_layer_transform("nope", &TransformPatch::default(), true));
        assert!(!s.update_layer("nope", &LayerPatch::default(), true));
        assert_eq!(s.history().undo_len(), 0);
        assert!(!s.has_uncommitted_changes());
    }

    #[test]
    fn params_merge_through_session() {
        let mut s = session();
        let id = s.add_layer(LayerKind::Adjustments);
        s.update_layer_params(&id, &exposure_patch(20.0), false);
        s.update_layer_params(
            &id,
            &LayerParamsPatch::Adjustments(vec![(AdjustmentField::Warmth, 8.0)]),
            true,
        );
        let LayerParams::Adjustments(p) = &s.layer(&id).unwrap().params else {
            panic!("expected adjustment params");
        };
        assert_eq!(p.exposure, 20.0);
        assert_eq!(p.warmth, 8.0);
        assert_eq!(s.history().undo_len(), 2);
    }

    #[test]
    fn combined_filter_sums_base_and_layer() {
        let mut s = session();
        s.set_adjustment(AdjustmentField::Exposure, 10.0);
        let id = s.add_layer(LayerKind::Adjustments);
        s.update_layer_params(&id, &exposure_patch(20.0), true);
        assert_eq!(s.combined_filter().brightness, 130.0);
    }

    #[test]
    fn open_image_resets_everything() {
        let mut s = session();
        s.set_adjustment(AdjustmentField::Blur, 4.0);
        s.add_layer(LayerKind::Text);
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_move(Point::new(20.0, 20.0));
        s.pointer_up();
        s.open_image("/photos/b.jpg", 100, 100);
        assert!(s.adjustments().is_default());
        assert!(s.layers().is_empty());
        assert!(s.selection().is_none());
        assert!(!s.history().can_undo());
        assert_eq!(s.image_path(), Some(Path::new("/photos/b.jpg")));
    }

    #[test]
    fn apply_selection_as_mask_moves_selection_to_layer() {
        let mut s = session();
        let id = s.add_layer(LayerKind::Adjustments);
        s.set_tool(SelectionTool::Rect);
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_move(Point::new(50.0, 50.0));
        s.pointer_up();
        assert!(s.apply_selection_as_mask());
        assert!(s.selection().is_none());
        assert!(s.layer(&id).unwrap().mask.is_some());
        assert_eq!(s.history().undo_len(), 2);

        assert!(!s.apply_selection_as_mask());
    }

    #[test]
    fn apply_mask_without_layer_is_noop() {
        let mut s = session();
        s.pointer_down(Point::new(10.0, 10.0));
        s.pointer_move(Point::new(50.0, 50.0));
        s.pointer_up();
        assert!(!s.apply_selection_as_mask());
        assert!(s.selection().is_some());
    }

    #[test]
    fn remove_selected_layer_clears_selection() {
        let mut s = session();
        let id = s.add_layer(LayerKind::Text);
        assert!(s.remove_layer(&id, true));
        assert_eq!(s.selected_layer_id(), None);
        assert!(s.undo());
        assert_eq!(s.selected_layer_id(), Some(id.as_str()));
    }

    #[test]
    fn select_layer_validates_id() {
        let mut s = session();
        let id = s.add_layer(LayerKind::Text);
        assert!(s.select_layer(None));
        assert_eq!(s.selected_layer_id(), None);
        assert!(!s.select_layer(Some("missing")));
        assert!(s.select_layer(Some(&id)));
    }

    #[test]
    fn fill_request_validates_inputs() {
        let mut s = session();
        let err = s.fill_request("  ").unwrap_err();
        assert_eq!(err.to_string(), "Need a prompt");

        let err = s.fill_request("a red door").unwrap_err();
        assert!(err.to_string().contains("selection"));

        s.pointer_down(Point::new(0.0, 0.0));
        s.pointer_move(Point::new(50.0, 100.0));
        s.pointer_up();
        let fill = s.fill_request("a red door").unwrap();
        assert_eq!(fill.prompt, "a red door");
        assert_eq!(fill.image_path, PathBuf::from("/photos/a.jpg"));
        let decoded = image::load_from_memory(&fill.mask_png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 200));
        assert!(s.selection().is_none());
    }
}
