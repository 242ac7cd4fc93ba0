use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adjustments::AdjustmentField;
use crate::selection::Selection;

pub type LayerId = String;

/// The closed set of layer kinds the darkroom can stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerKind {
    Adjustments,
    Text,
    Transform,
    GenerativeFill,
}

impl LayerKind {
    pub const ALL: [LayerKind; 4] = [
        Self::Adjustments,
        Self::Text,
        Self::Transform,
        Self::GenerativeFill,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Adjustments => "Adjustments",
            Self::Text => "Text",
            Self::Transform => "Transform",
            Self::GenerativeFill => "Generative Fill",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Adjustments => "ADJUSTMENTS",
            Self::Text => "TEXT",
            Self::Transform => "TRANSFORM",
            Self::GenerativeFill => "GENERATIVE_FILL",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

/// Per-layer adjustment deltas, summed on top of the base adjustments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentParams {
    pub exposure: f32,
    pub contrast: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub whites: f32,
    pub blacks: f32,
    pub saturation: f32,
    pub warmth: f32,
    pub tint: f32,
    pub pop: f32,
    pub vignette: f32,
}

impl AdjustmentParams {
    /// Fields an adjustment layer carries. Blur only exists on the base.
    pub const FIELDS: [AdjustmentField; 11] = [
        AdjustmentField::Exposure,
        AdjustmentField::Contrast,
        AdjustmentField::Highlights,
        AdjustmentField::Shadows,
        AdjustmentField::Whites,
        AdjustmentField::Blacks,
        AdjustmentField::Saturation,
        AdjustmentField::Warmth,
        AdjustmentField::Tint,
        AdjustmentField::Pop,
        AdjustmentField::Vignette,
    ];

    pub fn get(&self, field: AdjustmentField) -> Option<f32> {
        self.slot(field).map(|v| *v)
    }

    fn slot(&self, field: AdjustmentField) -> Option<&f32> {
        Some(match field {
            AdjustmentField::Exposure => &self.exposure,
            AdjustmentField::Contrast => &self.contrast,
            AdjustmentField::Highlights => &self.highlights,
            AdjustmentField::Shadows => &self.shadows,
            AdjustmentField::Whites => &self.whites,
            AdjustmentField::Blacks => &self.blacks,
            AdjustmentField::Saturation => &self.saturation,
            AdjustmentField::Warmth => &self.warmth,
            AdjustmentField::Tint => &self.tint,
            AdjustmentField::Pop => &self.pop,
            AdjustmentField::Vignette => &self.vignette,
            AdjustmentField::Blur => return None,
        })
    }

    fn set(&mut self, field: AdjustmentField, value: f32) -> bool {
        let slot = match field {
            AdjustmentField::Exposure => &mut self.exposure,
            AdjustmentField::Contrast => &mut self.contrast,
            AdjustmentField::Highlights => &mut self.highlights,
            AdjustmentField::Shadows => &mut self.shadows,
            AdjustmentField::Whites => &mut self.whites,
            AdjustmentField::Blacks => &mut self.blacks,
            AdjustmentField::Saturation => &mut self.saturation,
            AdjustmentField::Warmth => &mut self.warmth,
            AdjustmentField::Tint => &mut self.tint,
            AdjustmentField::Pop => &mut self.pop,
            AdjustmentField::Vignette => &mut self.vignette,
            AdjustmentField::Blur => return false,
        };
        *slot = value;
        true
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextParams {
    pub content: String,
    pub font: String,
    pub size: f32,
    pub color: String,
    pub x: f32,
    pub y: f32,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            content: "Hello World".into(),
            font: "Arial".into(),
            size: 50.0,
            color: "#FFFFFF".into(),
            x: 100.0,
            y: 100.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformParams {
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FillParams {
    pub prompt: String,
}

/// Type-specific layer parameters. The variant doubles as the layer kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerParams {
    Adjustments(AdjustmentParams),
    Text(TextParams),
    Transform(TransformParams),
    GenerativeFill(FillParams),
}

impl LayerParams {
    pub fn defaults(kind: LayerKind) -> Self {
        match kind {
            LayerKind::Adjustments => Self::Adjustments(AdjustmentParams::default()),
            LayerKind::Text => Self::Text(TextParams::default()),
            LayerKind::Transform => Self::Transform(TransformParams::default()),
            LayerKind::GenerativeFill => Self::GenerativeFill(FillParams::default()),
        }
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Adjustments(_) => LayerKind::Adjustments,
            Self::Text(_) => LayerKind::Text,
            Self::Transform(_) => LayerKind::Transform,
            Self::GenerativeFill(_) => LayerKind::GenerativeFill,
        }
    }

    /// Shallow-merge `patch` into these params. Returns false when the patch
    /// targets a different layer kind.
    pub fn merge(&mut self, patch: &LayerParamsPatch) -> bool {
        match (self, patch) {
            (Self::Adjustments(p), LayerParamsPatch::Adjustments(values)) => {
                for &(field, value) in values {
                    p.set(field, value);
                }
                true
            }
            (Self::Text(p), LayerParamsPatch::Text(patch)) => {
                merge_field(&mut p.content, &patch.content);
                merge_field(&mut p.font, &patch.font);
                merge_field(&mut p.size, &patch.size);
                merge_field(&mut p.color, &patch.color);
                merge_field(&mut p.x, &patch.x);
                merge_field(&mut p.y, &patch.y);
                true
            }
            (Self::Transform(p), LayerParamsPatch::Transform(patch)) => {
                merge_field(&mut p.rotation, &patch.rotation);
                merge_field(&mut p.scale_x, &patch.scale_x);
                merge_field(&mut p.scale_y, &patch.scale_y);
                true
            }
            (Self::GenerativeFill(p), LayerParamsPatch::GenerativeFill(patch)) => {
                merge_field(&mut p.prompt, &patch.prompt);
                true
            }
            _ => false,
        }
    }
}

pub(crate) fn merge_field<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextParamsPatch {
    pub content: Option<String>,
    pub font: Option<String>,
    pub size: Option<f32>,
    pub color: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformParamsPatch {
    pub rotation: Option<f32>,
    pub scale_x: Option<f32>,
    pub scale_y: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FillParamsPatch {
    pub prompt: Option<String>,
}

/// Partial update for [`LayerParams`]; only present keys overwrite.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerParamsPatch {
    Adjustments(Vec<(AdjustmentField, f32)>),
    Text(TextParamsPatch),
    Transform(TransformParamsPatch),
    GenerativeFill(FillParamsPatch),
}

/// Placement of a layer relative to the image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub rotation: Option<f32>,
    pub scale_x: Option<f32>,
    pub scale_y: Option<f32>,
}

impl Transform {
    pub fn merge(&mut self, patch: &TransformPatch) {
        merge_field(&mut self.x, &patch.x);
        merge_field(&mut self.y, &patch.y);
        merge_field(&mut self.rotation, &patch.rotation);
        merge_field(&mut self.scale_x, &patch.scale_x);
        merge_field(&mut self.scale_y, &patch.scale_y);
    }
}

/// Partial update for the top-level layer fields. `mask: Some(None)` clears
/// the mask.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerPatch {
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub mask: Option<Option<Selection>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    #[serde(flatten)]
    pub params: LayerParams,
    pub transform: Transform,
    pub mask: Option<Selection>,
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        self.params.kind()
    }

    pub fn merge(&mut self, patch: &LayerPatch) {
        merge_field(&mut self.name, &patch.name);
        merge_field(&mut self.visible, &patch.visible);
        merge_field(&mut self.mask, &patch.mask);
    }
}

/// Ordered layer stack; index 0 is painted first (bottom).
#[derive(Clone, Debug, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
    next_id: u64,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer of `kind` with default params on top of the stack.
    pub fn push(&mut self, kind: LayerKind) -> &Layer {
        self.next_id += 1;
        let layer = Layer {
            id: format!("layer_{}", self.next_id),
            name: kind.display_name().to_string(),
            visible: true,
            params: LayerParams::defaults(kind),
            transform: Transform::default(),
            mask: None,
        };
        debug!(id = %layer.id, kind = kind.tag(), "layer added");
        self.layers.push(layer);
        &self.layers[self.layers.len() - 1]
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: &str) -> Option<Layer> {
        let idx = self.layers.iter().position(|l| l.id == id)?;
        Some(self.layers.remove(idx))
    }

    /// Move a layer to `index` (clamped to the top). Returns false if the id
    /// is unknown.
    pub fn move_to(&mut self, id: &str, index: usize) -> bool {
        let Some(from) = self.layers.iter().position(|l| l.id == id) else {
            return false;
        };
        let layer = self.layers.remove(from);
        let to = index.min(self.layers.len());
        self.layers.insert(to, layer);
        true
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Replace the contents wholesale, e.g. when restoring history. The id
    /// counter is kept so restored stacks never collide with new layers.
    pub fn replace(&mut self, layers: Vec<Layer>) {
        self.layers = layers;
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_uses_kind_defaults() {
        let mut stack = LayerStack::new();
        let layer = stack.push(LayerKind::Text).clone();
        assert_eq!(layer.name, "Text");
        assert!(layer.visible);
        assert!(layer.mask.is_none());
        assert_eq!(layer.transform, Transform::default());
        match layer.params {
            LayerParams::Text(p) => {
                assert_eq!(p.content, "Hello World");
                assert_eq!(p.size, 50.0);
            }
            other => panic!("expected text params, got {other:?}"),
        }
    }

    #[test]
    fn ids_are_unique_and_ordered() {
        let mut stack = LayerStack::new();
        let a = stack.push(LayerKind::Adjustments).id.clone();
        let b = stack.push(LayerKind::Transform).id.clone();
        assert_ne!(a, b);
        assert_eq!(stack.layers()[0].id, a);
        assert_eq!(stack.layers()[1].id, b);
    }

    #[test]
    fn ids_stay_unique_after_replace() {
        let mut stack = LayerStack::new();
        let a = stack.push(LayerKind::Adjustments).id.clone();
        stack.replace(Vec::new());
        let b = stack.push(LayerKind::Adjustments).id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn tags_round_trip() {
        for kind in LayerKind::ALL {
            assert_eq!(LayerKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(LayerKind::from_tag("CURVES"), None);
    }

    #[test]
    fn shallow_merge_keeps_unpatched_keys() {
        let mut params = LayerParams::defaults(LayerKind::Text);
        let patch = LayerParamsPatch::Text(TextParamsPatch {
            content: Some("Sale".into()),
            size: Some(72.0),
            ..Default::default()
        });
        assert!(params.merge(&patch));
        let LayerParams::Text(p) = params else {
            unreachable!()
        };
        assert_eq!(p.content, "Sale");
        assert_eq!(p.size, 72.0);
        assert_eq!(p.font, "Arial");
        assert_eq!(p.color, "#FFFFFF");
    }

    #[test]
    fn merge_rejects_mismatched_kind() {
        let mut params = LayerParams::defaults(LayerKind::Transform);
        let before = params.clone();
        let patch = LayerParamsPatch::Adjustments(vec![(AdjustmentField::Exposure, 5.0)]);
        assert!(!params.merge(&patch));
        assert_eq!(params, before);
    }

    #[test]
    fn adjustment_layers_ignore_blur() {
        let mut params = LayerParams::defaults(LayerKind::Adjustments);
        params.merge(&LayerParamsPatch::Adjustments(vec![
            (AdjustmentField::Blur, 9.0),
            (AdjustmentField::Pop, 4.0),
        ]));
        let LayerParams::Adjustments(p) = params else {
            unreachable!()
        };
        assert_eq!(p.pop, 4.0);
        assert_eq!(p.get(AdjustmentField::Blur), None);
    }

    #[test]
    fn transform_merge() {
        let mut t = Transform::default();
        t.merge(&TransformPatch {
            x: Some(12.0),
            rotation: Some(90.0),
            ..Default::default()
        });
        assert_eq!(t.x, 12.0);
        assert_eq!(t.rotation, 90.0);
        assert_eq!(t.scale_x, 1.0);
    }

    #[test]
    fn layer_patch_can_clear_mask() {
        let mut stack = LayerStack::new();
        let id = stack.push(LayerKind::Adjustments).id.clone();
        let layer = stack.get_mut(&id).unwrap();
        layer.merge(&LayerPatch {
            mask: Some(Some(Selection::Rect {
                x1: 0.0,
                y1: 0.0,
                x2: 1.0,
                y2: 1.0,
            })),
            ..Default::default()
        });
        assert!(layer.mask.is_some());
        layer.merge(&LayerPatch {
            visible: Some(false),
            ..Default::default()
        });
        assert!(layer.mask.is_some());
        assert!(!layer.visible);
        layer.merge(&LayerPatch {
            mask: Some(None),
            ..Default::default()
        });
        assert!(layer.mask.is_none());
    }

    #[test]
    fn move_and_remove() {
        let mut stack = LayerStack::new();
        let a = stack.push(LayerKind::Adjustments).id.clone();
        let b = stack.push(LayerKind::Text).id.clone();
        let c = stack.push(LayerKind::Transform).id.clone();

        assert!(stack.move_to(&c, 0));
        let order: Vec<_> = stack.layers().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(order, vec![c.as_str(), a.as_str(), b.as_str()]);

        assert!(stack.move_to(&c, 99));
        assert_eq!(stack.layers()[2].id, c);

        assert!(stack.remove(&a).is_some());
        assert!(stack.remove(&a).is_none());
        assert_eq!(stack.len(), 2);
        assert!(!stack.move_to("missing", 0));
    }

    #[test]
    fn layer_json_shape() {
        let mut stack = LayerStack::new();
        let layer = stack.push(LayerKind::GenerativeFill).clone();
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["type"], "GENERATIVE_FILL");
        assert_eq!(json["params"]["prompt"], "");
        let back: Layer = serde_json::from_value(json).unwrap();
        assert_eq!(back, layer);
    }

    #[test]
    fn transform_keys_are_camel_case() {
        let mut stack = LayerStack::new();
        let layer = stack.push(LayerKind::Transform).clone();
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["params"]["scaleX"], 1.0);
        assert_eq!(json["params"]["scaleY"], 1.0);
        assert_eq!(json["transform"]["scaleX"], 1.0);
        assert!(json["transform"].get("scale_x").is_none());
        let back: Layer = serde_json::from_value(json).unwrap();
        assert_eq!(back, layer);
    }
}
