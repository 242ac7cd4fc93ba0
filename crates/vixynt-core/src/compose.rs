use serde::{Deserialize, Serialize};

use crate::adjustments::Adjustments;
use crate::layer::{Layer, LayerParams};

/// The rendering filter handed to the host view.
///
/// These six numbers are the whole contract with the renderer: base
/// adjustments plus every visible adjustment layer, reduced to CSS-style
/// filter functions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombinedFilter {
    /// Percent, 100 = unchanged.
    pub brightness: f32,
    /// Percent, 100 = unchanged.
    pub contrast: f32,
    /// Percent, 100 = unchanged.
    pub saturate: f32,
    /// Percent, 0 = unchanged.
    pub sepia: f32,
    /// Degrees.
    pub hue_rotate: f32,
    /// Pixels.
    pub blur: f32,
}

impl CombinedFilter {
    pub fn to_css(&self) -> String {
        format!(
            "brightness({}%) contrast({}%) saturate({}%) sepia({}%) hue-rotate({}deg) blur({}px)",
            self.brightness, self.contrast, self.saturate, self.sepia, self.hue_rotate, self.blur
        )
    }
}

/// Sum the base adjustments with every visible adjustment layer.
///
/// Accumulation is plain addition, independent of stack order: a hidden
/// layer contributes nothing but does not affect the layers around it.
pub fn accumulate(base: &Adjustments, layers: &[Layer]) -> Adjustments {
    let mut total = base.clone();
    for layer in layers.iter().filter(|l| l.visible) {
        if let LayerParams::Adjustments(params) = &layer.params {
            total.exposure += params.exposure;
            total.contrast += params.contrast;
            total.highlights += params.highlights;
            total.shadows += params.shadows;
            total.whites += params.whites;
            total.blacks += params.blacks;
            total.saturation += params.saturation;
            total.warmth += params.warmth;
            total.tint += params.tint;
            total.pop += params.pop;
            total.vignette += params.vignette;
        }
    }
    total
}

pub fn combined_filter(base: &Adjustments, layers: &[Layer]) -> CombinedFilter {
    let c = accumulate(base, layers);
    CombinedFilter {
        brightness: 100.0 + c.exposure + c.whites / 2.5 - c.shadows / 2.5,
        contrast: 100.0 + c.contrast + c.pop / 2.0 + c.highlights / 2.5 - c.shadows / 2.5,
        saturate: c.saturation + c.pop,
        sepia: c.warmth.max(0.0) / 2.0,
        hue_rotate: c.tint,
        blur: c.blur,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustments::AdjustmentField;
    use crate::layer::{LayerKind, LayerParamsPatch, LayerStack};

    fn adjustment_layer(stack: &mut LayerStack, values: Vec<(AdjustmentField, f32)>) -> String {
        let id = stack.push(LayerKind::Adjustments).id.clone();
        let layer = stack.get_mut(&id).unwrap();
        layer.params.merge(&LayerParamsPatch::Adjustments(values));
        id
    }

    #[test]
    fn defaults_are_identity() {
        let f = combined_filter(&Adjustments::default(), &[]);
        assert_eq!(
            f,
            CombinedFilter {
                brightness: 100.0,
                contrast: 100.0,
                saturate: 100.0,
                sepia: 0.0,
                hue_rotate: 0.0,
                blur: 0.0,
            }
        );
    }

    #[test]
    fn exposure_from_base_and_layer_add_up() {
        let mut stack = LayerStack::new();
        adjustment_layer(&mut stack, vec![(AdjustmentField::Exposure, 20.0)]);
        let base = Adjustments {
            exposure: 10.0,
            ..Default::default()
        };
        let f = combined_filter(&base, stack.layers());
        assert_eq!(f.brightness, 130.0);
    }

    #[test]
    fn hidden_layers_are_skipped() {
        let mut stack = LayerStack::new();
        let hidden = adjustment_layer(&mut stack, vec![(AdjustmentField::Exposure, 50.0)]);
        adjustment_layer(&mut stack, vec![(AdjustmentField::Exposure, 5.0)]);
        stack.get_mut(&hidden).unwrap().visible = false;
        let f = combined_filter(&Adjustments::default(), stack.layers());
        assert_eq!(f.brightness, 105.0);
    }

    #[test]
    fn non_adjustment_layers_do_not_contribute() {
        let mut stack = LayerStack::new();
        stack.push(LayerKind::Text);
        stack.push(LayerKind::Transform);
        let f = combined_filter(&Adjustments::default(), stack.layers());
        assert_eq!(f.brightness, 100.0);
        assert_eq!(f.saturate, 100.0);
    }

    #[test]
    fn order_does_not_matter() {
        let mut a = LayerStack::new();
        let first = adjustment_layer(&mut a, vec![(AdjustmentField::Contrast, 10.0)]);
        adjustment_layer(&mut a, vec![(AdjustmentField::Contrast, -4.0)]);
        let before = combined_filter(&Adjustments::default(), a.layers());
        a.move_to(&first, 1);
        let after = combined_filter(&Adjustments::default(), a.layers());
        assert_eq!(before, after);
        assert_eq!(after.contrast, 106.0);
    }

    #[test]
    fn formula_coefficients() {
        let base = Adjustments {
            exposure: 5.0,
            contrast: 10.0,
            highlights: 25.0,
            shadows: 10.0,
            whites: 50.0,
            saturation: 80.0,
            warmth: 30.0,
            tint: -15.0,
            pop: 20.0,
            blur: 3.0,
            ..Default::default()
        };
        let f = combined_filter(&base, &[]);
        assert_eq!(f.brightness, 100.0 + 5.0 + 20.0 - 4.0);
        assert_eq!(f.contrast, 100.0 + 10.0 + 10.0 + 10.0 - 4.0);
        assert_eq!(f.saturate, 100.0);
        assert_eq!(f.sepia, 15.0);
        assert_eq!(f.hue_rotate, -15.0);
        assert_eq!(f.blur, 3.0);
    }

    #[test]
    fn negative_warmth_has_no_sepia() {
        let base = Adjustments {
            warmth: -40.0,
            ..Default::default()
        };
        assert_eq!(combined_filter(&base, &[]).sepia, 0.0);
    }

    #[test]
    fn css_rendering() {
        let f = combined_filter(&Adjustments::default(), &[]);
        assert_eq!(
            f.to_css(),
            "brightness(100%) contrast(100%) saturate(100%) sepia(0%) hue-rotate(0deg) blur(0px)"
        );
    }
}
