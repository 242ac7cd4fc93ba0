use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Base non-destructive adjustments for the open image.
///
/// Every field except `saturation` is a delta around 0. Saturation is a
/// percentage with 100 as the neutral value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Adjustments {
    pub exposure: f32,
    pub contrast: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub whites: f32,
    pub blacks: f32,
    /// Percentage, 100 = unchanged.
    pub saturation: f32,
    pub warmth: f32,
    pub tint: f32,
    pub pop: f32,
    pub vignette: f32,
    /// Gaussian blur radius in pixels.
    pub blur: f32,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            contrast: 0.0,
            highlights: 0.0,
            shadows: 0.0,
            whites: 0.0,
            blacks: 0.0,
            saturation: 100.0,
            warmth: 0.0,
            tint: 0.0,
            pop: 0.0,
            vignette: 0.0,
            blur: 0.0,
        }
    }
}

/// Key for a single slider in [`Adjustments`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentField {
    Exposure,
    Contrast,
    Highlights,
    Shadows,
    Whites,
    Blacks,
    Saturation,
    Warmth,
    Tint,
    Pop,
    Vignette,
    Blur,
}

impl AdjustmentField {
    pub const ALL: [AdjustmentField; 12] = [
        Self::Exposure,
        Self::Contrast,
        Self::Highlights,
        Self::Shadows,
        Self::Whites,
        Self::Blacks,
        Self::Saturation,
        Self::Warmth,
        Self::Tint,
        Self::Pop,
        Self::Vignette,
        Self::Blur,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Exposure => "exposure",
            Self::Contrast => "contrast",
            Self::Highlights => "highlights",
            Self::Shadows => "shadows",
            Self::Whites => "whites",
            Self::Blacks => "blacks",
            Self::Saturation => "saturation",
            Self::Warmth => "warmth",
            Self::Tint => "tint",
            Self::Pop => "pop",
            Self::Vignette => "vignette",
            Self::Blur => "blur",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Slider range offered to the user for this field.
    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            Self::Saturation => 0.0..=200.0,
            Self::Pop | Self::Vignette => 0.0..=100.0,
            Self::Blur => 0.0..=20.0,
            _ => -100.0..=100.0,
        }
    }
}

impl Adjustments {
    pub fn get(&self, field: AdjustmentField) -> f32 {
        match field {
            AdjustmentField::Exposure => self.exposure,
            AdjustmentField::Contrast => self.contrast,
            AdjustmentField::Highlights => self.highlights,
            AdjustmentField::Shadows => self.shadows,
            AdjustmentField::Whites => self.whites,
            AdjustmentField::Blacks => self.blacks,
            AdjustmentField::Saturation => self.saturation,
            AdjustmentField::Warmth => self.warmth,
            AdjustmentField::Tint => self.tint,
            AdjustmentField::Pop => self.pop,
            AdjustmentField::Vignette => self.vignette,
            AdjustmentField::Blur => self.blur,
        }
    }

    /// Set a single field. Values are stored as given; accumulated totals may
    /// legitimately leave the slider range.
    pub fn set(&mut self, field: AdjustmentField, value: f32) {
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
            AdjustmentField::Blur => &mut self.blur,
        };
        *slot = value;
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_neutral() {
        let a = Adjustments::default();
        assert_eq!(a.saturation, 100.0);
        for field in AdjustmentField::ALL {
            if field != AdjustmentField::Saturation {
                assert_eq!(a.get(field), 0.0, "{} should default to 0", field.name());
            }
        }
        assert!(a.is_default());
    }

    #[test]
    fn set_and_get_every_field() {
        let mut a = Adjustments::default();
        for (i, field) in AdjustmentField::ALL.into_iter().enumerate() {
            a.set(field, i as f32 + 1.0);
        }
        for (i, field) in AdjustmentField::ALL.into_iter().enumerate() {
            assert_eq!(a.get(field), i as f32 + 1.0);
        }
        assert!(!a.is_default());
    }

    #[test]
    fn field_names_round_trip() {
        for field in AdjustmentField::ALL {
            assert_eq!(AdjustmentField::from_name(field.name()), Some(field));
        }
        assert_eq!(AdjustmentField::from_name("clarity"), None);
    }

    #[test]
    fn slider_ranges() {
        assert_eq!(AdjustmentField::Saturation.range(), 0.0..=200.0);
        assert_eq!(AdjustmentField::Blur.range(), 0.0..=20.0);
        assert_eq!(AdjustmentField::Pop.range(), 0.0..=100.0);
        assert_eq!(AdjustmentField::Exposure.range(), -100.0..=100.0);
    }

    #[test]
    fn set_does_not_clamp() {
        let mut a = Adjustments::default();
        a.set(AdjustmentField::Exposure, 250.0);
        assert_eq!(a.exposure, 250.0);
    }

    #[test]
    fn serialization_roundtrip() {
        let a = Adjustments {
            exposure: 12.5,
            warmth: -30.0,
            ..Default::default()
        };
        let json = serde_json::to_string(&a).unwrap();
        let back: Adjustments = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
