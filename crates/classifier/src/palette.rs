//! Colours for classes, gradient endpoints and the sentinel treatments.

use census_common::Color;
use serde::{Deserialize, Serialize};

use crate::breaks::{ClassIndex, NUM_CLASSES};
use crate::error::ClassifierError;

fn default_classes() -> Vec<Color> {
    [
        "#f6d2a9", "#f5b78e", "#f19c7c", "#ea8171", "#dd686c", "#ca5268", "#b13f64",
    ]
    .into_iter()
    .map(Color::hex)
    .collect()
}

fn default_low_population() -> Color {
    Color::hex("#4d4d4d")
}

fn default_no_data() -> Color {
    Color::transparent()
}

/// Map theme colours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    /// One colour per class, lowest first
    #[serde(default = "default_classes")]
    pub classes: Vec<Color>,

    /// Gradient start; first class colour when absent
    #[serde(default)]
    pub gradient_low: Option<Color>,

    /// Gradient end; last class colour when absent
    #[serde(default)]
    pub gradient_high: Option<Color>,

    /// Sentinel for suppressed areas, distinct from the ramp
    #[serde(default = "default_low_population")]
    pub low_population: Color,

    /// Fill for features without a usable value
    #[serde(default = "default_no_data")]
    pub no_data: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            classes: default_classes(),
            gradient_low: None,
            gradient_high: None,
            low_population: default_low_population(),
            no_data: default_no_data(),
        }
    }
}

impl Palette {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.classes.len() != usize::from(NUM_CLASSES) {
            return Err(ClassifierError::InvalidPalette(format!(
                "expected {} class colours, got {}",
                NUM_CLASSES,
                self.classes.len()
            )));
        }

        let named = self
            .classes
            .iter()
            .chain(self.gradient_low.iter())
            .chain(self.gradient_high.iter())
            .chain([&self.low_population, &self.no_data]);
        for colour in named {
            if !colour.is_valid() {
                return Err(ClassifierError::InvalidPalette(format!(
                    "cannot decode colour {:?}",
                    colour
                )));
            }
        }

        if self.classes.contains(&self.low_population) {
            return Err(ClassifierError::InvalidPalette(
                "low population colour must differ from the class colours".into(),
            ));
        }
        Ok(())
    }

    pub fn class_colour(&self, class: ClassIndex) -> &Color {
        &self.classes[class.position()]
    }

    pub fn gradient_low(&self) -> &Color {
        self.gradient_low.as_ref().unwrap_or(&self.classes[0])
    }

    pub fn gradient_high(&self) -> &Color {
        self.gradient_high
            .as_ref()
            .unwrap_or(&self.classes[self.classes.len() - 1])
    }

    /// Colour at position `t` in [0, 1] between the gradient endpoints.
    pub fn gradient(&self, t: f64) -> Color {
        self.gradient_low().lerp(self.gradient_high(), t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette_is_valid() {
        let palette = Palette::default();
        palette.validate().unwrap();
        assert_eq!(palette.gradient_low(), &Color::hex("#f6d2a9"));
        assert_eq!(palette.gradient_high(), &Color::hex("#b13f64"));
        assert_eq!(palette.class_colour(ClassIndex::HIGHEST), &Color::hex("#b13f64"));
    }

    #[test]
    fn test_wrong_class_count() {
        let palette = Palette {
            classes: vec![Color::hex("#000000"); 5],
            ..Palette::default()
        };
        assert!(matches!(
            palette.validate(),
            Err(ClassifierError::InvalidPalette(_))
        ));
    }

    #[test]
    fn test_sentinel_must_be_distinct() {
        let palette = Palette {
            low_population: Color::hex("#f6d2a9"),
            ..Palette::default()
        };
        assert!(palette.validate().is_err());
    }
}
