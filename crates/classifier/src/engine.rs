//! Classification of features into colour classes.
//!
//! Classification is a pure function of a feature's numbers, the active
//! statistic descriptor, the boundary level's suppression threshold and, in
//! gradient mode, the range observed over the current response.

use census_common::{BoundaryLevel, Classification, Color, Feature, FeatureBatch, StatDescriptor};
use serde::Serialize;
use tracing::debug;

use crate::breaks::{classify, ClassIndex};
use crate::error::ClassifierError;
use crate::gradient::ValueRange;
use crate::legend::Legend;
use crate::palette::Palette;
use crate::suppression::{SuppressionStrategy, Treatment};

/// Result of classifying one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ColorClass {
    /// Fixed-breaks class index
    Class(ClassIndex),
    /// Interpolated gradient colour
    Colour(Color),
    /// Population at or under the level threshold
    LowPopulation,
    /// Missing or non-finite value
    NoData,
}

impl ColorClass {
    pub fn class_index(&self) -> Option<ClassIndex> {
        match self {
            ColorClass::Class(c) => Some(*c),
            _ => None,
        }
    }
}

/// Everything classification needs besides the feature itself.
#[derive(Debug, Clone, Copy)]
pub struct ClassParams<'a> {
    pub descriptor: &'a StatDescriptor,
    pub level: &'a BoundaryLevel,
    /// Observed range; only read in gradient mode
    pub range: Option<ValueRange>,
}

/// One response's features classified, in batch order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedBatch {
    pub classes: Vec<ColorClass>,
    pub range: Option<ValueRange>,
    pub legend: Legend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationEngine {
    palette: Palette,
    suppression: SuppressionStrategy,
}

impl ClassificationEngine {
    pub fn new(palette: Palette, suppression: SuppressionStrategy) -> Result<Self, ClassifierError> {
        palette.validate()?;
        suppression.validate()?;
        Ok(Self {
            palette,
            suppression,
        })
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn suppression(&self) -> SuppressionStrategy {
        self.suppression
    }

    pub fn classify(&self, feature: &Feature, params: &ClassParams<'_>) -> ColorClass {
        let value = params.descriptor.map_type.metric(feature);
        self.classify_value(value, feature.population, params)
    }

    pub fn classify_value(
        &self,
        value: Option<f64>,
        population: Option<f64>,
        params: &ClassParams<'_>,
    ) -> ColorClass {
        if population.is_some_and(|p| p <= 0.0) {
            return ColorClass::LowPopulation;
        }
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return ColorClass::NoData;
        };

        let treatment = self.suppression.treatment(
            population,
            params.level,
            &params.descriptor.classification,
        );

        match &params.descriptor.classification {
            Classification::Breaks { breaks } => {
                let class = classify(value, breaks);
                match treatment {
                    Treatment::Normal => ColorClass::Class(class),
                    Treatment::Shift(margin) => ColorClass::Class(class.shifted_down(margin)),
                    Treatment::Sentinel => ColorClass::LowPopulation,
                }
            }
            Classification::Gradient => {
                if treatment != Treatment::Normal {
                    return ColorClass::LowPopulation;
                }
                match params.range {
                    Some(range) => ColorClass::Colour(self.palette.gradient(range.position(value))),
                    None => ColorClass::NoData,
                }
            }
        }
    }

    /// Classify a whole response.
    ///
    /// In gradient mode the range is rebuilt from this batch alone.
    pub fn classify_batch(
        &self,
        batch: &FeatureBatch,
        descriptor: &StatDescriptor,
        level: &BoundaryLevel,
    ) -> ClassifiedBatch {
        let range = if descriptor.classification.is_gradient() {
            ValueRange::observe(batch, descriptor.map_type, level)
        } else {
            None
        };

        let params = ClassParams {
            descriptor,
            level,
            range,
        };
        let classes: Vec<ColorClass> = batch.iter().map(|f| self.classify(f, &params)).collect();

        debug!(
            stat = %descriptor.id,
            level = %level.level_id,
            features = batch.len(),
            suppressed = classes.iter().filter(|c| **c == ColorClass::LowPopulation).count(),
            range = ?range,
            "Classified batch"
        );

        ClassifiedBatch {
            classes,
            range,
            legend: self.legend(descriptor, range),
        }
    }

    /// The fill colour for a classification result.
    pub fn fill(&self, class: &ColorClass) -> Color {
        match class {
            ColorClass::Class(index) => self.palette.class_colour(*index).clone(),
            ColorClass::Colour(colour) => colour.clone(),
            ColorClass::LowPopulation => self.palette.low_population.clone(),
            ColorClass::NoData => self.palette.no_data.clone(),
        }
    }

    pub fn legend(&self, descriptor: &StatDescriptor, range: Option<ValueRange>) -> Legend {
        Legend::for_stat(descriptor, &self.palette, range)
    }
}

impl Default for ClassificationEngine {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            suppression: SuppressionStrategy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use census_common::{Breaks, MapType};

    fn descriptor(classification: Classification) -> StatDescriptor {
        StatDescriptor {
            id: "b3".into(),
            table: "g01".into(),
            description: String::new(),
            stat_type: String::new(),
            map_type: MapType::Values,
            classification,
        }
    }

    fn fixed() -> StatDescriptor {
        descriptor(Classification::Breaks {
            breaks: Breaks::new([10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0]).unwrap(),
        })
    }

    #[test]
    fn test_missing_value_is_no_data() {
        let engine = ClassificationEngine::default();
        let level = BoundaryLevel::new("sa2", 5.0);
        let d = fixed();
        let params = ClassParams {
            descriptor: &d,
            level: &level,
            range: None,
        };
        assert_eq!(engine.classify_value(None, Some(100.0), &params), ColorClass::NoData);
        assert_eq!(
            engine.classify_value(Some(f64::NAN), Some(100.0), &params),
            ColorClass::NoData
        );
    }

    #[test]
    fn test_zero_population_beats_missing_value() {
        let engine = ClassificationEngine::default();
        let level = BoundaryLevel::new("sa2", 0.0);
        let d = fixed();
        let params = ClassParams {
            descriptor: &d,
            level: &level,
            range: None,
        };
        assert_eq!(
            engine.classify_value(None, Some(0.0), &params),
            ColorClass::LowPopulation
        );
    }

    #[test]
    fn test_gradient_without_range_is_no_data() {
        let engine = ClassificationEngine::default();
        let level = BoundaryLevel::new("sa2", 5.0);
        let d = descriptor(Classification::Gradient);
        let params = ClassParams {
            descriptor: &d,
            level: &level,
            range: None,
        };
        assert_eq!(engine.classify_value(Some(3.0), Some(50.0), &params), ColorClass::NoData);
    }

    #[test]
    fn test_fill_uses_palette() {
        let engine = ClassificationEngine::default();
        assert_eq!(
            engine.fill(&ColorClass::Class(ClassIndex::LOWEST)),
            Color::hex("#f6d2a9")
        );
        assert_eq!(engine.fill(&ColorClass::LowPopulation), Color::hex("#4d4d4d"));
    }

    #[test]
    fn test_invalid_palette_rejected() {
        let palette = Palette {
            classes: vec![],
            ..Palette::default()
        };
        assert!(ClassificationEngine::new(palette, SuppressionStrategy::Sentinel).is_err());
    }
}
