//! Observed value ranges for continuous-gradient classification.

use census_common::{BoundaryLevel, Feature, MapType};
use serde::{Deserialize, Serialize};

/// Percentages above this are upstream rounding noise.
pub const PERCENT_CEILING: f64 = 100.0;

/// Min/max of one response's included values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Scan a batch for the min/max of the number `map_type` selects.
    ///
    /// Features under the level's suppression threshold and features without a
    /// finite number are skipped. Percent maxima are clamped to 100.
    /// Returns `None` when nothing is left to scan.
    pub fn observe<'a>(
        features: impl IntoIterator<Item = &'a Feature>,
        map_type: MapType,
        level: &BoundaryLevel,
    ) -> Option<Self> {
        let mut range: Option<ValueRange> = None;

        for feature in features {
            if level.suppresses(feature.population) {
                continue;
            }
            let Some(value) = map_type.metric(feature) else {
                continue;
            };
            range = Some(match range {
                Some(r) => ValueRange {
                    min: r.min.min(value),
                    max: r.max.max(value),
                },
                None => ValueRange {
                    min: value,
                    max: value,
                },
            });
        }

        range.map(|r| match map_type {
            MapType::Percent => {
                let max = r.max.min(PERCENT_CEILING);
                ValueRange {
                    min: r.min.min(max),
                    max,
                }
            }
            _ => r,
        })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Position of `value` along the range in [0, 1].
    pub fn position(&self, value: f64) -> f64 {
        let span = self.span();
        if span.abs() < f64::EPSILON {
            0.5
        } else {
            ((value - self.min) / span).clamp(0.0, 1.0)
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}
