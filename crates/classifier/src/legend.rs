//! Structured legend data handed to the UI collaborator.

use census_common::{Breaks, Classification, Color, MapType, StatDescriptor};
use serde::Serialize;

use crate::breaks::ClassIndex;
use crate::gradient::ValueRange;
use crate::palette::Palette;

/// One row of a fixed-breaks legend.
///
/// `lower` is exclusive and `upper` inclusive. The top class also holds
/// values above its `upper`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub class: ClassIndex,
    pub colour: Color,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Legend {
    Breaks {
        stat_id: String,
        breaks: Breaks,
        entries: Vec<LegendEntry>,
        low_population: Color,
    },
    Gradient {
        stat_id: String,
        min: f64,
        max: f64,
        low: Color,
        high: Color,
        low_population: Color,
    },
    /// Gradient statistic whose response had nothing to scale by.
    Unscaled {
        stat_id: String,
        low_population: Color,
    },
}

impl Legend {
    pub fn for_stat(descriptor: &StatDescriptor, palette: &Palette, range: Option<ValueRange>) -> Self {
        let stat_id = descriptor.id.clone();
        let low_population = palette.low_population.clone();

        match (&descriptor.classification, range) {
            (Classification::Breaks { breaks }, _) => Legend::Breaks {
                stat_id,
                breaks: *breaks,
                entries: entries(breaks, palette, descriptor.map_type),
                low_population,
            },
            (Classification::Gradient, Some(range)) => Legend::Gradient {
                stat_id,
                min: range.min,
                max: range.max,
                low: palette.gradient_low().clone(),
                high: palette.gradient_high().clone(),
                low_population,
            },
            (Classification::Gradient, None) => Legend::Unscaled {
                stat_id,
                low_population,
            },
        }
    }

    pub fn stat_id(&self) -> &str {
        match self {
            Legend::Breaks { stat_id, .. }
            | Legend::Gradient { stat_id, .. }
            | Legend::Unscaled { stat_id, .. } => stat_id,
        }
    }

    /// The `{min, max}` tuple of a gradient legend.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self {
            Legend::Gradient { min, max, .. } => Some((*min, *max)),
            _ => None,
        }
    }
}

fn entries(breaks: &Breaks, palette: &Palette, map_type: MapType) -> Vec<LegendEntry> {
    let b = breaks.as_slice();
    ClassIndex::all()
        .map(|class| {
            let i = class.position();
            let lower = (i > 0).then(|| b[i - 1]);
            let upper = Some(b[i]);
            let label = match (i, lower) {
                (0, _) | (_, None) => format!("<= {}", format_value(b[0], map_type)),
                (6, Some(lo)) => format!("> {}", format_value(lo, map_type)),
                (_, Some(lo)) => format!(
                    "{} - {}",
                    format_value(lo, map_type),
                    format_value(b[i], map_type)
                ),
            };
            LegendEntry {
                class,
                colour: palette.class_colour(class).clone(),
                lower,
                upper,
                label,
            }
        })
        .collect()
}

/// Plain-text number for legend labels.
pub fn format_value(value: f64, map_type: MapType) -> String {
    match map_type {
        MapType::Percent => format!("{:.1}%", value),
        _ if value.fract() == 0.0 && value.abs() < 1e15 => format!("{:.0}", value),
        _ => format!("{:.2}", value),
    }
}
