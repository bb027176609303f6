//! Statistic descriptors and the metadata document that carries them.

use serde::{Deserialize, Serialize};

use crate::error::ChoroplethError;
use crate::feature::Feature;

/// Number of thresholds in a fixed-breaks classification (one per colour class).
pub const NUM_BREAKS: usize = 7;

/// Which number of a feature a statistic is mapped by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapType {
    /// Raw statistic value
    #[default]
    Values,
    /// Value per square kilometre
    Density,
    /// Value as a percentage of the area's population
    Percent,
}

impl MapType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapType::Values => "values",
            MapType::Density => "density",
            MapType::Percent => "percent",
        }
    }

    /// The finite number of `feature` this map type classifies, if any.
    pub fn metric(&self, feature: &Feature) -> Option<f64> {
        let value = match self {
            MapType::Values => feature.value,
            MapType::Density => feature.density,
            MapType::Percent => feature.percent,
        };
        value.filter(|v| v.is_finite())
    }
}

/// Seven monotonically non-decreasing class thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Breaks([f64; NUM_BREAKS]);

impl Breaks {
    pub fn new(values: [f64; NUM_BREAKS]) -> Result<Self, ChoroplethError> {
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(ChoroplethError::InvalidBreaks(format!(
                "break {} is not finite",
                v
            )));
        }
        if values.windows(2).any(|w| w[1] < w[0]) {
            return Err(ChoroplethError::InvalidBreaks(format!(
                "breaks must be non-decreasing: {:?}",
                values
            )));
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn lowest(&self) -> f64 {
        self.0[0]
    }

    pub fn highest(&self) -> f64 {
        self.0[NUM_BREAKS - 1]
    }
}

impl TryFrom<Vec<f64>> for Breaks {
    type Error = ChoroplethError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        let len = values.len();
        let array: [f64; NUM_BREAKS] = values.try_into().map_err(|_| {
            ChoroplethError::InvalidBreaks(format!(
                "expected {} breaks, got {}",
                NUM_BREAKS, len
            ))
        })?;
        Self::new(array)
    }
}

impl From<Breaks> for Vec<f64> {
    fn from(breaks: Breaks) -> Self {
        breaks.0.to_vec()
    }
}

/// How a statistic is turned into colour classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "classification", rename_all = "snake_case")]
pub enum Classification {
    /// Fixed thresholds chosen in advance
    Breaks { breaks: Breaks },

    /// Colour interpolated over each response's observed min/max
    Gradient,
}

impl Classification {
    pub fn is_gradient(&self) -> bool {
        matches!(self, Classification::Gradient)
    }
}

/// Metadata for one statistic at one boundary level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDescriptor {
    /// Statistic id (census sequential id, e.g. "b3")
    pub id: String,

    /// Source data table (e.g. "g01")
    pub table: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Display type/unit
    #[serde(default, rename = "type")]
    pub stat_type: String,

    #[serde(default, alias = "maptype")]
    pub map_type: MapType,

    #[serde(flatten)]
    pub classification: Classification,
}

impl StatDescriptor {
    pub fn matches(&self, stat_id: &str) -> bool {
        self.id.eq_ignore_ascii_case(stat_id)
    }
}

/// The statistics available at one boundary level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryStats {
    pub boundary: String,
    #[serde(default)]
    pub stats: Vec<StatDescriptor>,
}

/// The server's statistics metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    #[serde(default)]
    pub classes: Option<usize>,
    pub boundaries: Vec<BoundaryStats>,
}

impl MetadataDocument {
    pub fn from_json(json: &str) -> Result<Self, ChoroplethError> {
        let document: MetadataDocument = serde_json::from_str(json)?;
        if let Some(classes) = document.classes {
            if classes != NUM_BREAKS {
                return Err(ChoroplethError::InvalidDocument(format!(
                    "metadata built for {} classes, expected {}",
                    classes, NUM_BREAKS
                )));
            }
        }
        Ok(document)
    }
}
