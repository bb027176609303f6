//! Population suppression policy.
//!
//! Sparsely populated areas must not register as extreme values. Two
//! behaviours exist and are chosen by configuration:
//! - `Sentinel`: any suppressed feature gets the low-population colour
//! - `IndexShift`: suppressed fixed-breaks features drop `margin` classes
//!
//! A population of zero always gets the sentinel, and gradient mode cannot
//! shift so it always uses the sentinel too.

use census_common::{BoundaryLevel, Classification};
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// Classes removed by the index shift unless configured otherwise.
pub const DEFAULT_SHIFT_MARGIN: u8 = 3;

fn default_margin() -> u8 {
    DEFAULT_SHIFT_MARGIN
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SuppressionStrategy {
    #[default]
    Sentinel,
    IndexShift {
        #[serde(default = "default_margin")]
        margin: u8,
    },
}

/// What classification does with one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    Normal,
    Sentinel,
    Shift(u8),
}

impl SuppressionStrategy {
    pub fn index_shift() -> Self {
        SuppressionStrategy::IndexShift {
            margin: DEFAULT_SHIFT_MARGIN,
        }
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        match self {
            SuppressionStrategy::IndexShift { margin: 0 } => Err(
                ClassifierError::InvalidSuppression("index shift margin must be at least 1".into()),
            ),
            _ => Ok(()),
        }
    }

    pub fn treatment(
        &self,
        population: Option<f64>,
        level: &BoundaryLevel,
        classification: &Classification,
    ) -> Treatment {
        if population.is_some_and(|p| p <= 0.0) {
            return Treatment::Sentinel;
        }
        if !level.suppresses(population) {
            return Treatment::Normal;
        }
        match (self, classification) {
            (SuppressionStrategy::IndexShift { margin }, Classification::Breaks { .. }) => {
                Treatment::Shift(*margin)
            }
            _ => Treatment::Sentinel,
        }
    }
}
