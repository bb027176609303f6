//! Errors raised while configuring classification or generating breaks.

use census_common::{ChoroplethError, MapType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    /// No feature survived the sample filter.
    #[error("no usable {map_type:?} values to compute breaks from")]
    EmptySample { map_type: MapType },

    #[error("invalid palette: {0}")]
    InvalidPalette(String),

    #[error("invalid suppression strategy: {0}")]
    InvalidSuppression(String),

    #[error(transparent)]
    Breaks(#[from] ChoroplethError),
}

impl From<ClassifierError> for ChoroplethError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::EmptySample { .. } => ChoroplethError::InvalidBreaks(err.to_string()),
            ClassifierError::InvalidPalette(_) | ClassifierError::InvalidSuppression(_) => {
                ChoroplethError::InvalidConfig(err.to_string())
            }
            ClassifierError::Breaks(inner) => inner,
        }
    }
}
