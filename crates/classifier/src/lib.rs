//! Classification of census statistics into colour classes.
//!
//! Implements:
//! - Fixed-breaks classification (seven thresholds, strict `>`)
//! - Continuous gradients over each response's observed min/max
//! - Population suppression (sentinel colour or class index shift)
//! - Legend data for the UI collaborator
//! - Class break generation from sample data

pub mod binning;
pub mod breaks;
pub mod engine;
pub mod error;
pub mod gradient;
pub mod legend;
pub mod palette;
pub mod suppression;

pub use binning::BinningMethod;
pub use breaks::{ClassIndex, NUM_CLASSES};
pub use engine::{ClassParams, ClassificationEngine, ClassifiedBatch, ColorClass};
pub use error::ClassifierError;
pub use gradient::ValueRange;
pub use legend::{Legend, LegendEntry};
pub use palette::Palette;
pub use suppression::{SuppressionStrategy, Treatment};
