//! Fixed-breaks classification.

use census_common::Breaks;
use serde::{Deserialize, Serialize};

/// Number of colour classes in a theme.
pub const NUM_CLASSES: u8 = 7;

/// A colour class in `1..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassIndex(u8);

impl ClassIndex {
    pub const LOWEST: ClassIndex = ClassIndex(1);
    pub const HIGHEST: ClassIndex = ClassIndex(NUM_CLASSES);

    pub fn new(index: u8) -> Option<Self> {
        (1..=NUM_CLASSES).contains(&index).then_some(ClassIndex(index))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position into a palette.
    pub fn position(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// Move down by `margin` classes, never below class 1.
    pub fn shifted_down(self, margin: u8) -> Self {
        ClassIndex(self.0.saturating_sub(margin).max(1))
    }

    pub fn all() -> impl Iterator<Item = ClassIndex> {
        (1..=NUM_CLASSES).map(ClassIndex)
    }
}

/// Class of `value`: one plus the number of breaks it strictly exceeds, capped at 7.
///
/// A value equal to a break stays in the lower class.
pub fn classify(value: f64, breaks: &Breaks) -> ClassIndex {
    let exceeded = breaks.as_slice().iter().filter(|&&b| value > b).count();
    let class = (exceeded + 1).min(usize::from(NUM_CLASSES));
    ClassIndex(class as u8)
}
