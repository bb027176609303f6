//! Boundary levels and the zoom table that selects them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{ChoroplethError, ChoroplethResult};

/// An administrative geography granularity (e.g. "ste", "sa2", "mb").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryLevel {
    /// Boundary-type code
    #[serde(alias = "name", alias = "level_id")]
    pub level_id: String,

    /// Areas with population at or under this value are suppressed
    #[serde(default, alias = "min", alias = "population_threshold")]
    pub population_threshold: f64,
}

impl BoundaryLevel {
    pub fn new(level_id: impl Into<String>, population_threshold: f64) -> Self {
        Self {
            level_id: level_id.into(),
            population_threshold,
        }
    }

    /// Whether a feature with this population falls under the suppression threshold.
    ///
    /// An unknown population is never suppressed.
    pub fn suppresses(&self, population: Option<f64>) -> bool {
        population.is_some_and(|p| p <= self.population_threshold)
    }
}

/// Inclusive zoom bounds of the interactive map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: u8,
    pub max: u8,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 4, max: 15 }
    }
}

impl ZoomRange {
    pub fn new(min: u8, max: u8) -> ChoroplethResult<Self> {
        if min > max {
            return Err(ChoroplethError::InvalidConfig(format!(
                "zoom range min {} exceeds max {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Clamp any integer zoom into the range.
    pub fn clamp(&self, zoom: i32) -> u8 {
        zoom.clamp(i32::from(self.min), i32::from(self.max)) as u8
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> {
        self.min..=self.max
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum BoundaryEntry {
    Level(BoundaryLevel),
    /// Bare level id from older servers; no suppression threshold.
    Name(String),
}

/// The server-provided zoom → boundary level table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryZoomTable {
    levels: BTreeMap<u8, BoundaryLevel>,
}

impl BoundaryZoomTable {
    pub fn new(levels: BTreeMap<u8, BoundaryLevel>) -> Self {
        Self { levels }
    }

    /// Parse the `{"10": {"levelId": "sa2", "populationThreshold": 5}, ...}` document.
    pub fn from_json(json: &str) -> ChoroplethResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> ChoroplethResult<Self> {
        let raw: HashMap<String, BoundaryEntry> = serde_json::from_value(value)?;

        let mut levels = BTreeMap::new();
        for (key, entry) in raw {
            let zoom: u8 = key.trim().parse().map_err(|_| {
                ChoroplethError::InvalidDocument(format!("boundary table key '{}' is not a zoom", key))
            })?;
            let level = match entry {
                BoundaryEntry::Level(level) => level,
                BoundaryEntry::Name(level_id) => BoundaryLevel::new(level_id, 0.0),
            };
            if !level.population_threshold.is_finite() || level.population_threshold < 0.0 {
                return Err(ChoroplethError::InvalidDocument(format!(
                    "zoom {}: population threshold must be a non-negative number",
                    zoom
                )));
            }
            levels.insert(zoom, level);
        }

        Ok(Self { levels })
    }

    pub fn get(&self, zoom: u8) -> Option<&BoundaryLevel> {
        self.levels.get(&zoom)
    }

    pub fn insert(&mut self, zoom: u8, level: BoundaryLevel) {
        self.levels.insert(zoom, level);
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Distinct level ids in zoom order.
    pub fn level_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for level in self.levels.values() {
            if !ids.contains(&level.level_id.as_str()) {
                ids.push(&level.level_id);
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_and_legacy_entries() {
        let json = r#"{
            "4": "ste",
            "10": {"levelId": "sa2", "populationThreshold": 5},
            "11": {"levelId": "sa2", "populationThreshold": 5}
        }"#;
        let table = BoundaryZoomTable::from_json(json).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(4), Some(&BoundaryLevel::new("ste", 0.0)));
        assert_eq!(table.get(10).unwrap().population_threshold, 5.0);
        assert_eq!(table.level_ids(), vec!["ste", "sa2"]);
    }

    #[test]
    fn test_parse_name_min_entries() {
        let json = r#"{"6": {"name": "ste", "min": 2025}, "12": {"name": "sa2", "min": 75}}"#;
        let table = BoundaryZoomTable::from_json(json).unwrap();
        assert_eq!(table.get(6), Some(&BoundaryLevel::new("ste", 2025.0)));
        assert_eq!(table.get(12), Some(&BoundaryLevel::new("sa2", 75.0)));
    }

    #[test]
    fn test_rejects_non_numeric_zoom_key() {
        let result = BoundaryZoomTable::from_json(r#"{"ten": "sa2"}"#);
        assert!(matches!(result, Err(ChoroplethError::InvalidDocument(_))));
    }

    #[test]
    fn test_zoom_range_clamps() {
        let zooms = ZoomRange::new(4, 15).unwrap();
        assert_eq!(zooms.clamp(3), 4);
        assert_eq!(zooms.clamp(-20), 4);
        assert_eq!(zooms.clamp(9), 9);
        assert_eq!(zooms.clamp(22), 15);
        assert!(ZoomRange::new(8, 2).is_err());
    }

    #[test]
    fn test_suppresses_at_or_under_threshold() {
        let level = BoundaryLevel::new("sa1", 5.0);
        assert!(level.suppresses(Some(5.0)));
        assert!(level.suppresses(Some(0.0)));
        assert!(!level.suppresses(Some(5.5)));
        assert!(!level.suppresses(None));
    }
}
