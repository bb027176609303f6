//! Common test fixtures for census viewer tests.
//!
//! The boundary table and metadata mirror what the data server publishes for
//! the Australian census: five boundary levels from states down to SA1s.

use census_common::{
    BoundaryLevel, BoundaryZoomTable, Breaks, Classification, MapType, MetadataDocument,
    StatDescriptor,
};
use serde_json::{json, Value};

/// Common bounding box definitions as `(west, south, east, north)`.
pub mod bbox {
    /// Mainland Australia and Tasmania
    pub const AUSTRALIA: (f64, f64, f64, f64) = (112.9, -43.7, 153.6, -10.7);

    /// Greater Sydney
    pub const SYDNEY: (f64, f64, f64, f64) = (150.5, -34.2, 151.4, -33.5);

    /// Inner west Sydney (about one zoom-12 viewport)
    pub const INNER_WEST: (f64, f64, f64, f64) = (151.10, -33.90, 151.20, -33.85);

    /// Single point (degenerate bbox)
    pub const POINT: (f64, f64, f64, f64) = (151.15, -33.85, 151.15, -33.85);
}

/// Zoom → `(level id, population threshold)` the fixtures use.
pub const LEVELS: [(u8, u8, &str, f64); 5] = [
    (4, 6, "ste", 2025.0),
    (7, 8, "sa4", 675.0),
    (9, 10, "sa3", 225.0),
    (11, 13, "sa2", 75.0),
    (14, 15, "sa1", 25.0),
];

/// Breaks used for `b3` at every level.
pub const B3_BREAKS: [f64; 7] = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0];

/// Breaks used for `b5` (density) at every level.
pub const B5_BREAKS: [f64; 7] = [1.0, 5.0, 25.0, 100.0, 500.0, 2500.0, 10000.0];

/// Boundary-levels document for zooms 4..=15.
pub fn boundary_zooms_json() -> Value {
    let mut doc = serde_json::Map::new();
    for (min, max, level_id, threshold) in LEVELS {
        for zoom in min..=max {
            doc.insert(
                zoom.to_string(),
                json!({"levelId": level_id, "populationThreshold": threshold}),
            );
        }
    }
    Value::Object(doc)
}

/// The same table in the legacy bare-string form.
pub fn legacy_boundary_zooms_json() -> Value {
    let mut doc = serde_json::Map::new();
    for (min, max, level_id, _) in LEVELS {
        for zoom in min..=max {
            doc.insert(zoom.to_string(), json!(level_id));
        }
    }
    Value::Object(doc)
}

pub fn boundary_table() -> BoundaryZoomTable {
    BoundaryZoomTable::from_value(boundary_zooms_json()).expect("fixture boundary table parses")
}

pub fn level(level_id: &str) -> BoundaryLevel {
    LEVELS
        .iter()
        .find(|(_, _, id, _)| *id == level_id)
        .map(|(_, _, id, threshold)| BoundaryLevel::new(*id, *threshold))
        .unwrap_or_else(|| panic!("no fixture level '{}'", level_id))
}

fn stats_json() -> Value {
    json!([
        {"id": "b3", "table": "g01", "description": "Total persons", "type": "persons",
         "map_type": "values", "classification": "breaks", "breaks": B3_BREAKS},
        {"id": "b4", "table": "g01", "description": "Aged 0-4 years", "type": "persons",
         "map_type": "percent", "classification": "gradient"},
        {"id": "b5", "table": "g01", "description": "Persons per sq km", "type": "persons",
         "map_type": "density", "classification": "breaks", "breaks": B5_BREAKS}
    ])
}

/// Metadata document defining `b3`, `b4` and `b5` at every level.
pub fn metadata_json() -> Value {
    let boundaries: Vec<Value> = LEVELS
        .iter()
        .map(|(_, _, level_id, _)| json!({"boundary": level_id, "stats": stats_json()}))
        .collect();
    json!({"type": "StatsCollection", "classes": 7, "boundaries": boundaries})
}

/// Metadata document with `stat_id` removed from `level_id`.
pub fn metadata_json_without(level_id: &str, stat_id: &str) -> Value {
    let mut doc = metadata_json();
    if let Some(boundaries) = doc["boundaries"].as_array_mut() {
        for boundary in boundaries.iter_mut().filter(|b| b["boundary"] == level_id) {
            if let Some(stats) = boundary["stats"].as_array_mut() {
                stats.retain(|s| s["id"] != stat_id);
            }
        }
    }
    doc
}

pub fn metadata_document() -> MetadataDocument {
    MetadataDocument::from_json(&metadata_json().to_string()).expect("fixture metadata parses")
}

pub fn fixed_breaks() -> Breaks {
    Breaks::new(B3_BREAKS).expect("fixture breaks are valid")
}

/// `b3`: total persons, fixed breaks 10..70.
pub fn values_stat() -> StatDescriptor {
    StatDescriptor {
        id: "b3".into(),
        table: "g01".into(),
        description: "Total persons".into(),
        stat_type: "persons".into(),
        map_type: MapType::Values,
        classification: Classification::Breaks {
            breaks: fixed_breaks(),
        },
    }
}

/// `b4`: percent of persons, continuous gradient.
pub fn percent_stat() -> StatDescriptor {
    StatDescriptor {
        id: "b4".into(),
        table: "g01".into(),
        description: "Aged 0-4 years".into(),
        stat_type: "persons".into(),
        map_type: MapType::Percent,
        classification: Classification::Gradient,
    }
}
