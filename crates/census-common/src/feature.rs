//! Boundary features returned by the data endpoint.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ChoroplethResult;

/// One boundary polygon's statistics.
///
/// Geometry is carried through untouched for the rendering collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: String,
    pub name: Option<String>,
    /// Raw statistic value
    pub value: Option<f64>,
    pub population: Option<f64>,
    /// Percent of population (precomputed by the server)
    pub percent: Option<f64>,
    /// Value per square kilometre
    pub density: Option<f64>,
    pub geometry: Option<Value>,
}

impl Feature {
    /// A feature with only the numbers classification looks at.
    pub fn new(id: impl Into<String>, value: Option<f64>, population: Option<f64>) -> Self {
        Self {
            id: id.into(),
            name: None,
            value,
            population,
            percent: None,
            density: None,
            geometry: None,
        }
    }

    pub fn with_percent(mut self, percent: Option<f64>) -> Self {
        self.percent = percent;
        self
    }

    pub fn with_density(mut self, density: Option<f64>) -> Self {
        self.density = density;
        self
    }
}

/// An immutable set of features from one response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureBatch {
    features: Vec<Feature>,
}

impl FeatureBatch {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Parse a GeoJSON `FeatureCollection` (or `null`) for statistic `stat_id`.
    ///
    /// Returns `None` for a `null` body.
    pub fn from_geojson(value: Value, stat_id: &str) -> ChoroplethResult<Option<Self>> {
        let collection: Option<RawCollection> = serde_json::from_value(value)?;
        Ok(collection.map(|c| Self {
            features: c
                .features
                .into_iter()
                .enumerate()
                .map(|(i, raw)| raw.into_feature(i, stat_id))
                .collect(),
        }))
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

impl<'a> IntoIterator for &'a FeatureBatch {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    geometry: Option<Value>,
}

impl RawFeature {
    fn into_feature(self, index: usize, stat_id: &str) -> Feature {
        let props = &self.properties;
        let id = match self.id {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => index.to_string(),
        };
        let value = props
            .get(stat_id)
            .or_else(|| props.get(&stat_id.to_lowercase()))
            .or_else(|| props.get("value"))
            .and_then(number);

        Feature {
            id,
            name: props.get("name").and_then(Value::as_str).map(str::to_string),
            value,
            population: props.get("population").and_then(number),
            percent: props.get("percent").and_then(number),
            density: props.get("density").and_then(number),
            geometry: self.geometry,
        }
    }
}

/// Numbers may arrive as JSON numbers or numeric strings; anything else is missing.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_feature_collection() {
        let body = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": 101, "properties": {
                    "name": "Glebe", "b3": 11552, "population": 11552,
                    "percent": 100.0, "density": 4489.2}, "geometry": null},
                {"type": "Feature", "id": "102", "properties": {
                    "b3": "850", "population": "0"}}
            ]
        });
        let batch = FeatureBatch::from_geojson(body, "b3").unwrap().unwrap();

        assert_eq!(batch.len(), 2);
        let first = &batch.features()[0];
        assert_eq!(first.id, "101");
        assert_eq!(first.name.as_deref(), Some("Glebe"));
        assert_eq!(first.value, Some(11552.0));
        assert_eq!(first.density, Some(4489.2));
        assert_eq!(batch.features()[1].value, Some(850.0));
        assert_eq!(batch.features()[1].population, Some(0.0));
    }

    #[test]
    fn test_null_body_is_none() {
        assert!(FeatureBatch::from_geojson(Value::Null, "b3").unwrap().is_none());
    }

    #[test]
    fn test_malformed_numbers_are_missing() {
        let body = json!({"features": [
            {"properties": {"b3": "n/a", "population": true, "percent": null}}
        ]});
        let batch = FeatureBatch::from_geojson(body, "B3").unwrap().unwrap();
        let feature = &batch.features()[0];
        assert_eq!(feature.id, "0");
        assert_eq!(feature.value, None);
        assert_eq!(feature.population, None);
        assert_eq!(feature.percent, None);
    }
}
