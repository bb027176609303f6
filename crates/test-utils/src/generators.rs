//! Generators for synthetic feature batches.
//!
//! These generators create predictable, verifiable feature data that can be
//! used across the test suite.

use census_common::{Feature, FeatureBatch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

/// Creates a batch whose values rise in equal steps.
///
/// Feature `i` has id `"f{i}"`, value `start + i * step` and the given
/// population.
///
/// # Example
///
/// ```
/// use test_utils::ramp_batch;
///
/// let batch = ramp_batch(5, 10.0, 10.0, Some(500.0));
/// assert_eq!(batch.len(), 5);
/// assert_eq!(batch.features()[4].value, Some(50.0));
/// ```
pub fn ramp_batch(count: usize, start: f64, step: f64, population: Option<f64>) -> FeatureBatch {
    FeatureBatch::new(
        (0..count)
            .map(|i| Feature::new(format!("f{}", i), Some(start + i as f64 * step), population))
            .collect(),
    )
}

/// Creates a batch of percent features from `(percent, population)` pairs.
pub fn percent_batch(rows: &[(f64, f64)]) -> FeatureBatch {
    FeatureBatch::new(
        rows.iter()
            .enumerate()
            .map(|(i, (percent, population))| {
                Feature::new(format!("p{}", i), Some(percent * population / 100.0), Some(*population))
                    .with_percent(Some(*percent))
            })
            .collect(),
    )
}

/// Creates a deterministic pseudo-random batch.
///
/// Roughly one feature in ten has zero population and one in twenty has no
/// value, so classification sees every treatment.
pub fn scattered_batch(count: usize, seed: u64) -> FeatureBatch {
    let mut rng = StdRng::seed_from_u64(seed);

    FeatureBatch::new(
        (0..count)
            .map(|i| {
                let population = if i % 10 == 3 { 0.0 } else { rng.gen_range(1..20_000) as f64 };
                let value = if i % 20 == 7 {
                    None
                } else {
                    Some(rng.gen_range(0.0..=population).floor())
                };
                let percent = value.map(|v| if population > 0.0 { v / population * 100.0 } else { 0.0 });
                Feature::new(format!("s{}", i), value, Some(population)).with_percent(percent)
            })
            .collect(),
    )
}

/// Renders features as the GeoJSON body the data endpoint returns.
///
/// The value is written under `stat_id`. Geometry is always `null`.
pub fn feature_collection(features: &[Feature], stat_id: &str) -> Value {
    let features: Vec<Value> = features
        .iter()
        .map(|f| {
            let mut properties = serde_json::Map::new();
            properties.insert("name".into(), json!(f.name.clone().unwrap_or_else(|| f.id.clone())));
            properties.insert(stat_id.into(), json!(f.value));
            properties.insert("population".into(), json!(f.population));
            properties.insert("percent".into(), json!(f.percent));
            properties.insert("density".into(), json!(f.density));
            json!({
                "type": "Feature",
                "id": f.id,
                "properties": properties,
                "geometry": null
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "features": features})
}
