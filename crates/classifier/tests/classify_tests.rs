//! Tests for fixed-breaks and gradient classification through the engine.

use census_common::{BoundaryLevel, Breaks, Color, Feature, FeatureBatch};
use classifier::breaks::classify;
use classifier::{
    ClassIndex, ClassParams, ClassificationEngine, ColorClass, Legend, Palette,
    SuppressionStrategy, ValueRange,
};
use test_utils::{assert_approx_eq, fixed_breaks, percent_batch, percent_stat, ramp_batch, values_stat};

fn class(n: u8) -> ColorClass {
    ColorClass::Class(ClassIndex::new(n).unwrap())
}

fn shift_engine() -> ClassificationEngine {
    ClassificationEngine::new(Palette::default(), SuppressionStrategy::index_shift()).unwrap()
}

// ============================================================================
// Fixed-breaks rule
// ============================================================================

#[test]
fn test_worked_examples() {
    let breaks = fixed_breaks();
    assert_eq!(classify(45.0, &breaks).get(), 5);
    assert_eq!(classify(70.0, &breaks).get(), 7);
    assert_eq!(classify(70.01, &breaks).get(), 7);
    assert_eq!(classify(10.0, &breaks).get(), 1);
    assert_eq!(classify(10.01, &breaks).get(), 2);
}

#[test]
fn test_classification_is_monotonic() {
    let breaks = fixed_breaks();
    let mut previous = ClassIndex::LOWEST;
    let mut v = -10.0;
    while v < 100.0 {
        let current = classify(v, &breaks);
        assert!(current >= previous, "class dropped at {}", v);
        previous = current;
        v += 0.25;
    }
}

#[test]
fn test_break_value_matches_value_just_below() {
    let breaks = fixed_breaks();
    for b in breaks.as_slice() {
        assert_eq!(classify(*b, &breaks), classify(b - 1e-9, &breaks));
    }
}

#[test]
fn test_repeated_breaks_skip_classes() {
    let breaks = Breaks::new([0.0, 0.0, 0.0, 5.0, 5.0, 9.0, 9.0]).unwrap();
    assert_eq!(classify(0.0, &breaks).get(), 1);
    assert_eq!(classify(1.0, &breaks).get(), 4);
    assert_eq!(classify(6.0, &breaks).get(), 6);
    assert_eq!(classify(10.0, &breaks).get(), 7);
}

// ============================================================================
// Suppression
// ============================================================================

#[test]
fn test_index_shift_drops_three_classes() {
    let engine = shift_engine();
    let level = BoundaryLevel::new("sa1", 25.0);
    let stat = values_stat();
    let params = ClassParams {
        descriptor: &stat,
        level: &level,
        range: None,
    };

    assert_eq!(engine.classify_value(Some(65.0), Some(20.0), &params), class(4));
    assert_eq!(engine.classify_value(Some(25.0), Some(25.0), &params), class(1));
    assert_eq!(engine.classify_value(Some(65.0), Some(26.0), &params), class(7));
}

#[test]
fn test_index_shift_never_below_one() {
    let engine = shift_engine();
    let level = BoundaryLevel::new("sa1", 25.0);
    let stat = values_stat();
    let params = ClassParams {
        descriptor: &stat,
        level: &level,
        range: None,
    };

    for value in [-5.0, 0.0, 5.0, 15.0, 35.0, 1e9] {
        let result = engine.classify_value(Some(value), Some(1.0), &params);
        let index = result.class_index().unwrap();
        assert!(index >= ClassIndex::LOWEST);
    }
}

#[test]
fn test_zero_population_always_sentinel() {
    let level = BoundaryLevel::new("sa2", 75.0);
    let stat = values_stat();
    let params = ClassParams {
        descriptor: &stat,
        level: &level,
        range: None,
    };

    for engine in [ClassificationEngine::default(), shift_engine()] {
        assert_eq!(
            engine.classify_value(Some(1e6), Some(0.0), &params),
            ColorClass::LowPopulation
        );
    }
}

#[test]
fn test_sentinel_strategy_for_fixed_breaks() {
    let engine = ClassificationEngine::default();
    let level = BoundaryLevel::new("sa2", 75.0);
    let stat = values_stat();
    let params = ClassParams {
        descriptor: &stat,
        level: &level,
        range: None,
    };

    assert_eq!(
        engine.classify_value(Some(65.0), Some(75.0), &params),
        ColorClass::LowPopulation
    );
    assert_eq!(engine.classify_value(Some(65.0), None, &params), class(7));
}

// ============================================================================
// Gradient mode
// ============================================================================

#[test]
fn test_percent_max_is_clamped_to_100() {
    let engine = ClassificationEngine::default();
    let level = BoundaryLevel::new("sa2", 75.0);
    let batch = percent_batch(&[(12.0, 500.0), (134.2, 800.0), (55.0, 300.0)]);

    let result = engine.classify_batch(&batch, &percent_stat(), &level);

    let range = result.range.unwrap();
    assert_eq!(range.max, 100.0);
    assert_eq!(range.min, 12.0);
    assert_eq!(result.legend.range(), Some((12.0, 100.0)));
}

#[test]
fn test_suppressed_features_do_not_move_range() {
    let engine = ClassificationEngine::default();
    let level = BoundaryLevel::new("sa2", 75.0);
    let batch = percent_batch(&[(20.0, 500.0), (80.0, 500.0), (99.0, 10.0), (1.0, 75.0)]);

    let result = engine.classify_batch(&batch, &percent_stat(), &level);

    assert_eq!(result.range, Some(ValueRange { min: 20.0, max: 80.0 }));
    assert_eq!(result.classes[2], ColorClass::LowPopulation);
    assert_eq!(result.classes[3], ColorClass::LowPopulation);
}

#[test]
fn test_every_included_value_within_range() {
    let level = BoundaryLevel::new("sa2", 75.0);
    let batch = test_utils::scattered_batch(400, 7);
    let range = ValueRange::observe(&batch, census_common::MapType::Percent, &level).unwrap();

    for feature in batch.iter() {
        if level.suppresses(feature.population) {
            continue;
        }
        if let Some(p) = feature.percent {
            assert!(p >= range.min, "{} below min {}", p, range.min);
            assert!(p.min(100.0) <= range.max, "{} above max {}", p, range.max);
        }
    }
}

#[test]
fn test_gradient_endpoints() {
    let engine = ClassificationEngine::default();
    let level = BoundaryLevel::new("sa2", 75.0);
    let batch = percent_batch(&[(10.0, 500.0), (60.0, 500.0), (35.0, 500.0)]);

    let result = engine.classify_batch(&batch, &percent_stat(), &level);

    assert_eq!(engine.fill(&result.classes[0]).to_hex(), "#f6d2a9");
    assert_eq!(engine.fill(&result.classes[1]).to_hex(), "#b13f64");
    let (r, _, _, _) = engine.fill(&result.classes[2]).to_rgba();
    assert_approx_eq!(r, (0xf6 as f64 + 0xb1 as f64) / 2.0, 1.0);
}

#[test]
fn test_identical_values_use_midpoint() {
    let engine = ClassificationEngine::default();
    let level = BoundaryLevel::new("sa2", 75.0);
    let batch = percent_batch(&[(40.0, 500.0), (40.0, 900.0)]);

    let result = engine.classify_batch(&batch, &percent_stat(), &level);

    let expected = Color::hex("#f6d2a9").lerp(&Color::hex("#b13f64"), 0.5);
    assert_eq!(result.classes[0], ColorClass::Colour(expected));
}

#[test]
fn test_malformed_values_excluded_not_fatal() {
    let engine = ClassificationEngine::default();
    let level = BoundaryLevel::new("sa2", 75.0);
    let batch = FeatureBatch::new(vec![
        Feature::new("a", Some(1.0), Some(500.0)).with_percent(Some(10.0)),
        Feature::new("b", None, Some(500.0)).with_percent(Some(f64::NAN)),
        Feature::new("c", Some(2.0), Some(500.0)).with_percent(Some(30.0)),
    ]);

    let result = engine.classify_batch(&batch, &percent_stat(), &level);

    assert_eq!(result.range, Some(ValueRange { min: 10.0, max: 30.0 }));
    assert_eq!(result.classes[1], ColorClass::NoData);
}

// ============================================================================
// Batch results and legends
// ============================================================================

#[test]
fn test_fixed_batch_has_no_range() {
    let engine = ClassificationEngine::default();
    let level = BoundaryLevel::new("sa2", 75.0);
    let batch = ramp_batch(8, 5.0, 10.0, Some(1000.0));

    let result = engine.classify_batch(&batch, &values_stat(), &level);

    assert!(result.range.is_none());
    let indexes: Vec<u8> = result
        .classes
        .iter()
        .map(|c| c.class_index().unwrap().get())
        .collect();
    assert_eq!(indexes, vec![1, 2, 3, 4, 5, 6, 7, 7]);
    match result.legend {
        Legend::Breaks { breaks, entries, .. } => {
            assert_eq!(breaks, fixed_breaks());
            assert_eq!(entries.len(), 7);
        }
        other => panic!("Expected breaks legend, got {:?}", other),
    }
}

#[test]
fn test_classified_batch_serializes() {
    let engine = ClassificationEngine::default();
    let level = BoundaryLevel::new("sa2", 75.0);
    let batch = ramp_batch(2, 5.0, 60.0, Some(1000.0));

    let result = engine.classify_batch(&batch, &values_stat(), &level);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["classes"][0], serde_json::json!({"kind": "class", "value": 1}));
    assert_eq!(json["legend"]["type"], "breaks");
}
