//! Tests for ordered fetching, layer replacement and session handling.

mod common;

use std::rc::Rc;

use census_common::{BoundingBox, ChoroplethError, FeatureBatch, ZoomRange};
use classifier::{ClassificationEngine, ColorClass, Legend};
use common::{GatedSource, InstantSource, RecordingSink, SinkEvent};
use test_utils::{bbox, percent_batch, ramp_batch};
use view_engine::{
    BoundaryResolver, FetchCoordinator, RefreshOutcome, Session, StatMetadataRegistry, ViewEvent,
    ViewState, ViewerConfig,
};

fn view(zoom: i32, stat_id: &str) -> ViewState {
    let resolver = BoundaryResolver::from_zoom_table(ZoomRange::default(), test_utils::boundary_table());
    let registry = StatMetadataRegistry::from_document(test_utils::metadata_document()).unwrap();
    let (w, s, e, n) = bbox::INNER_WEST;
    ViewState::initial(zoom, BoundingBox::new(w, s, e, n), stat_id, &resolver, &registry).unwrap()
}

fn coordinator() -> FetchCoordinator<GatedSource> {
    FetchCoordinator::new(GatedSource::fixtures(), ClassificationEngine::default())
}

fn moved(zoom: i32) -> ViewEvent {
    let (w, s, e, n) = bbox::SYDNEY;
    ViewEvent::Moved {
        zoom,
        bounds: BoundingBox::new(w, s, e, n),
    }
}

// ============================================================================
// Sequencing
// ============================================================================

#[test]
fn test_sequence_numbers_increase() {
    let coordinator = coordinator();
    assert_eq!(coordinator.latest_sequence(), 0);
    let r1 = coordinator.begin(&view(10, "b3"));
    let r2 = coordinator.begin(&view(11, "b3"));
    assert_eq!((r1.sequence, r2.sequence), (1, 2));
    assert_eq!(coordinator.latest_sequence(), 2);
}

#[test]
fn test_late_earlier_response_is_discarded() {
    let coordinator = coordinator();
    let r1 = coordinator.begin(&view(10, "b3"));
    let r2 = coordinator.begin(&view(12, "b3"));

    let applied = coordinator
        .complete(r2, Ok(Some(ramp_batch(3, 5.0, 10.0, Some(500.0)))))
        .unwrap();
    let late = coordinator
        .complete(r1, Ok(Some(ramp_batch(9, 5.0, 10.0, Some(500.0)))))
        .unwrap();

    assert!(!applied.is_superseded());
    assert_eq!(late, RefreshOutcome::Superseded { sequence: 1, latest: 2 });
    let rendered = coordinator.rendered().unwrap();
    assert_eq!(rendered.request.sequence, 2);
    assert_eq!(rendered.request.level.level_id, "sa2");
    assert_eq!(rendered.len(), 3);
    assert_eq!(coordinator.stats().stale, 1);
}

#[test]
fn test_early_earlier_response_is_discarded_too() {
    let coordinator = coordinator();
    let r1 = coordinator.begin(&view(10, "b3"));
    let r2 = coordinator.begin(&view(12, "b3"));

    let early = coordinator
        .complete(r1, Ok(Some(ramp_batch(9, 5.0, 10.0, Some(500.0)))))
        .unwrap();

    assert!(early.is_superseded());
    assert!(coordinator.rendered().is_none());

    coordinator
        .complete(r2, Ok(Some(ramp_batch(3, 5.0, 10.0, Some(500.0)))))
        .unwrap();
    assert_eq!(coordinator.rendered().unwrap().request.sequence, 2);
}

#[test]
fn test_stale_error_is_discarded() {
    let coordinator = coordinator();
    let r1 = coordinator.begin(&view(10, "b3"));
    let _r2 = coordinator.begin(&view(12, "b3"));

    let outcome = coordinator.complete(r1, Err(ChoroplethError::Timeout)).unwrap();

    assert!(outcome.is_superseded());
    assert_eq!(coordinator.stats().failures, 0);
}

#[tokio::test]
async fn test_r1_resolving_after_r2_renders_r2() {
    let coordinator = coordinator();
    let v1 = view(10, "b3");
    let v2 = view(12, "b3");

    let driver = async {
        coordinator.source().until_waiting(2).await;
        coordinator
            .source()
            .release(2, Ok(Some(ramp_batch(2, 15.0, 10.0, Some(500.0)))));
        tokio::task::yield_now().await;
        coordinator
            .source()
            .release(1, Ok(Some(ramp_batch(5, 15.0, 10.0, Some(500.0)))));
    };

    let (o1, o2, ()) = tokio::join!(coordinator.refresh(&v1), coordinator.refresh(&v2), driver);

    assert_eq!(o1.unwrap(), RefreshOutcome::Superseded { sequence: 1, latest: 2 });
    let layer = o2.unwrap().layer().cloned().unwrap();
    assert_eq!(layer.request.sequence, 2);
    assert!(Rc::ptr_eq(&layer, &coordinator.rendered().unwrap()));
    assert_eq!(coordinator.rendered().unwrap().len(), 2);
}

#[tokio::test]
async fn test_requests_carry_view_parameters() {
    let coordinator = coordinator();
    let v = view(12, "b4");

    let driver = async {
        coordinator.source().until_waiting(1).await;
        coordinator.source().release(1, Ok(None));
    };
    let (_, ()) = tokio::join!(coordinator.refresh(&v), driver);

    let requests = coordinator.source().requests();
    assert_eq!(requests.len(), 1);
    let pairs = requests[0].query_pairs();
    let get = |key: &str| pairs.iter().find(|(k, _)| *k == key).unwrap().1.clone();
    assert_eq!(get("b"), "sa2");
    assert_eq!(get("s"), "b4");
    assert_eq!(get("m"), "percent");
    assert_eq!(get("z"), "12");
}

// ============================================================================
// Layer replacement and NoData
// ============================================================================

#[test]
fn test_new_layer_replaces_not_merges() {
    let coordinator = coordinator();
    let r1 = coordinator.begin(&view(12, "b3"));
    coordinator
        .complete(r1, Ok(Some(ramp_batch(6, 5.0, 10.0, Some(500.0)))))
        .unwrap();
    let r2 = coordinator.begin(&view(12, "b3"));
    coordinator
        .complete(r2, Ok(Some(ramp_batch(2, 5.0, 10.0, Some(500.0)))))
        .unwrap();

    let rendered = coordinator.rendered().unwrap();
    assert_eq!(rendered.len(), 2);
    assert_eq!(rendered.classified.classes.len(), 2);
    assert_eq!(rendered.fills.len(), 2);
}

#[test]
fn test_null_response_is_no_data_and_keeps_layer() {
    let coordinator = coordinator();
    let r1 = coordinator.begin(&view(12, "b3"));
    coordinator
        .complete(r1, Ok(Some(ramp_batch(4, 5.0, 10.0, Some(500.0)))))
        .unwrap();

    let r2 = coordinator.begin(&view(12, "b3"));
    let err = coordinator.complete(r2, Ok(None)).unwrap_err();

    assert_eq!(
        err,
        ChoroplethError::NoData {
            level: "sa2".into(),
            stat_id: "b3".into()
        }
    );
    assert_eq!(coordinator.rendered().unwrap().request.sequence, 1);
}

#[test]
fn test_empty_collection_is_no_data() {
    let coordinator = coordinator();
    let r1 = coordinator.begin(&view(12, "b3"));
    let err = coordinator
        .complete(r1, Ok(Some(FeatureBatch::default())))
        .unwrap_err();
    assert_eq!(err.kind(), "NoData");
    assert!(coordinator.rendered().is_none());
}

#[test]
fn test_transport_error_keeps_layer() {
    let coordinator = coordinator();
    let r1 = coordinator.begin(&view(12, "b3"));
    coordinator
        .complete(r1, Ok(Some(ramp_batch(4, 5.0, 10.0, Some(500.0)))))
        .unwrap();

    let r2 = coordinator.begin(&view(13, "b3"));
    let err = coordinator
        .complete(r2, Err(ChoroplethError::Transport("connection reset".into())))
        .unwrap_err();

    assert_eq!(err.kind(), "Transport");
    assert_eq!(coordinator.rendered().unwrap().request.sequence, 1);
    assert_eq!(coordinator.stats().failures, 1);
}

#[test]
fn test_gradient_layer_legend_and_info() {
    let coordinator = coordinator();
    let r1 = coordinator.begin(&view(12, "b4"));
    let batch = percent_batch(&[(10.0, 500.0), (134.2, 500.0), (50.0, 40.0)]);

    let outcome = coordinator.complete(r1, Ok(Some(batch))).unwrap();
    let layer = outcome.layer().unwrap();

    assert!(matches!(
        layer.legend(),
        Legend::Gradient { min, max, .. } if *min == 10.0 && *max == 100.0
    ));
    let info = layer.info("p2").unwrap();
    assert_eq!(info.class, ColorClass::LowPopulation);
    assert_eq!(info.fill.to_hex(), "#4d4d4d");
    assert_eq!(info.percent, Some(50.0));
    assert!(layer.info("missing").is_none());
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn test_session_bootstrap_and_move() {
    // Nothing comes back at the deepest zoom.
    let source = InstantSource::new(|request| {
        if request.zoom < 15 {
            Ok(Some(ramp_batch(3, 15.0, 10.0, Some(500.0))))
        } else {
            Ok(None)
        }
    });
    let session = Session::bootstrap_with_sink(source, &ViewerConfig::default(), RecordingSink::default())
        .await
        .unwrap();

    assert_eq!(session.view().level().level_id, "sa3");
    assert_eq!(session.view().stat_id(), "b3");
    assert_eq!(session.coordinator().source().metadata_calls.get(), 1);

    session.refresh().await.unwrap();
    session.handle(moved(12)).await.unwrap();
    let err = session.handle(moved(15)).await.unwrap_err();

    assert_eq!(err.kind(), "NoData");
    assert_eq!(session.view().zoom(), 15);
    assert_eq!(session.coordinator().rendered().unwrap().request.sequence, 2);
    assert_eq!(
        *session.sink().events.borrow(),
        vec![
            SinkEvent::Replaced { sequence: 1, features: 3 },
            SinkEvent::Replaced { sequence: 2, features: 3 },
            SinkEvent::Failed(ChoroplethError::NoData {
                level: "sa1".into(),
                stat_id: "b3".into()
            }),
        ]
    );
}

#[tokio::test]
async fn test_session_unknown_stat_fetches_nothing() {
    let source = InstantSource::new(|_| Ok(Some(ramp_batch(3, 15.0, 10.0, Some(500.0)))));
    let session = Session::bootstrap_with_sink(source, &ViewerConfig::default(), RecordingSink::default())
        .await
        .unwrap();

    let err = session
        .handle(ViewEvent::StatSelected {
            stat_id: "b42".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "UnknownStat");
    assert_eq!(session.coordinator().latest_sequence(), 0);
    assert_eq!(session.view().stat_id(), "b3");
    assert_eq!(session.sink().events.borrow().len(), 1);
}

#[tokio::test]
async fn test_session_records_observed_range() {
    let source = InstantSource::new(|_| Ok(Some(percent_batch(&[(5.0, 500.0), (45.0, 500.0)]))));
    let config = ViewerConfig {
        stats: vec!["b4".into(), "b3".into()],
        ..ViewerConfig::default()
    };
    let session = Session::bootstrap(source, &config).await.unwrap();

    session.refresh().await.unwrap();

    let range = session.view().observed_range().unwrap();
    assert_eq!((range.min, range.max), (5.0, 45.0));
}

#[tokio::test]
async fn test_session_bootstrap_rejects_uncovered_stat() {
    let source = GatedSource::new(
        test_utils::boundary_zooms_json(),
        test_utils::metadata_json_without("sa4", "b5"),
    );
    let config = ViewerConfig {
        stats: vec!["b3".into(), "b5".into()],
        ..ViewerConfig::default()
    };

    let result = Session::bootstrap(source, &config).await;

    assert!(matches!(
        result,
        Err(ChoroplethError::UnknownStat { ref level, ref stat_id }) if level == "sa4" && stat_id == "b5"
    ));
}

#[tokio::test]
async fn test_interleaved_handles_on_local_set() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let session = Rc::new(
                Session::bootstrap(GatedSource::fixtures(), &ViewerConfig::default())
                    .await
                    .unwrap(),
            );

            let source = session.coordinator().source();
            let first = tokio::task::spawn_local({
                let session = Rc::clone(&session);
                async move { session.handle(moved(9)).await }
            });
            source.until_waiting(1).await;
            let second = tokio::task::spawn_local({
                let session = Rc::clone(&session);
                async move { session.handle(moved(13)).await }
            });
            source.until_waiting(2).await;
            source.release(2, Ok(Some(ramp_batch(4, 15.0, 10.0, Some(500.0)))));
            let second = second.await.unwrap().unwrap();
            source.release(1, Ok(Some(ramp_batch(8, 15.0, 10.0, Some(500.0)))));
            let first = first.await.unwrap().unwrap();

            assert!(first.is_superseded());
            assert_eq!(second.layer().unwrap().request.level.level_id, "sa2");
            let rendered = session.coordinator().rendered().unwrap();
            assert_eq!(rendered.request.sequence, 2);
            assert_eq!(rendered.len(), 4);
        })
        .await;
}
