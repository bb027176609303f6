//! In-memory census sources for view-engine tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;
use census_common::{
    BoundaryZoomTable, ChoroplethError, ChoroplethResult, FeatureBatch, MetadataDocument, ZoomRange,
};
use serde_json::Value;
use tokio::sync::oneshot;
use view_engine::fetch::DataRequest;
use view_engine::{CensusSource, LayerSink, RenderedLayer};

type Response = ChoroplethResult<Option<FeatureBatch>>;

/// Serves fixture documents and holds every data request until the test
/// releases it, so tests choose the order responses arrive in.
pub struct GatedSource {
    boundary: Value,
    metadata: Value,
    waiting: RefCell<HashMap<u64, oneshot::Sender<Response>>>,
    requests: RefCell<Vec<DataRequest>>,
}

impl GatedSource {
    pub fn new(boundary: Value, metadata: Value) -> Self {
        Self {
            boundary,
            metadata,
            waiting: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn fixtures() -> Self {
        Self::new(test_utils::boundary_zooms_json(), test_utils::metadata_json())
    }

    /// Number of requests issued but not yet released.
    pub fn waiting(&self) -> usize {
        self.waiting.borrow().len()
    }

    pub fn requests(&self) -> Vec<DataRequest> {
        self.requests.borrow().clone()
    }

    /// Answer request `sequence`. Panics if it is not waiting.
    pub fn release(&self, sequence: u64, response: Response) {
        let sender = self
            .waiting
            .borrow_mut()
            .remove(&sequence)
            .unwrap_or_else(|| panic!("request {} is not waiting", sequence));
        let _ = sender.send(response);
    }

    /// Yield until `count` requests are waiting.
    pub async fn until_waiting(&self, count: usize) {
        while self.waiting() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait(?Send)]
impl CensusSource for GatedSource {
    async fn boundary_zooms(&self, _zooms: ZoomRange) -> ChoroplethResult<BoundaryZoomTable> {
        BoundaryZoomTable::from_value(self.boundary.clone())
    }

    async fn stats_metadata(&self, _stat_ids: &[String]) -> ChoroplethResult<MetadataDocument> {
        MetadataDocument::from_json(&self.metadata.to_string())
    }

    async fn fetch_features(&self, request: &DataRequest) -> Response {
        let (tx, rx) = oneshot::channel();
        self.requests.borrow_mut().push(request.clone());
        self.waiting.borrow_mut().insert(request.sequence, tx);
        rx.await
            .unwrap_or_else(|_| Err(ChoroplethError::Transport("request dropped".into())))
    }
}

/// Answers every data request at once with a batch built from the request.
pub struct InstantSource<F> {
    respond: F,
    pub metadata_calls: Cell<usize>,
}

impl<F: Fn(&DataRequest) -> Response> InstantSource<F> {
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            metadata_calls: Cell::new(0),
        }
    }
}

#[async_trait(?Send)]
impl<F: Fn(&DataRequest) -> Response> CensusSource for InstantSource<F> {
    async fn boundary_zooms(&self, _zooms: ZoomRange) -> ChoroplethResult<BoundaryZoomTable> {
        BoundaryZoomTable::from_value(test_utils::boundary_zooms_json())
    }

    async fn stats_metadata(&self, _stat_ids: &[String]) -> ChoroplethResult<MetadataDocument> {
        self.metadata_calls.set(self.metadata_calls.get() + 1);
        MetadataDocument::from_json(&test_utils::metadata_json().to_string())
    }

    async fn fetch_features(&self, request: &DataRequest) -> Response {
        (self.respond)(request)
    }
}

/// What the sink was told, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Replaced { sequence: u64, features: usize },
    Failed(ChoroplethError),
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: RefCell<Vec<SinkEvent>>,
}

impl LayerSink for RecordingSink {
    fn layer_replaced(&self, layer: &RenderedLayer) {
        self.events.borrow_mut().push(SinkEvent::Replaced {
            sequence: layer.request.sequence,
            features: layer.len(),
        });
    }

    fn render_failed(&self, error: &ChoroplethError) {
        self.events.borrow_mut().push(SinkEvent::Failed(error.clone()));
    }
}
