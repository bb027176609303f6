//! Ordered data fetching.
//!
//! View events can fire faster than responses return, so every request is
//! stamped with a sequence number and only the response to the latest issued
//! request may replace the rendered layer. Superseded responses are dropped on
//! arrival; the request itself is never aborted.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use census_common::{
    BoundaryLevel, BoundingBox, ChoroplethError, ChoroplethResult, Color, FeatureBatch, StatDescriptor,
};
use classifier::{ClassificationEngine, ClassifiedBatch, ColorClass, Legend, ValueRange};
use serde::Serialize;
use tracing::{debug, warn};

use crate::metrics::{FetchMetrics, FetchStats};
use crate::source::CensusSource;
use crate::view::ViewState;

/// One data request, keyed on everything the response depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRequest {
    pub sequence: u64,
    pub bounds: BoundingBox,
    pub zoom: u8,
    pub level: BoundaryLevel,
    pub stat: StatDescriptor,
}

impl DataRequest {
    /// Query parameters of the data endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ml", self.bounds.west.to_string()),
            ("mb", self.bounds.south.to_string()),
            ("mr", self.bounds.east.to_string()),
            ("mt", self.bounds.north.to_string()),
            ("s", self.stat.id.clone()),
            ("t", self.stat.table.clone()),
            ("b", self.level.level_id.clone()),
            ("z", self.zoom.to_string()),
            ("m", self.stat.map_type.as_str().to_string()),
        ]
    }
}

/// Hover data for one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureInfo {
    pub id: String,
    pub name: Option<String>,
    pub value: Option<f64>,
    pub population: Option<f64>,
    pub percent: Option<f64>,
    pub class: ColorClass,
    pub fill: Color,
}

/// A classified response, ready for the rendering collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLayer {
    pub request: DataRequest,
    pub batch: FeatureBatch,
    pub classified: ClassifiedBatch,
    /// Fill colour per feature, in batch order
    pub fills: Vec<Color>,
}

impl RenderedLayer {
    pub fn range(&self) -> Option<ValueRange> {
        self.classified.range
    }

    pub fn legend(&self) -> &Legend {
        &self.classified.legend
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub fn info(&self, feature_id: &str) -> Option<FeatureInfo> {
        let index = self.batch.iter().position(|f| f.id == feature_id)?;
        let feature = &self.batch.features()[index];
        Some(FeatureInfo {
            id: feature.id.clone(),
            name: feature.name.clone(),
            value: feature.value,
            population: feature.population,
            percent: feature.percent,
            class: self.classified.classes[index].clone(),
            fill: self.fills[index].clone(),
        })
    }
}

/// What became of one response.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The response replaced the rendered layer.
    Applied(Rc<RenderedLayer>),
    /// A newer request was issued first; the response was dropped.
    Superseded { sequence: u64, latest: u64 },
}

impl RefreshOutcome {
    pub fn layer(&self) -> Option<&Rc<RenderedLayer>> {
        match self {
            RefreshOutcome::Applied(layer) => Some(layer),
            RefreshOutcome::Superseded { .. } => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, RefreshOutcome::Superseded { .. })
    }
}

/// Issues data requests and applies only the latest response.
///
/// Shared by reference between the event handler and in-flight completions on
/// one thread; interior state is never borrowed across an await.
pub struct FetchCoordinator<S> {
    source: S,
    engine: ClassificationEngine,
    issued: Cell<u64>,
    rendered: RefCell<Option<Rc<RenderedLayer>>>,
    metrics: FetchMetrics,
}

impl<S: CensusSource> FetchCoordinator<S> {
    pub fn new(source: S, engine: ClassificationEngine) -> Self {
        Self {
            source,
            engine,
            issued: Cell::new(0),
            rendered: RefCell::new(None),
            metrics: FetchMetrics::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn engine(&self) -> &ClassificationEngine {
        &self.engine
    }

    /// Sequence number of the most recently issued request (0 before any).
    pub fn latest_sequence(&self) -> u64 {
        self.issued.get()
    }

    /// The layer currently on screen.
    pub fn rendered(&self) -> Option<Rc<RenderedLayer>> {
        self.rendered.borrow().clone()
    }

    pub fn stats(&self) -> FetchStats {
        self.metrics.snapshot()
    }

    /// Count a render cycle abandoned before any request was issued.
    pub fn record_failure(&self, err: &ChoroplethError) {
        self.metrics.record_failure(err.kind());
    }

    /// Stamp a request for `view` with the next sequence number.
    ///
    /// Every earlier request is superseded from this point on.
    pub fn begin(&self, view: &ViewState) -> DataRequest {
        let sequence = self.issued.get() + 1;
        self.issued.set(sequence);

        let request = DataRequest {
            sequence,
            bounds: view.bounds(),
            zoom: view.zoom(),
            level: view.level().clone(),
            stat: view.stat().clone(),
        };
        self.metrics.record_request(&request.level.level_id);
        debug!(
            sequence,
            stat = %request.stat.id,
            level = %request.level.level_id,
            zoom = request.zoom,
            bbox = %request.bounds.cache_key(),
            "Issued data request"
        );
        request
    }

    /// Apply the response to `request`.
    ///
    /// A superseded response is dropped whatever it holds, errors included.
    /// For the latest request, a null or empty response is `NoData` and the
    /// previous layer stays; anything else replaces it.
    pub fn complete(
        &self,
        request: DataRequest,
        response: ChoroplethResult<Option<FeatureBatch>>,
    ) -> ChoroplethResult<RefreshOutcome> {
        let latest = self.issued.get();
        if request.sequence != latest {
            self.metrics.record_stale();
            debug!(
                sequence = request.sequence,
                latest,
                "Discarded superseded response"
            );
            return Ok(RefreshOutcome::Superseded {
                sequence: request.sequence,
                latest,
            });
        }

        let batch = match response {
            Ok(Some(batch)) if !batch.is_empty() => batch,
            Ok(_) => {
                let err = ChoroplethError::NoData {
                    level: request.level.level_id.clone(),
                    stat_id: request.stat.id.clone(),
                };
                warn!(sequence = request.sequence, error = %err, "Keeping previous layer");
                self.metrics.record_failure(err.kind());
                return Err(err);
            }
            Err(err) => {
                warn!(sequence = request.sequence, error = %err, "Data request failed");
                self.metrics.record_failure(err.kind());
                return Err(err);
            }
        };

        let classified = self
            .engine
            .classify_batch(&batch, &request.stat, &request.level);
        let fills = classified.classes.iter().map(|c| self.engine.fill(c)).collect();
        let layer = Rc::new(RenderedLayer {
            request,
            batch,
            classified,
            fills,
        });

        *self.rendered.borrow_mut() = Some(Rc::clone(&layer));
        self.metrics.record_applied();
        debug!(
            sequence = layer.request.sequence,
            features = layer.len(),
            "Replaced rendered layer"
        );
        Ok(RefreshOutcome::Applied(layer))
    }

    /// Issue a request for `view`, await it and apply the response.
    pub async fn refresh(&self, view: &ViewState) -> ChoroplethResult<RefreshOutcome> {
        let request = self.begin(view);
        let response = self.source.fetch_features(&request).await;
        self.complete(request, response)
    }
}
