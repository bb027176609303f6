//! One viewer session: bootstrap, then view events in, layers out.

use std::cell::RefCell;

use census_common::{BoundingBox, ChoroplethResult};
use classifier::ClassificationEngine;
use tracing::info;

use crate::config::ViewerConfig;
use crate::fetch::{FetchCoordinator, RefreshOutcome, RenderedLayer};
use crate::registry::StatMetadataRegistry;
use crate::resolver::BoundaryResolver;
use crate::sink::LayerSink;
use crate::source::CensusSource;
use crate::view::{ViewEvent, ViewState};

/// Owns the resolver, registry, coordinator and the current [`ViewState`].
///
/// `handle` may be called again while an earlier call is still awaiting its
/// response; the coordinator's sequence numbers decide which response renders.
pub struct Session<S, K = ()> {
    resolver: BoundaryResolver,
    registry: StatMetadataRegistry,
    coordinator: FetchCoordinator<S>,
    sink: K,
    view: RefCell<ViewState>,
}

impl<S: CensusSource> Session<S, ()> {
    pub async fn bootstrap(source: S, config: &ViewerConfig) -> ChoroplethResult<Self> {
        Self::bootstrap_with_sink(source, config, ()).await
    }
}

impl<S: CensusSource, K: LayerSink> Session<S, K> {
    /// Load the boundary table and metadata, check coverage and build the
    /// initial view. No data is fetched yet.
    pub async fn bootstrap_with_sink(source: S, config: &ViewerConfig, sink: K) -> ChoroplethResult<Self> {
        config.validate()?;
        let zooms = config.zoom;

        let resolver = match &config.boundary_override {
            Some(level) => BoundaryResolver::fixed(zooms, level.clone()),
            None => BoundaryResolver::from_zoom_table(zooms, source.boundary_zooms(zooms).await?),
        };
        let registry = StatMetadataRegistry::from_document(source.stats_metadata(&config.stats).await?)?;
        registry.validate_coverage(&resolver, &config.stats)?;

        let engine = ClassificationEngine::new(config.palette.clone(), config.suppression)?;

        let initial = &config.initial_view;
        let bounds = BoundingBox::around(
            initial.center,
            resolver.clamp(initial.zoom),
            initial.viewport.width,
            initial.viewport.height,
        );
        let view = ViewState::initial(initial.zoom, bounds, config.initial_stat(), &resolver, &registry)?;

        info!(
            levels = resolver.reachable_levels().len(),
            stats = config.stats.len(),
            fixed_level = resolver.is_fixed(),
            level = %view.level().level_id,
            stat = %view.stat_id(),
            "Session started"
        );

        Ok(Self {
            resolver,
            registry,
            coordinator: FetchCoordinator::new(source, engine),
            sink,
            view: RefCell::new(view),
        })
    }

    pub fn view(&self) -> ViewState {
        self.view.borrow().clone()
    }

    pub fn resolver(&self) -> &BoundaryResolver {
        &self.resolver
    }

    pub fn registry(&self) -> &StatMetadataRegistry {
        &self.registry
    }

    pub fn coordinator(&self) -> &FetchCoordinator<S> {
        &self.coordinator
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Recompute the view for `event` and fetch for it.
    ///
    /// A failed recomputation leaves the view and the rendered layer as they
    /// were and nothing is fetched.
    pub async fn handle(&self, event: ViewEvent) -> ChoroplethResult<RefreshOutcome> {
        let next = self.view.borrow().apply(&event, &self.resolver, &self.registry);
        let next = match next {
            Ok(next) => next,
            Err(err) => {
                self.coordinator.record_failure(&err);
                self.sink.render_failed(&err);
                return Err(err);
            }
        };
        *self.view.borrow_mut() = next.clone();
        self.fetch(&next).await
    }

    /// Fetch for the current view without changing it.
    pub async fn refresh(&self) -> ChoroplethResult<RefreshOutcome> {
        let view = self.view();
        self.fetch(&view).await
    }

    async fn fetch(&self, view: &ViewState) -> ChoroplethResult<RefreshOutcome> {
        let outcome = self.coordinator.refresh(view).await;
        match &outcome {
            Ok(RefreshOutcome::Applied(layer)) => {
                self.record_layer(layer);
                self.sink.layer_replaced(layer);
            }
            Ok(RefreshOutcome::Superseded { .. }) => {}
            Err(err) => self.sink.render_failed(err),
        }
        outcome
    }

    /// Keep the layer's observed range when it was fetched for the current
    /// level and statistic.
    fn record_layer(&self, layer: &RenderedLayer) {
        let mut view = self.view.borrow_mut();
        if layer.request.level == *view.level() && layer.request.stat.id == view.stat_id() {
            *view = view.clone().with_observed_range(layer.range());
        }
    }
}
