//! The session's view state and the events that change it.

use census_common::{BoundaryLevel, BoundingBox, ChoroplethResult, StatDescriptor};
use classifier::ValueRange;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::registry::StatMetadataRegistry;
use crate::resolver::BoundaryResolver;

/// A user interaction that changes what the map shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ViewEvent {
    /// Pan and/or zoom. The zoom is clamped on application.
    Moved { zoom: i32, bounds: BoundingBox },
    /// A different statistic was picked.
    StatSelected { stat_id: String },
}

/// What the map currently shows.
///
/// Values are immutable: [`ViewState::apply`] returns the next state and
/// leaves this one untouched, so a failed transition keeps the prior view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    zoom: u8,
    bounds: BoundingBox,
    level: BoundaryLevel,
    stat: StatDescriptor,
    observed_range: Option<ValueRange>,
}

impl ViewState {
    pub fn initial(
        zoom: i32,
        bounds: BoundingBox,
        stat_id: &str,
        resolver: &BoundaryResolver,
        registry: &StatMetadataRegistry,
    ) -> ChoroplethResult<Self> {
        let level = resolver.resolve(zoom)?;
        let stat = registry.describe(level, stat_id)?;
        Ok(Self {
            zoom: resolver.clamp(zoom),
            bounds,
            level: level.clone(),
            stat: stat.clone(),
            observed_range: None,
        })
    }

    /// Recompute the view for `event`.
    ///
    /// A move re-resolves the boundary level and re-describes the active
    /// statistic under it. A statistic change re-describes under the current
    /// level. The observed range is dropped whenever the level or statistic
    /// changes.
    pub fn apply(
        &self,
        event: &ViewEvent,
        resolver: &BoundaryResolver,
        registry: &StatMetadataRegistry,
    ) -> ChoroplethResult<ViewState> {
        match event {
            ViewEvent::Moved { zoom, bounds } => {
                let level = resolver.resolve(*zoom)?;
                let stat = registry.describe(level, &self.stat.id)?;
                let level_changed = level.level_id != self.level.level_id;
                if level_changed {
                    info!(
                        from = %self.level.level_id,
                        to = %level.level_id,
                        zoom = resolver.clamp(*zoom),
                        "Boundary level changed"
                    );
                }
                Ok(ViewState {
                    zoom: resolver.clamp(*zoom),
                    bounds: *bounds,
                    level: level.clone(),
                    stat: stat.clone(),
                    observed_range: if level_changed { None } else { self.observed_range },
                })
            }
            ViewEvent::StatSelected { stat_id } => {
                let stat = registry.describe(&self.level, stat_id)?;
                let stat_changed = stat.id != self.stat.id;
                Ok(ViewState {
                    stat: stat.clone(),
                    observed_range: if stat_changed { None } else { self.observed_range },
                    ..self.clone()
                })
            }
        }
    }

    /// The state with the range observed in the latest applied response.
    pub fn with_observed_range(mut self, range: Option<ValueRange>) -> Self {
        self.observed_range = range;
        self
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn level(&self) -> &BoundaryLevel {
        &self.level
    }

    pub fn stat(&self) -> &StatDescriptor {
        &self.stat
    }

    pub fn stat_id(&self) -> &str {
        &self.stat.id
    }

    pub fn observed_range(&self) -> Option<ValueRange> {
        self.observed_range
    }
}
