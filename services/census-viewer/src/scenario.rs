//! Scenario files: scripted sequences of view events.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use census_common::{BoundingBox, LatLng};
use serde::{Deserialize, Serialize};
use view_engine::config::Viewport;
use view_engine::{BoundaryResolver, ViewEvent};

/// A named script of view events loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Issue each step without waiting for the previous step's response
    #[serde(default)]
    pub overlap: bool,
    /// Viewport used to turn a centre point into bounds
    #[serde(default)]
    pub viewport: Viewport,
    /// Steps are single-key maps (`- move: {...}`) or bare unit names (`- refresh`)
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Pan and/or zoom
    Move(MoveTarget),
    /// Switch to another statistic
    Select(String),
    /// Fetch again for the current view
    Refresh,
    /// Wait before issuing the next step
    PauseMs(u64),
}

/// Where a move step goes: explicit bounds, or a centre at a zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveTarget {
    Bounds { zoom: i32, bounds: BoundingBox },
    Center { zoom: i32, center: LatLng },
}

impl MoveTarget {
    pub fn zoom(&self) -> i32 {
        match self {
            MoveTarget::Bounds { zoom, .. } | MoveTarget::Center { zoom, .. } => *zoom,
        }
    }

    /// The view event for this move. Centre targets are expanded to the
    /// viewport's bounds at the clamped zoom.
    pub fn to_event(&self, resolver: &BoundaryResolver, viewport: Viewport) -> ViewEvent {
        let bounds = match *self {
            MoveTarget::Bounds { bounds, .. } => bounds,
            MoveTarget::Center { zoom, center } => {
                BoundingBox::around(center, resolver.clamp(zoom), viewport.width, viewport.height)
            }
        };
        ViewEvent::Moved {
            zoom: self.zoom(),
            bounds,
        }
    }
}

impl Step {
    /// The view event this step issues, if any.
    pub fn event(&self, resolver: &BoundaryResolver, viewport: Viewport) -> Option<ViewEvent> {
        match self {
            Step::Move(target) => Some(target.to_event(resolver, viewport)),
            Step::Select(stat_id) => Some(ViewEvent::StatSelected {
                stat_id: stat_id.clone(),
            }),
            Step::Refresh | Step::PauseMs(_) => None,
        }
    }

    pub fn pause(&self) -> Option<Duration> {
        match self {
            Step::PauseMs(ms) => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }

    /// Short human-readable form for reports.
    pub fn describe(&self) -> String {
        match self {
            Step::Move(MoveTarget::Bounds { zoom, bounds }) => {
                format!("move z{} [{}]", zoom, bounds.cache_key())
            }
            Step::Move(MoveTarget::Center { zoom, center }) => {
                format!("move z{} ({:.4}, {:.4})", zoom, center.lat, center.lng)
            }
            Step::Select(stat_id) => format!("select {}", stat_id),
            Step::Refresh => "refresh".to_string(),
            Step::PauseMs(ms) => format!("pause {}ms", ms),
        }
    }
}

impl Scenario {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            bail!("scenario name must not be empty");
        }
        if !self.steps.iter().any(|s| s.pause().is_none()) {
            bail!("scenario '{}' has no steps that fetch", self.name);
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            bail!("viewport must be at least 1x1 pixels");
        }
        for step in &self.steps {
            if let Step::Move(MoveTarget::Center { center, .. }) = step {
                if !(-90.0..=90.0).contains(&center.lat) || !(-180.0..=180.0).contains(&center.lng) {
                    bail!("centre ({}, {}) is out of range", center.lat, center.lng);
                }
            }
        }
        Ok(())
    }

    /// Number of steps that issue a request.
    pub fn fetch_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.pause().is_none()).count()
    }
}
