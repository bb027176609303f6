//! Viewer configuration loading.
//!
//! Loaded from YAML with defaults for every field, then overridden from the
//! environment, then validated.

use std::path::Path;
use std::time::Duration;

use census_common::{BoundaryLevel, ChoroplethError, ChoroplethResult, LatLng, ZoomRange};
use classifier::{Palette, SuppressionStrategy};
use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_stats() -> Vec<String> {
    vec!["b3".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Main viewer configuration loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Data server root, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub zoom: ZoomRange,

    #[serde(default)]
    pub initial_view: InitialView,

    /// Statistics to request metadata for; the first is active at start-up
    #[serde(default = "default_stats")]
    pub stats: Vec<String>,

    #[serde(default)]
    pub palette: Palette,

    #[serde(default)]
    pub suppression: SuppressionStrategy,

    /// Fixed boundary level for every zoom (static snapshots)
    #[serde(default)]
    pub boundary_override: Option<BoundaryLevel>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Where the map starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialView {
    pub zoom: i32,
    pub center: LatLng,
    #[serde(default)]
    pub viewport: Viewport,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            zoom: 10,
            center: LatLng::new(-33.85, 151.15),
            viewport: Viewport::default(),
        }
    }
}

/// Map viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            zoom: ZoomRange::default(),
            initial_view: InitialView::default(),
            stats: default_stats(),
            palette: Palette::default(),
            suppression: SuppressionStrategy::default(),
            boundary_override: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ViewerConfig {
    /// Load configuration from a YAML file. Environment overrides are not applied.
    pub fn from_file(path: impl AsRef<Path>) -> ChoroplethResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> ChoroplethResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ChoroplethError::InvalidConfig(e.to_string()))
    }

    /// Load from `path` (or defaults), apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> ChoroplethResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `CENSUS_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override fields from any key lookup. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("CENSUS_BASE_URL") {
            self.base_url = val;
        }

        if let Some(val) = lookup("CENSUS_STATS") {
            let stats: Vec<String> = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !stats.is_empty() {
                self.stats = stats;
            }
        }

        if let Some(val) = lookup("CENSUS_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = val.trim().parse() {
                self.request_timeout_secs = secs;
            }
        }
    }

    pub fn validate(&self) -> ChoroplethResult<()> {
        ZoomRange::new(self.zoom.min, self.zoom.max)?;

        if self.base_url.trim().is_empty() {
            return Err(ChoroplethError::InvalidConfig("base_url must not be empty".into()));
        }
        if self.stats.is_empty() {
            return Err(ChoroplethError::InvalidConfig(
                "at least one statistic must be specified".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ChoroplethError::InvalidConfig(
                "request_timeout_secs must be > 0".into(),
            ));
        }
        if let Some(level) = &self.boundary_override {
            if level.level_id.trim().is_empty() {
                return Err(ChoroplethError::InvalidConfig(
                    "boundary_override.level_id must not be empty".into(),
                ));
            }
            if !level.population_threshold.is_finite() || level.population_threshold < 0.0 {
                return Err(ChoroplethError::InvalidConfig(
                    "boundary_override.population_threshold must be a non-negative number".into(),
                ));
            }
        }

        self.palette.validate()?;
        self.suppression.validate()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The statistic active when the session starts.
    pub fn initial_stat(&self) -> &str {
        self.stats.first().map(String::as_str).unwrap_or("b3")
    }
}
