//! Zoom → boundary level resolution.

use census_common::{BoundaryLevel, BoundaryZoomTable, ChoroplethError, ChoroplethResult, ZoomRange};
use tracing::info;

/// Where boundary levels come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverMode {
    /// The server's zoom table
    ZoomTable(BoundaryZoomTable),
    /// One level for every zoom, for static snapshots
    Fixed(BoundaryLevel),
}

/// Maps a map zoom to the boundary level drawn at it.
///
/// The zoom is clamped to the configured range before any lookup, so zooms
/// outside the range never reach the table.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryResolver {
    zooms: ZoomRange,
    mode: ResolverMode,
}

impl BoundaryResolver {
    pub fn from_zoom_table(zooms: ZoomRange, table: BoundaryZoomTable) -> Self {
        Self {
            zooms,
            mode: ResolverMode::ZoomTable(table),
        }
    }

    /// Always resolve to `level`, whatever the zoom.
    ///
    /// Only enabled by an explicit boundary override.
    pub fn fixed(zooms: ZoomRange, level: BoundaryLevel) -> Self {
        info!(
            level = %level.level_id,
            population_threshold = level.population_threshold,
            "Boundary override enabled, zoom table ignored"
        );
        Self {
            zooms,
            mode: ResolverMode::Fixed(level),
        }
    }

    pub fn zooms(&self) -> ZoomRange {
        self.zooms
    }

    pub fn mode(&self) -> &ResolverMode {
        &self.mode
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.mode, ResolverMode::Fixed(_))
    }

    pub fn clamp(&self, zoom: i32) -> u8 {
        self.zooms.clamp(zoom)
    }

    pub fn resolve(&self, zoom: i32) -> ChoroplethResult<&BoundaryLevel> {
        let zoom = self.clamp(zoom);
        match &self.mode {
            ResolverMode::Fixed(level) => Ok(level),
            ResolverMode::ZoomTable(table) => table
                .get(zoom)
                .ok_or(ChoroplethError::LevelNotFound { zoom }),
        }
    }

    /// Distinct levels any zoom in range can resolve to, in zoom order.
    ///
    /// Zooms with no table entry are skipped.
    pub fn reachable_levels(&self) -> Vec<&BoundaryLevel> {
        match &self.mode {
            ResolverMode::Fixed(level) => vec![level],
            ResolverMode::ZoomTable(table) => {
                let mut levels: Vec<&BoundaryLevel> = Vec::new();
                for level in self.zooms.iter().filter_map(|z| table.get(z)) {
                    if !levels.iter().any(|l| l.level_id == level.level_id) {
                        levels.push(level);
                    }
                }
                levels
            }
        }
    }
}
