//! Statistic descriptors per boundary level.

use std::collections::BTreeMap;

use census_common::{BoundaryLevel, ChoroplethError, ChoroplethResult, MetadataDocument, StatDescriptor};

use crate::resolver::BoundaryResolver;

/// Read-only lookup of statistic descriptors, keyed by (boundary level, stat id).
///
/// Lookups never fall back to another statistic: an id missing at a level is
/// an `UnknownStat` error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatMetadataRegistry {
    levels: BTreeMap<String, Vec<StatDescriptor>>,
}

impl StatMetadataRegistry {
    pub fn from_document(document: MetadataDocument) -> ChoroplethResult<Self> {
        let mut levels: BTreeMap<String, Vec<StatDescriptor>> = BTreeMap::new();

        for boundary in document.boundaries {
            if levels.contains_key(&boundary.boundary) {
                return Err(ChoroplethError::InvalidDocument(format!(
                    "boundary '{}' listed twice",
                    boundary.boundary
                )));
            }
            for (i, stat) in boundary.stats.iter().enumerate() {
                if boundary.stats[..i].iter().any(|s| s.matches(&stat.id)) {
                    return Err(ChoroplethError::InvalidDocument(format!(
                        "statistic '{}' listed twice for boundary '{}'",
                        stat.id, boundary.boundary
                    )));
                }
            }
            levels.insert(boundary.boundary, boundary.stats);
        }

        Ok(Self { levels })
    }

    pub fn from_json(json: &str) -> ChoroplethResult<Self> {
        Self::from_document(MetadataDocument::from_json(json)?)
    }

    /// Every statistic defined for `level`, in document order.
    pub fn stats_for(&self, level: &BoundaryLevel) -> &[StatDescriptor] {
        self.levels
            .get(&level.level_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn describe(&self, level: &BoundaryLevel, stat_id: &str) -> ChoroplethResult<&StatDescriptor> {
        self.stats_for(level)
            .iter()
            .find(|s| s.matches(stat_id))
            .ok_or_else(|| ChoroplethError::UnknownStat {
                level: level.level_id.clone(),
                stat_id: stat_id.to_string(),
            })
    }

    pub fn levels(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Check that every level the resolver can reach defines every statistic.
    ///
    /// Returns the first missing (level, statistic) pair as `UnknownStat`.
    pub fn validate_coverage(&self, resolver: &BoundaryResolver, stat_ids: &[String]) -> ChoroplethResult<()> {
        for level in resolver.reachable_levels() {
            for stat_id in stat_ids {
                self.describe(level, stat_id)?;
            }
        }
        Ok(())
    }
}
