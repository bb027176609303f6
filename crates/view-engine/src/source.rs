//! The data server seen from the view engine.

use async_trait::async_trait;
use census_common::{BoundaryZoomTable, ChoroplethResult, FeatureBatch, MetadataDocument, ZoomRange};

use crate::fetch::DataRequest;

/// The three documents the session reads from the data server.
///
/// Futures are not `Send`: everything runs on the session's single thread.
#[async_trait(?Send)]
pub trait CensusSource {
    /// The zoom → boundary level table for `zooms`. Fetched once per session.
    async fn boundary_zooms(&self, zooms: ZoomRange) -> ChoroplethResult<BoundaryZoomTable>;

    /// Descriptors for `stat_ids` at every boundary level.
    async fn stats_metadata(&self, stat_ids: &[String]) -> ChoroplethResult<MetadataDocument>;

    /// Features for one data request. `None` for a null response.
    async fn fetch_features(&self, request: &DataRequest) -> ChoroplethResult<Option<FeatureBatch>>;
}
