//! Layer sink that writes render results to the log.

use census_common::ChoroplethError;
use tracing::{info, warn};
use view_engine::{LayerSink, RenderedLayer};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LayerSink for TracingSink {
    fn layer_replaced(&self, layer: &RenderedLayer) {
        info!(
            sequence = layer.request.sequence,
            level = %layer.request.level.level_id,
            stat = %layer.request.stat.id,
            features = layer.len(),
            "Layer replaced"
        );
    }

    fn render_failed(&self, error: &ChoroplethError) {
        warn!(kind = error.kind(), error = %error, "Render failed, keeping previous layer");
    }
}
