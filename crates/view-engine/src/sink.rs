//! Callbacks to the rendering collaborator.

use census_common::ChoroplethError;

use crate::fetch::RenderedLayer;

/// Receives structured render results. Never receives markup.
pub trait LayerSink {
    /// A new layer fully replaces the previous one.
    fn layer_replaced(&self, layer: &RenderedLayer);

    /// The render cycle was abandoned; the previous layer stays on screen.
    fn render_failed(&self, error: &ChoroplethError);
}

/// Discards every notification.
impl LayerSink for () {
    fn layer_replaced(&self, _layer: &RenderedLayer) {}

    fn render_failed(&self, _error: &ChoroplethError) {}
}
