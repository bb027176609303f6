//! View state and data fetching for the census choropleth.
//!
//! The pipeline for every view change:
//! 1. [`ViewState::apply`] resolves the boundary level for the new zoom and the
//!    statistic descriptor for that level
//! 2. [`FetchCoordinator::begin`] stamps a data request with the next sequence number
//! 3. The [`CensusSource`] answers, possibly after later requests were issued
//! 4. [`FetchCoordinator::complete`] discards superseded responses, classifies the
//!    latest one and replaces the rendered layer
//!
//! Everything runs on one thread. Completions interleave with new view events
//! but never run in parallel with them.

pub mod config;
pub mod fetch;
pub mod http;
pub mod metrics;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod sink;
pub mod source;
pub mod view;

pub use config::ViewerConfig;
pub use fetch::{DataRequest, FetchCoordinator, FeatureInfo, RefreshOutcome, RenderedLayer};
pub use http::HttpCensusSource;
pub use registry::StatMetadataRegistry;
pub use resolver::{BoundaryResolver, ResolverMode};
pub use session::Session;
pub use sink::LayerSink;
pub use source::CensusSource;
pub use view::{ViewEvent, ViewState};
