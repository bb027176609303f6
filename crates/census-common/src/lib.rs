//! Common types shared by the census choropleth crates.

pub mod bbox;
pub mod boundary;
pub mod colour;
pub mod error;
pub mod feature;
pub mod stats;

pub use bbox::{BoundingBox, LatLng};
pub use boundary::{BoundaryLevel, BoundaryZoomTable, ZoomRange};
pub use colour::Color;
pub use error::{ChoroplethError, ChoroplethResult};
pub use feature::{Feature, FeatureBatch};
pub use stats::{Breaks, Classification, MapType, MetadataDocument, StatDescriptor, NUM_BREAKS};
