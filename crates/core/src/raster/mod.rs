//! Raster data structures and operations

mod element;
mod geokeys;
mod geotransform;
mod grid;
mod neighborhood;

pub use element::RasterElement;
pub use geokeys::GeoKeys;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use neighborhood::Connectivity;
