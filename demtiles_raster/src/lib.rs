//! Georeferenced elevation rasters: opening them, mapping geographic bounds to pixel windows, and
//! reading windows of band 1 as [`ElevationGrid`](demtiles_image::ElevationGrid)s.

mod crs;
#[cfg(feature = "gdal")]
mod gdal_source;
mod geo_transform;
mod geotiff;
mod memory;
mod open;
mod source;
#[cfg(any(test, feature = "test"))]
pub mod testing;
mod window;

pub use crs::Crs;
#[cfg(feature = "gdal")]
pub use gdal_source::GdalSource;
pub use geo_transform::GeoTransform;
pub use geotiff::GeoTiffSource;
pub use memory::MemorySource;
pub use open::open_raster;
pub use source::{RasterInfo, RasterSource};
pub use window::{ElevationBlock, PixelWindow};
