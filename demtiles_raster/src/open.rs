use crate::RasterSource;
use anyhow::{Result, ensure};
use std::path::Path;

/// Opens the raster at `path` with the best available reader.
///
/// With the `gdal` feature every format GDAL understands is accepted. Otherwise the file must be
/// a GeoTIFF in EPSG:4326 or EPSG:3857.
pub fn open_raster(path: &Path) -> Result<Box<dyn RasterSource>> {
	ensure!(path.exists(), "input raster {path:?} does not exist");
	ensure!(path.is_file(), "input raster {path:?} is not a file");

	#[cfg(feature = "gdal")]
	{
		Ok(Box::new(crate::GdalSource::open(path)?))
	}

	#[cfg(not(feature = "gdal"))]
	{
		Ok(Box::new(crate::GeoTiffSource::open(path)?))
	}
}
