//! Raster access through GDAL, for formats and projections the pure Rust reader does not cover.

use crate::{GeoTransform, RasterInfo, RasterSource};
use anyhow::{Context, Result, anyhow};
use demtiles_core::GeoBBox;
use demtiles_derive::context;
use demtiles_image::ElevationGrid;
use gdal::{
	Dataset,
	spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef},
};
use std::{
	fmt::{self, Debug},
	path::{Path, PathBuf},
	sync::Mutex,
};

/// Densification points used when projecting bounding boxes.
const DENSIFY_POINTS: i32 = 21;

pub struct GdalSource {
	path: PathBuf,
	info: RasterInfo,
	wkt: String,
	dataset: Mutex<Dataset>,
}

impl GdalSource {
	#[context("Failed to open raster {:?} with GDAL", path)]
	pub fn open(path: &Path) -> Result<GdalSource> {
		log::debug!("opening {path:?} with GDAL");
		let dataset = Dataset::open(path)?;

		let (width, height) = dataset.raster_size();
		let geo_transform = GeoTransform::new(dataset.geo_transform().context("dataset has no geotransform")?)?;
		let spatial_ref = dataset
			.spatial_ref()
			.context("dataset must have a spatial reference")?;
		let wkt = spatial_ref.to_wkt()?;
		let crs = match spatial_ref.auth_code() {
			Ok(code) => format!("EPSG:{code}"),
			Err(_) => String::from("custom CRS"),
		};
		let nodata = dataset.rasterband(1)?.no_data_value().map(|v| v as f32);

		let native_bounds = geo_transform.bounds(width as u32, height as u32);
		let to_geo = CoordTransform::new(&traditional(&wkt)?, &wgs84()?)?;
		let [x0, y0, x1, y1] = to_geo
			.transform_bounds(&native_bounds, DENSIFY_POINTS)
			.context("Failed to project raster bounds to EPSG:4326")?;
		let mut geo_bbox = GeoBBox::from_corners(x0, y0, x1, y1)?;
		geo_bbox.limit_to_mercator();

		log::debug!("{path:?}: {width}x{height}, {crs}, bbox {geo_bbox:?}, nodata {nodata:?}");

		Ok(GdalSource {
			path: path.to_path_buf(),
			info: RasterInfo {
				width: width as u32,
				height: height as u32,
				geo_transform,
				crs,
				native_bounds,
				geo_bbox,
				nodata,
			},
			wkt,
			dataset: Mutex::new(dataset),
		})
	}
}

impl RasterSource for GdalSource {
	fn info(&self) -> &RasterInfo {
		&self.info
	}

	fn geo_to_native(&self, bbox: &GeoBBox) -> Result<[f64; 4]> {
		let to_native = CoordTransform::new(&wgs84()?, &traditional(&self.wkt)?)?;
		Ok(to_native.transform_bounds(&bbox.as_array(), DENSIFY_POINTS)?)
	}

	#[context("Failed to read window ({col_off}, {row_off}, {width}, {height}) from {:?}", self.path)]
	fn read(&self, col_off: u32, row_off: u32, width: u32, height: u32) -> Result<ElevationGrid> {
		let dataset = self.dataset.lock().map_err(|_| anyhow!("GDAL dataset is poisoned"))?;
		let size = (width as usize, height as usize);
		let buffer = dataset
			.rasterband(1)?
			.read_as::<f32>((col_off as isize, row_off as isize), size, size, None)?;
		ElevationGrid::new(width, height, buffer.data().to_vec(), self.info.nodata)
	}
}

impl Debug for GdalSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GdalSource")
			.field("path", &self.path)
			.field("info", &self.info)
			.finish_non_exhaustive()
	}
}

fn wgs84() -> Result<SpatialRef> {
	let mut srs = SpatialRef::from_epsg(4326)?;
	srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
	Ok(srs)
}

fn traditional(wkt: &str) -> Result<SpatialRef> {
	let mut srs = SpatialRef::from_wkt(wkt)?;
	srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
	Ok(srs)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{TestRaster, write_geotiff};
	use approx::assert_relative_eq;

	#[test]
	fn open_and_read() -> Result<()> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("dem.tif");
		let grid = ElevationGrid::from_fn(40, 20, Some(-9999.0), |x, y| (x + 100 * y) as f32);
		write_geotiff(&path, &TestRaster::geographic(grid, [7.0, 50.0, 9.0, 51.0]))?;

		let source = GdalSource::open(&path)?;
		assert_eq!((source.info().width, source.info().height), (40, 20));
		assert_eq!(source.info().crs, "EPSG:4326");
		assert_eq!(source.info().nodata, Some(-9999.0));
		assert_relative_eq!(source.info().geo_bbox.x_min, 7.0, epsilon = 1e-6);
		assert_relative_eq!(source.info().geo_bbox.y_max, 51.0, epsilon = 1e-6);

		let block = source.read(3, 2, 2, 2)?;
		assert_eq!(block.values(), &[203.0, 204.0, 303.0, 304.0]);
		Ok(())
	}
}
