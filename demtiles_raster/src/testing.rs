//! Helpers for writing small GeoTIFF fixtures in tests.

use crate::{
	Crs,
	geotiff::{GDAL_NODATA, GEO_KEY_DIRECTORY, MODEL_PIXEL_SCALE, MODEL_TIEPOINT, directory_for},
};
use anyhow::{Context, Result, ensure};
use demtiles_image::ElevationGrid;
use std::{fs::File, path::Path};
use tiff::{
	encoder::{TiffEncoder, colortype::Gray32Float},
	tags::Tag,
};

/// A north-up single band `f32` raster to be written as GeoTIFF.
#[derive(Clone, Debug)]
pub struct TestRaster {
	pub grid: ElevationGrid,
	pub geo_transform: [f64; 6],
	pub crs: Crs,
	pub rows_per_strip: u32,
}

impl TestRaster {
	/// An EPSG:4326 raster stretched over `[x_min, y_min, x_max, y_max]`.
	pub fn geographic(grid: ElevationGrid, [x0, y0, x1, y1]: [f64; 4]) -> TestRaster {
		let geo_transform = [
			x0,
			(x1 - x0) / f64::from(grid.width()),
			0.0,
			y1,
			0.0,
			-(y1 - y0) / f64::from(grid.height()),
		];
		TestRaster {
			grid,
			geo_transform,
			crs: Crs::Geographic,
			rows_per_strip: 16,
		}
	}
}

/// Writes `raster` to `path`, with the grid's nodata value as `GDAL_NODATA`.
pub fn write_geotiff(path: &Path, raster: &TestRaster) -> Result<()> {
	let gt = raster.geo_transform;
	ensure!(gt[2] == 0.0 && gt[4] == 0.0, "test rasters must be north-up");

	let mut file = File::create(path).with_context(|| format!("Failed to create {path:?}"))?;
	let mut tiff = TiffEncoder::new(&mut file)?;
	let mut image = tiff.new_image::<Gray32Float>(raster.grid.width(), raster.grid.height())?;
	image.rows_per_strip(raster.rows_per_strip)?;

	let encoder = image.encoder();
	encoder.write_tag(
		Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE),
		&[gt[1], -gt[5], 0.0][..],
	)?;
	encoder.write_tag(
		Tag::from_u16_exhaustive(MODEL_TIEPOINT),
		&[0.0, 0.0, 0.0, gt[0], gt[3], 0.0][..],
	)?;
	encoder.write_tag(
		Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY),
		&directory_for(raster.crs)[..],
	)?;
	if let Some(nodata) = raster.grid.nodata() {
		encoder.write_tag(Tag::from_u16_exhaustive(GDAL_NODATA), nodata.to_string().as_str())?;
	}

	image.write_data(raster.grid.values())?;
	Ok(())
}
