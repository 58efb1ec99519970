use crate::{Crs, GeoTransform, RasterInfo, RasterSource};
use anyhow::{Result, ensure};
use demtiles_core::GeoBBox;
use demtiles_image::ElevationGrid;

/// A raster held in memory, mostly useful for tests and for data produced on the fly.
#[derive(Debug)]
pub struct MemorySource {
	info: RasterInfo,
	crs: Crs,
	grid: ElevationGrid,
}

impl MemorySource {
	/// # Errors
	/// Fails if the transform is rotated or the bounds are degenerate.
	pub fn new(grid: ElevationGrid, geo_transform: [f64; 6], crs: Crs) -> Result<MemorySource> {
		ensure!(!grid.is_empty(), "in-memory raster must not be empty");
		let geo_transform = GeoTransform::new(geo_transform)?;
		let native_bounds = geo_transform.bounds(grid.width(), grid.height());
		let geo_bbox = crs.bounds_to_geo(native_bounds)?;
		Ok(MemorySource {
			info: RasterInfo {
				width: grid.width(),
				height: grid.height(),
				geo_transform,
				crs: crs.to_string(),
				native_bounds,
				geo_bbox,
				nodata: grid.nodata(),
			},
			crs,
			grid,
		})
	}

	/// A geographic (EPSG:4326) raster covering `bbox` with `grid`.
	pub fn covering(bbox: &GeoBBox, grid: ElevationGrid) -> Result<MemorySource> {
		let gt = [
			bbox.x_min,
			bbox.width() / f64::from(grid.width()),
			0.0,
			bbox.y_max,
			0.0,
			-bbox.height() / f64::from(grid.height()),
		];
		MemorySource::new(grid, gt, Crs::Geographic)
	}
}

impl RasterSource for MemorySource {
	fn info(&self) -> &RasterInfo {
		&self.info
	}

	fn geo_to_native(&self, bbox: &GeoBBox) -> Result<[f64; 4]> {
		Ok(self.crs.geo_to_bounds(bbox))
	}

	fn read(&self, col_off: u32, row_off: u32, width: u32, height: u32) -> Result<ElevationGrid> {
		ensure!(
			col_off + width <= self.grid.width() && row_off + height <= self.grid.height(),
			"window ({col_off}, {row_off}, {width}, {height}) exceeds raster of {}x{}",
			self.grid.width(),
			self.grid.height()
		);
		let stride = self.grid.width() as usize;
		let values = self.grid.values();
		let mut out = Vec::with_capacity(width as usize * height as usize);
		for row in row_off..row_off + height {
			let start = row as usize * stride + col_off as usize;
			out.extend_from_slice(&values[start..start + width as usize]);
		}
		ElevationGrid::new(width, height, out, self.grid.nodata())
	}
}
