use crate::{ElevationBlock, GeoTransform, PixelWindow};
use anyhow::Result;
use demtiles_core::GeoBBox;
use demtiles_image::ElevationGrid;
use std::fmt::Debug;

/// Rows scanned per read when computing statistics over a whole raster.
const SCAN_ROWS: u32 = 256;

/// Georeferencing metadata of an opened raster.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterInfo {
	pub width: u32,
	pub height: u32,
	pub geo_transform: GeoTransform,
	/// Human readable CRS, e.g. `EPSG:4326`.
	pub crs: String,
	/// Extent in the native CRS as `[x_min, y_min, x_max, y_max]`.
	pub native_bounds: [f64; 4],
	/// Extent in EPSG:4326, clamped to the Web Mercator latitude limits.
	pub geo_bbox: GeoBBox,
	pub nodata: Option<f32>,
}

/// Read access to the first band of a georeferenced elevation raster.
///
/// Sources are shared between render workers, so reads take `&self`.
pub trait RasterSource: Debug + Send + Sync {
	fn info(&self) -> &RasterInfo;

	/// Geographic bounds → native extent `[x_min, y_min, x_max, y_max]`.
	fn geo_to_native(&self, bbox: &GeoBBox) -> Result<[f64; 4]>;

	/// Reads `width` × `height` samples starting at column `col_off`, row `row_off`.
	///
	/// The rectangle must lie inside the raster.
	fn read(&self, col_off: u32, row_off: u32, width: u32, height: u32) -> Result<ElevationGrid>;

	/// The fractional pixel window covering `bbox`. It may be empty or outside of the raster.
	fn pixel_window(&self, bbox: &GeoBBox) -> Result<PixelWindow> {
		let [x0, y0, x1, y1] = self.geo_to_native(bbox)?;
		let gt = &self.info().geo_transform;
		Ok(PixelWindow::from_corners(
			gt.crs_to_pixel(x0, y1),
			gt.crs_to_pixel(x1, y0),
		))
	}

	/// Reads the whole pixels touched by `window`, clipped to the raster. `None` if nothing overlaps.
	fn read_window(&self, window: &PixelWindow) -> Result<Option<ElevationBlock>> {
		let info = self.info();
		let Some((col_off, row_off, width, height)) = window.pixel_bounds(info.width, info.height) else {
			return Ok(None);
		};
		let grid = self.read(col_off, row_off, width, height)?;
		Ok(Some(ElevationBlock { col_off, row_off, grid }))
	}

	/// Minimum and maximum valid sample of the whole raster, using `nodata` as nodata value.
	fn value_range(&self, nodata: Option<f32>) -> Result<Option<(f32, f32)>> {
		let info = self.info();
		let mut range: Option<(f32, f32)> = None;
		let mut row = 0;
		while row < info.height {
			let rows = SCAN_ROWS.min(info.height - row);
			let grid = self.read(0, row, info.width, rows)?.with_nodata(nodata);
			if let Some((min, max)) = grid.value_range() {
				range = Some(match range {
					None => (min, max),
					Some((a, b)) => (a.min(min), b.max(max)),
				});
			}
			row += rows;
		}
		Ok(range)
	}
}
