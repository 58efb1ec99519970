use anyhow::{Result, ensure};
use std::fmt::{self, Debug};

/// Affine pixel → CRS transform in GDAL order:
/// `[origin_x, pixel_width, rotation_x, origin_y, rotation_y, pixel_height]`.
///
/// Only north-up transforms are supported, so both rotation terms must be zero.
///
/// ```
/// use demtiles_raster::GeoTransform;
///
/// let gt = GeoTransform::new([-1.0, 0.01, 0.0, 52.0, 0.0, -0.01]).unwrap();
/// assert_eq!(gt.pixel_to_crs(100.0, 200.0), [0.0, 50.0]);
/// assert_eq!(gt.crs_to_pixel(0.0, 50.0), [100.0, 200.0]);
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct GeoTransform([f64; 6]);

impl GeoTransform {
	/// # Errors
	/// Fails for rotated or sheared transforms, zero pixel sizes, and non-finite values.
	pub fn new(gt: [f64; 6]) -> Result<GeoTransform> {
		ensure!(gt.iter().all(|v| v.is_finite()), "geotransform {gt:?} must be finite");
		ensure!(
			gt[2] == 0.0 && gt[4] == 0.0,
			"rotated geotransforms are not supported: {gt:?}"
		);
		ensure!(
			gt[1] != 0.0 && gt[5] != 0.0,
			"geotransform {gt:?} has a zero pixel size"
		);
		Ok(GeoTransform(gt))
	}

	/// From a GeoTIFF tie point (`[i, j, k, x, y, z]`) and pixel scale (`[sx, sy, sz]`).
	pub fn from_tiepoint_and_scale(tiepoint: &[f64], scale: &[f64]) -> Result<GeoTransform> {
		ensure!(tiepoint.len() >= 6, "ModelTiepoint needs 6 values, got {}", tiepoint.len());
		ensure!(scale.len() >= 2, "ModelPixelScale needs at least 2 values, got {}", scale.len());
		let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
		let (sx, sy) = (scale[0], scale[1]);
		GeoTransform::new([x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy])
	}

	/// From the 4×4 row-major GeoTIFF `ModelTransformation` matrix.
	pub fn from_model_transformation(matrix: &[f64]) -> Result<GeoTransform> {
		ensure!(
			matrix.len() >= 16,
			"ModelTransformation needs 16 values, got {}",
			matrix.len()
		);
		GeoTransform::new([matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5]])
	}

	#[must_use]
	pub fn as_array(&self) -> [f64; 6] {
		self.0
	}

	#[must_use]
	pub fn origin(&self) -> [f64; 2] {
		[self.0[0], self.0[3]]
	}

	/// Pixel width and height in CRS units. The height is negative for north-up rasters.
	#[must_use]
	pub fn pixel_size(&self) -> [f64; 2] {
		[self.0[1], self.0[5]]
	}

	/// Moves the origin by a fraction of a pixel, e.g. `(-0.5, -0.5)` for `PixelIsPoint` rasters.
	#[must_use]
	pub fn shifted(&self, cols: f64, rows: f64) -> GeoTransform {
		let mut gt = self.0;
		gt[0] += cols * gt[1];
		gt[3] += rows * gt[5];
		GeoTransform(gt)
	}

	#[must_use]
	pub fn pixel_to_crs(&self, col: f64, row: f64) -> [f64; 2] {
		[self.0[0] + col * self.0[1], self.0[3] + row * self.0[5]]
	}

	#[must_use]
	pub fn crs_to_pixel(&self, x: f64, y: f64) -> [f64; 2] {
		[(x - self.0[0]) / self.0[1], (y - self.0[3]) / self.0[5]]
	}

	/// Extent of a `width` × `height` raster as `[x_min, y_min, x_max, y_max]`.
	#[must_use]
	pub fn bounds(&self, width: u32, height: u32) -> [f64; 4] {
		let [x0, y0] = self.pixel_to_crs(0.0, 0.0);
		let [x1, y1] = self.pixel_to_crs(f64::from(width), f64::from(height));
		[x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]
	}
}

impl Debug for GeoTransform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "GeoTransform({:?})", self.0)
	}
}
