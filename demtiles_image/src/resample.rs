//! Lanczos resampling of elevation grids.
//!
//! Invalid samples would smear into their neighbours if they were resampled as-is. They are therefore
//! replaced by the mean of the valid samples first, and validity is resampled separately as a coverage
//! mask: a destination pixel is valid when at least half of its footprint was covered by valid samples.

use crate::ElevationGrid;
use anyhow::{Result, bail, ensure};
use demtiles_derive::context;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};

/// A rectangle in fractional pixel coordinates of a grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl CropRect {
	#[must_use]
	pub fn new(x: f64, y: f64, width: f64, height: f64) -> CropRect {
		CropRect { x, y, width, height }
	}

	/// The whole grid.
	#[must_use]
	pub fn full(grid: &ElevationGrid) -> CropRect {
		CropRect::new(0.0, 0.0, f64::from(grid.width()), f64::from(grid.height()))
	}

	/// Clips the rectangle to `0..width` × `0..height`.
	#[must_use]
	pub fn clipped(&self, width: u32, height: u32) -> CropRect {
		let x0 = self.x.clamp(0.0, f64::from(width));
		let y0 = self.y.clamp(0.0, f64::from(height));
		let x1 = (self.x + self.width).clamp(0.0, f64::from(width));
		let y1 = (self.y + self.height).clamp(0.0, f64::from(height));
		CropRect::new(x0, y0, x1 - x0, y1 - y0)
	}
}

/// Result of [`resample`]: resampled elevations and their validity.
#[derive(Clone, Debug, PartialEq)]
pub struct Resampled {
	pub width: u32,
	pub height: u32,
	pub values: Vec<f32>,
	pub valid: Vec<bool>,
}

impl Resampled {
	/// Value and validity at column `x`, row `y`.
	#[must_use]
	pub fn get(&self, x: u32, y: u32) -> Option<(f32, bool)> {
		if x >= self.width || y >= self.height {
			return None;
		}
		let i = y as usize * self.width as usize + x as usize;
		Some((self.values[i], self.valid[i]))
	}

	#[must_use]
	pub fn count_valid(&self) -> usize {
		self.valid.iter().filter(|v| **v).count()
	}
}

/// Resamples the `crop` region of `grid` to `dst_width` × `dst_height` pixels with a Lanczos3 filter.
///
/// # Errors
/// Fails if the grid has no valid samples, the destination is empty, or the crop does not overlap the grid.
#[context("Failed to resample {grid:?} region {crop:?} to {dst_width}x{dst_height}")]
pub fn resample(grid: &ElevationGrid, crop: CropRect, dst_width: u32, dst_height: u32) -> Result<Resampled> {
	ensure!(dst_width > 0 && dst_height > 0, "destination must not be empty");
	ensure!(!grid.is_empty(), "source grid is empty");

	let crop = crop.clipped(grid.width(), grid.height());
	ensure!(
		crop.width > 0.0 && crop.height > 0.0,
		"crop region does not overlap the grid"
	);

	let Some(fill) = grid.mean() else {
		bail!("source grid has no valid samples");
	};

	let all_valid = grid.count_valid() == grid.values().len();
	let filled: Vec<f32> = if all_valid {
		grid.values().to_vec()
	} else {
		grid
			.values()
			.iter()
			.map(|v| if grid.is_valid(*v) { *v } else { fill })
			.collect()
	};

	let (w, h) = (grid.width(), grid.height());
	let values = resize_f32(&filled, w, h, crop, dst_width, dst_height, FilterType::Lanczos3)?;

	let valid = if all_valid {
		vec![true; values.len()]
	} else {
		let mask: Vec<f32> = grid
			.values()
			.iter()
			.map(|v| if grid.is_valid(*v) { 1.0 } else { 0.0 })
			.collect();
		resize_f32(&mask, w, h, crop, dst_width, dst_height, FilterType::Bilinear)?
			.into_iter()
			.map(|coverage| coverage >= 0.5)
			.collect()
	};

	Ok(Resampled {
		width: dst_width,
		height: dst_height,
		values,
		valid,
	})
}

fn resize_f32(
	values: &[f32],
	width: u32,
	height: u32,
	crop: CropRect,
	dst_width: u32,
	dst_height: u32,
	filter: FilterType,
) -> Result<Vec<f32>> {
	let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
	let src = Image::from_vec_u8(width, height, bytes, PixelType::F32)?;
	let mut dst = Image::new(dst_width, dst_height, PixelType::F32);

	let options = ResizeOptions::default()
		.resize_alg(ResizeAlg::Convolution(filter))
		.crop(crop.x, crop.y, crop.width, crop.height);
	Resizer::new().resize(&src, &mut dst, &options)?;

	Ok(dst
		.buffer()
		.chunks_exact(4)
		.map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;

	#[test]
	fn constant_grid_stays_constant() {
		let grid = ElevationGrid::from_fn(7, 5, None, |_, _| 42.0);
		let out = resample(&grid, CropRect::full(&grid), 16, 16).unwrap();
		assert_eq!((out.width, out.height), (16, 16));
		for v in &out.values {
			assert_abs_diff_eq!(*v, 42.0, epsilon = 1e-3);
		}
		assert_eq!(out.count_valid(), 256);
	}

	#[test]
	fn linear_ramp_is_preserved() {
		// x = 0.5 .. 63.5 in pixel centers, upscaled 4x
		let grid = ElevationGrid::from_fn(64, 4, None, |x, _| x as f32);
		let out = resample(&grid, CropRect::full(&grid), 256, 16).unwrap();
		for x in [32u32, 100, 200] {
			let (v, valid) = out.get(x, 8).unwrap();
			assert!(valid);
			// destination pixel center maps back to (x + 0.5) / 4 - 0.5 in source sample units
			let expected = (x as f32 + 0.5) / 4.0 - 0.5;
			assert_abs_diff_eq!(v, expected, epsilon = 0.05);
		}
	}

	#[test]
	fn crop_selects_region() {
		let grid = ElevationGrid::from_fn(16, 4, None, |x, _| x as f32 * 10.0);

		let out = resample(&grid, CropRect::new(2.0, 0.0, 4.0, 4.0), 4, 4).unwrap();
		for x in 0..4 {
			assert_abs_diff_eq!(out.get(x, 2).unwrap().0, (x + 2) as f32 * 10.0, epsilon = 1e-3);
		}

		// half a sample to the east
		let out = resample(&grid, CropRect::new(6.5, 0.0, 4.0, 4.0), 4, 4).unwrap();
		for x in 0..4 {
			assert_abs_diff_eq!(out.get(x, 2).unwrap().0, (x as f32 + 6.5) * 10.0, epsilon = 0.5);
		}
	}

	#[test]
	fn nodata_half_becomes_invalid() {
		let grid = ElevationGrid::from_fn(8, 8, Some(-1.0), |x, _| if x < 4 { -1.0 } else { 10.0 });
		let out = resample(&grid, CropRect::full(&grid), 16, 16).unwrap();
		let (_, left) = out.get(1, 8).unwrap();
		let (value, right) = out.get(14, 8).unwrap();
		assert!(!left);
		assert!(right);
		assert_abs_diff_eq!(value, 10.0, epsilon = 1e-3);
		assert_eq!(out.count_valid(), 128);
	}

	#[test]
	fn nan_is_invalid() {
		let grid = ElevationGrid::new(2, 1, vec![f32::NAN, 3.0], None).unwrap();
		let out = resample(&grid, CropRect::full(&grid), 2, 1).unwrap();
		assert_eq!(out.valid, vec![false, true]);
		assert!(out.values.iter().all(|v| v.is_finite()));
	}

	#[test]
	fn errors() {
		let nodata = ElevationGrid::from_fn(2, 2, Some(0.0), |_, _| 0.0);
		let err = resample(&nodata, CropRect::full(&nodata), 4, 4).unwrap_err();
		assert_eq!(err.root_cause().to_string(), "source grid has no valid samples");

		let grid = ElevationGrid::from_fn(2, 2, None, |_, _| 1.0);
		assert!(resample(&grid, CropRect::full(&grid), 0, 4).is_err());
		assert!(resample(&grid, CropRect::new(5.0, 5.0, 1.0, 1.0), 4, 4).is_err());
	}

	#[test]
	fn clipped_rect() {
		let rect = CropRect::new(-2.0, 1.0, 10.0, 10.0).clipped(6, 4);
		assert_eq!(rect, CropRect::new(0.0, 1.0, 6.0, 3.0));
	}
}
