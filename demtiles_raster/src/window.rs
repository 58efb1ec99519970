use demtiles_image::ElevationGrid;

/// A fractional rectangle in the pixel space of a raster: `(col_off, row_off, width, height)`.
///
/// Windows may extend beyond the raster or lie completely outside of it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelWindow {
	pub col_off: f64,
	pub row_off: f64,
	pub width: f64,
	pub height: f64,
}

impl PixelWindow {
	#[must_use]
	pub fn new(col_off: f64, row_off: f64, width: f64, height: f64) -> PixelWindow {
		PixelWindow {
			col_off,
			row_off,
			width,
			height,
		}
	}

	/// The window spanned by two pixel positions, in any order.
	#[must_use]
	pub fn from_corners([c0, r0]: [f64; 2], [c1, r1]: [f64; 2]) -> PixelWindow {
		PixelWindow::new(c0.min(c1), r0.min(r1), (c1 - c0).abs(), (r1 - r0).abs())
	}

	/// Width or height is not positive (or not a number).
	#[must_use]
	pub fn is_empty(&self) -> bool {
		!(self.width > 0.0 && self.height > 0.0)
	}

	#[must_use]
	pub fn col_end(&self) -> f64 {
		self.col_off + self.width
	}

	#[must_use]
	pub fn row_end(&self) -> f64 {
		self.row_off + self.height
	}

	/// The part of the window inside a `width` × `height` raster, `None` if there is no overlap.
	#[must_use]
	pub fn clipped(&self, width: u32, height: u32) -> Option<PixelWindow> {
		if self.is_empty() {
			return None;
		}
		let c0 = self.col_off.max(0.0);
		let r0 = self.row_off.max(0.0);
		let c1 = self.col_end().min(f64::from(width));
		let r1 = self.row_end().min(f64::from(height));
		let clipped = PixelWindow::new(c0, r0, c1 - c0, r1 - r0);
		(!clipped.is_empty()).then_some(clipped)
	}

	/// Whole pixels touched by the part of the window inside the raster, as
	/// `(col_off, row_off, width, height)`.
	#[must_use]
	pub fn pixel_bounds(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
		let clipped = self.clipped(width, height)?;
		let c0 = clipped.col_off.floor() as u32;
		let r0 = clipped.row_off.floor() as u32;
		let c1 = (clipped.col_end().ceil() as u32).min(width);
		let r1 = (clipped.row_end().ceil() as u32).min(height);
		(c1 > c0 && r1 > r0).then_some((c0, r0, c1 - c0, r1 - r0))
	}
}

/// Samples read for a window: the grid plus the position of its top-left sample in the raster.
#[derive(Clone, Debug, PartialEq)]
pub struct ElevationBlock {
	pub col_off: u32,
	pub row_off: u32,
	pub grid: ElevationGrid,
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn empty_windows() {
		assert!(PixelWindow::new(0.0, 0.0, 0.0, 5.0).is_empty());
		assert!(PixelWindow::new(0.0, 0.0, 5.0, -1.0).is_empty());
		assert!(PixelWindow::new(0.0, 0.0, f64::NAN, 1.0).is_empty());
		assert!(!PixelWindow::new(-3.0, -3.0, 1.0, 1.0).is_empty());
	}

	#[test]
	fn from_corners_sorts() {
		let window = PixelWindow::from_corners([10.0, 2.0], [4.0, 8.0]);
		assert_eq!(window, PixelWindow::new(4.0, 2.0, 6.0, 6.0));
	}

	#[test]
	fn clipping() {
		let window = PixelWindow::new(-2.5, 3.25, 10.0, 10.0);
		assert_eq!(window.clipped(6, 8), Some(PixelWindow::new(0.0, 3.25, 6.0, 4.75)));
		assert_eq!(window.pixel_bounds(6, 8), Some((0, 3, 6, 5)));

		let outside = PixelWindow::new(20.0, 0.0, 5.0, 5.0);
		assert_eq!(outside.clipped(6, 8), None);
		assert_eq!(outside.pixel_bounds(6, 8), None);
	}

	#[test]
	fn fractional_window_touches_partial_pixels() {
		let window = PixelWindow::new(1.5, 1.5, 1.0, 1.0);
		assert_eq!(window.pixel_bounds(10, 10), Some((1, 1, 2, 2)));
	}
}
