//! The tile index: rectangular sets of tiles at one zoom level.
//!
//! A `TileBBox` stores the minimum tile and the size in tiles. Maximum coordinates are inclusive,
//! `y` grows southwards, and a box with `width == 0` or `height == 0` is empty.
//!
//! ```
//! use demtiles_core::{GeoBBox, TileBBox};
//!
//! let geo = GeoBBox::new(-1.0, 50.0, 1.0, 52.0).unwrap();
//! let bbox = TileBBox::from_geo(10, &geo).unwrap();
//! assert_eq!((bbox.x_min(), bbox.y_min(), bbox.x_max(), bbox.y_max()), (509, 338, 514, 347));
//! assert_eq!(bbox.count_tiles(), 60);
//! ```

use crate::{GeoBBox, TileCoord};
use anyhow::{Result, ensure};
use demtiles_derive::context;
use std::fmt::{self, Debug};

/// A rectangular region of tiles at a specific zoom level.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct TileBBox {
	/// Zoom level of the bounding box.
	pub level: u8,
	x_min: u32,
	y_min: u32,
	width: u32,
	height: u32,
}

impl TileBBox {
	/// Create from the minimum and the inclusive maximum tile.
	///
	/// # Errors
	/// Fails if `level` > 31, if a maximum is smaller than its minimum, or if a coordinate lies outside the level.
	#[context("Failed to create TileBBox from min ({x_min}, {y_min}) and max ({x_max}, {y_max}) at level {level}")]
	pub fn from_min_and_max(level: u8, x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Result<TileBBox> {
		ensure!(level <= 31, "level ({level}) must be <= 31");

		let max = (1u32 << level) - 1;

		ensure!(x_min <= x_max, "x_min ({x_min}) must be <= x_max ({x_max})");
		ensure!(y_min <= y_max, "y_min ({y_min}) must be <= y_max ({y_max})");
		ensure!(x_max <= max, "x_max ({x_max}) must be <= max ({max})");
		ensure!(y_max <= max, "y_max ({y_max}) must be <= max ({max})");

		Ok(TileBBox {
			level,
			x_min,
			y_min,
			width: x_max + 1 - x_min,
			height: y_max + 1 - y_min,
		})
	}

	/// The tiles covering `bbox` at `level`.
	///
	/// The box is shrunk by a tiny epsilon first, so edges that fall exactly on a tile border do not pull in
	/// the neighbouring row or column. Latitudes beyond the Web Mercator limit end up in the first or last row.
	///
	/// # Errors
	/// Fails if `level` > 31 or the box contains coordinates outside of the WGS84 range.
	#[context("Failed to compute tiles covering {bbox:?} at level {level}")]
	pub fn from_geo(level: u8, bbox: &GeoBBox) -> Result<TileBBox> {
		ensure!(level <= 31, "level ({level}) must be <= 31");

		let x_min = (bbox.x_min + 1e-10).min(bbox.x_max);
		let y_max = (bbox.y_max - 1e-10).max(bbox.y_min);
		let x_max = (bbox.x_max - 1e-10).max(x_min);
		let y_min = (bbox.y_min + 1e-10).min(y_max);

		let p_min = TileCoord::from_geo(x_min, y_max, level)?;
		let p_max = TileCoord::from_geo(x_max, y_min, level)?;

		TileBBox::from_min_and_max(level, p_min.x, p_min.y, p_max.x, p_max.y)
	}

	#[must_use]
	#[inline]
	pub fn x_min(&self) -> u32 {
		self.x_min
	}

	#[must_use]
	#[inline]
	pub fn y_min(&self) -> u32 {
		self.y_min
	}

	/// Inclusive maximum x.
	#[must_use]
	#[inline]
	pub fn x_max(&self) -> u32 {
		self.x_min + self.width - 1
	}

	/// Inclusive maximum y.
	#[must_use]
	#[inline]
	pub fn y_max(&self) -> u32 {
		self.y_min + self.height - 1
	}

	#[must_use]
	#[inline]
	pub fn width(&self) -> u32 {
		self.width
	}

	#[must_use]
	#[inline]
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Number of tiles in the box.
	#[must_use]
	pub fn count_tiles(&self) -> u64 {
		u64::from(self.width) * u64::from(self.height)
	}

	/// Iterates all tile coordinates of the box in row-major order (north to south, west to east).
	pub fn iter_coords(&self) -> impl Iterator<Item = TileCoord> + use<> {
		let level = self.level;
		let (x_min, width) = (self.x_min, self.width);
		(self.y_min..self.y_min + self.height)
			.flat_map(move |y| (x_min..x_min + width).map(move |x| TileCoord { level, x, y }))
	}
}

impl Debug for TileBBox {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}: [{},{},{},{}] ({})",
			self.level,
			self.x_min,
			self.y_min,
			self.x_max(),
			self.y_max(),
			self.count_tiles()
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	fn geo(x0: f64, y0: f64, x1: f64, y1: f64) -> GeoBBox {
		GeoBBox::new(x0, y0, x1, y1).unwrap()
	}

	#[test]
	fn from_min_and_max() {
		let bbox = TileBBox::from_min_and_max(3, 2, 1, 4, 2).unwrap();
		assert_eq!((bbox.width(), bbox.height()), (3, 2));
		assert_eq!(bbox.count_tiles(), 6);
		assert!(TileBBox::from_min_and_max(3, 4, 1, 2, 2).is_err());
		assert!(TileBBox::from_min_and_max(3, 0, 0, 8, 2).is_err());
		assert!(TileBBox::from_min_and_max(32, 0, 0, 0, 0).is_err());
	}

	#[rstest]
	#[case(10, [-1.0, 50.0, 1.0, 52.0], [509, 338, 514, 347], 60)]
	#[case(9, [8.0653, 51.3563, 12.3528, 52.2564], [267, 168, 273, 170], 21)]
	#[case(0, [-180.0, -90.0, 180.0, 90.0], [0, 0, 0, 0], 1)]
	#[case(2, [-180.0, -90.0, 180.0, 90.0], [0, 0, 3, 3], 16)]
	fn from_geo(#[case] level: u8, #[case] bbox: [f64; 4], #[case] expected: [u32; 4], #[case] count: u64) {
		let tiles = TileBBox::from_geo(level, &geo(bbox[0], bbox[1], bbox[2], bbox[3])).unwrap();
		assert_eq!(
			[tiles.x_min(), tiles.y_min(), tiles.x_max(), tiles.y_max()],
			expected
		);
		assert_eq!(tiles.count_tiles(), count);
	}

	#[test]
	fn from_geo_on_tile_border_excludes_neighbours() {
		// exactly one tile at level 1: the north-east quadrant of the mercator world
		let bbox = TileCoord::new(1, 1, 0).unwrap().to_geo_bbox();
		let tiles = TileBBox::from_geo(1, &bbox).unwrap();
		assert_eq!(tiles, TileBBox::from_min_and_max(1, 1, 0, 1, 0).unwrap());
	}

	#[test]
	fn from_geo_of_point_is_one_tile() {
		let tiles = TileBBox::from_geo(14, &geo(-132.0, -40.0, -132.0, -40.0)).unwrap();
		assert_eq!(tiles.count_tiles(), 1);
	}

	#[test]
	fn iter_coords_is_row_major() {
		let bbox = TileBBox::from_min_and_max(4, 5, 6, 6, 7).unwrap();
		let coords: Vec<String> = bbox.iter_coords().map(|c| c.to_string()).collect();
		assert_eq!(coords, vec!["4/5/6", "4/6/6", "4/5/7", "4/6/7"]);
	}

	#[test]
	fn every_covering_tile_intersects_the_area() {
		let area = geo(-1.0, 50.0, 1.0, 52.0);
		let tiles = TileBBox::from_geo(12, &area).unwrap();
		assert_eq!(tiles.iter_coords().count() as u64, tiles.count_tiles());
		for coord in tiles.iter_coords() {
			assert!(coord.to_geo_bbox().intersects(&area), "{coord} does not touch {area:?}");
		}
	}

	#[test]
	fn debug_format() {
		let bbox = TileBBox::from_min_and_max(10, 509, 338, 514, 347).unwrap();
		assert_eq!(format!("{bbox:?}"), "10: [509,338,514,347] (60)");
	}
}
