//! Tile coordinates in the XYZ (slippy map) Web Mercator pyramid.
//!
//! ```
//! use demtiles_core::TileCoord;
//!
//! let coord = TileCoord::from_geo(-0.1276, 51.5072, 10).unwrap();
//! assert_eq!((coord.level, coord.x, coord.y), (10, 511, 340));
//! assert_eq!(coord.to_string(), "10/511/340");
//! ```

use crate::GeoBBox;
use anyhow::{Result, ensure};
use demtiles_derive::context;
use std::{
	f64::consts::PI,
	fmt::{self, Debug, Display},
};

/// A tile coordinate with zoom `level` and `x`/`y` indices. `y` grows southwards.
#[derive(Eq, PartialEq, Clone, Hash, Copy, PartialOrd, Ord)]
pub struct TileCoord {
	/// The zoom level of the tile.
	pub level: u8,
	/// The x index of the tile.
	pub x: u32,
	/// The y index of the tile.
	pub y: u32,
}

impl TileCoord {
	/// Create a new `TileCoord`.
	///
	/// # Errors
	/// Returns an error if `level` > 31 or if `x`/`y` are outside of `0..2^level`.
	pub fn new(level: u8, x: u32, y: u32) -> Result<TileCoord> {
		ensure!(level <= 31, "level ({level}) must be <= 31");
		let max = 1u32 << level;
		ensure!(x < max, "x ({x}) out of bounds for level {level}");
		ensure!(y < max, "y ({y}) out of bounds for level {level}");
		Ok(TileCoord { level, x, y })
	}

	/// Find the tile containing the position (`lon`, `lat`) at zoom `level`.
	///
	/// Positions on the far east or south edge are clamped onto the last tile.
	#[context("Failed to convert geo coordinates ({lon}, {lat}, {level}) to TileCoord")]
	pub fn from_geo(lon: f64, lat: f64, level: u8) -> Result<TileCoord> {
		ensure!(level <= 31, "level ({level}) must be <= 31");
		ensure!((-180.0..=180.0).contains(&lon), "lon ({lon}) must be within [-180, 180]");
		ensure!((-90.0..=90.0).contains(&lat), "lat ({lat}) must be within [-90, 90]");

		let zoom: f64 = f64::from(1u32 << level);
		let x = zoom * (lon / 360.0 + 0.5);
		let y = zoom * (0.5 - 0.5 * (lat * PI / 360.0 + PI / 4.0).tan().ln() / PI);

		TileCoord::new(
			level,
			x.clamp(0.0, zoom - 1.0).floor() as u32,
			y.clamp(0.0, zoom - 1.0).floor() as u32,
		)
	}

	/// Position of the north-west corner of tile (`x`, `y`) at `level` as `[lon, lat]`.
	///
	/// `x` and `y` may equal `2^level` to address the east and south edge of the world.
	#[must_use]
	pub fn coord_to_geo(level: u8, x: u32, y: u32) -> [f64; 2] {
		let zoom: f64 = 2.0f64.powi(i32::from(level));
		[
			(f64::from(x) / zoom - 0.5) * 360.0,
			((PI * (1.0 - 2.0 * f64::from(y) / zoom)).exp().atan() / PI - 0.25) * 360.0,
		]
	}

	/// Geographic extent of this tile.
	#[must_use]
	pub fn to_geo_bbox(&self) -> GeoBBox {
		let [west, north] = TileCoord::coord_to_geo(self.level, self.x, self.y);
		let [east, south] = TileCoord::coord_to_geo(self.level, self.x + 1, self.y + 1);
		GeoBBox {
			x_min: west,
			y_min: south,
			x_max: east,
			y_max: north,
		}
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TileCoord({}, [{}, {}])", self.level, self.x, self.y)
	}
}

/// Formats the coordinate in `z/x/y` order, the way tile URLs address it.
impl Display for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.level, self.x, self.y)
	}
}
