use anyhow::{Result, ensure};
use std::fmt::Debug;

/// Latitude limit of the Web Mercator projection in degrees.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;
const MAX_MERCATOR_LNG: f64 = 180.0;

/// Spherical Mercator radius in meters (WGS84 semi-major axis).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// A geographic bounding box in EPSG:4326 degrees.
///
/// The box is defined by its minimum and maximum longitude (x) and latitude (y):
/// - `x_min` (west)
/// - `y_min` (south)
/// - `x_max` (east)
/// - `y_max` (north)
///
/// # Examples
/// ```
/// use demtiles_core::GeoBBox;
///
/// let bbox = GeoBBox::new(-1.0, 50.0, 1.0, 52.0).unwrap();
/// assert_eq!(bbox.as_tuple(), (-1.0, 50.0, 1.0, 52.0));
/// assert!(!bbox.is_empty());
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct GeoBBox {
	pub x_min: f64,
	pub y_min: f64,
	pub x_max: f64,
	pub y_max: f64,
}

impl GeoBBox {
	/// Creates a new `GeoBBox` from `west, south, east, north`.
	///
	/// # Errors
	/// Fails if a coordinate is outside of `[-180, 180]` / `[-90, 90]`, or if a minimum exceeds its maximum.
	#[must_use = "GeoBBox::new returns a Result; handle the error or unwrap"]
	pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<GeoBBox> {
		GeoBBox {
			x_min,
			y_min,
			x_max,
			y_max,
		}
		.checked()
	}

	/// Builds a box from two arbitrary corners, sorting and clamping them into the valid range.
	pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<GeoBBox> {
		ensure!(
			[x0, y0, x1, y1].iter().all(|v| v.is_finite()),
			"corners ({x0}, {y0}, {x1}, {y1}) must be finite"
		);
		GeoBBox {
			x_min: x0.min(x1).clamp(-180.0, 180.0),
			y_min: y0.min(y1).clamp(-90.0, 90.0),
			x_max: x0.max(x1).clamp(-180.0, 180.0),
			y_max: y0.max(y1).clamp(-90.0, 90.0),
		}
		.checked()
	}

	/// Clamps the bounding box *in‑place* to the latitude/longitude limits of the
	/// Web Mercator projection.
	///
	/// # Examples
	/// ```
	/// use demtiles_core::GeoBBox;
	///
	/// let mut bbox = GeoBBox::new(-180.0, -90.0, 180.0, 90.0).unwrap();
	/// bbox.limit_to_mercator();
	/// assert_eq!(
	///     bbox.as_tuple(),
	///     (-180.0, -85.05112877980659, 180.0, 85.05112877980659)
	/// );
	/// ```
	pub fn limit_to_mercator(&mut self) {
		self.x_min = self.x_min.clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
		self.y_min = self.y_min.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
		self.x_max = self.x_max.clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
		self.y_max = self.y_max.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
	}

	/// Returns `[west, south, east, north]`.
	#[must_use]
	pub fn as_array(&self) -> [f64; 4] {
		[self.x_min, self.y_min, self.x_max, self.y_max]
	}

	/// Returns `(west, south, east, north)`.
	#[must_use]
	pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
		(self.x_min, self.y_min, self.x_max, self.y_max)
	}

	/// Extent in degrees of longitude.
	#[must_use]
	pub fn width(&self) -> f64 {
		self.x_max - self.x_min
	}

	/// Extent in degrees of latitude.
	#[must_use]
	pub fn height(&self) -> f64 {
		self.y_max - self.y_min
	}

	/// A box without area. Degenerate boxes cannot be tiled.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.width() <= 0.0 || self.height() <= 0.0
	}

	/// Whether both boxes share an area larger than zero.
	#[cfg(test)]
	pub(crate) fn intersects(&self, other: &GeoBBox) -> bool {
		self.x_min < other.x_max && other.x_min < self.x_max && self.y_min < other.y_max && other.y_min < self.y_max
	}

	fn checked(self) -> Result<Self> {
		ensure!(self.x_min >= -180., "x_min ({}) must be >= -180", self.x_min);
		ensure!(self.y_min >= -90., "y_min ({}) must be >= -90", self.y_min);
		ensure!(self.x_max <= 180., "x_max ({}) must be <= 180", self.x_max);
		ensure!(self.y_max <= 90., "y_max ({}) must be <= 90", self.y_max);
		ensure!(
			self.x_min <= self.x_max,
			"x_min ({}) must be <= x_max ({})",
			self.x_min,
			self.x_max
		);
		ensure!(
			self.y_min <= self.y_max,
			"y_min ({}) must be <= y_max ({})",
			self.y_min,
			self.y_max
		);
		Ok(self)
	}
}

/// Projects a single WGS84 position onto Web‑Mercator meters, clamping latitude to the projection limit.
#[must_use]
pub fn lon_lat_to_mercator(lon_deg: f64, lat_deg: f64) -> [f64; 2] {
	let lon = lon_deg.clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
	let lat = lat_deg.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
	[
		EARTH_RADIUS * lon.to_radians(),
		EARTH_RADIUS * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln(),
	]
}

/// Inverse of [`lon_lat_to_mercator`].
#[must_use]
pub fn mercator_to_lon_lat(x: f64, y: f64) -> [f64; 2] {
	let lon = (x / EARTH_RADIUS).to_degrees();
	let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
	[lon, lat]
}

impl Debug for GeoBBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"GeoBBox({}, {}, {}, {})",
			self.x_min, self.y_min, self.x_max, self.y_max
		)
	}
}

impl TryFrom<[f64; 4]> for GeoBBox {
	type Error = anyhow::Error;

	fn try_from(input: [f64; 4]) -> Result<Self> {
		GeoBBox::new(input[0], input[1], input[2], input[3])
	}
}
