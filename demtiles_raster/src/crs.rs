use anyhow::{Result, bail, ensure};
use demtiles_core::{GeoBBox, lon_lat_to_mercator, mercator_to_lon_lat};
use std::fmt::{self, Display};

/// Coordinate reference systems the pure Rust reader can project without GDAL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crs {
	/// Longitude/latitude in degrees (EPSG:4326 and compatible datums).
	Geographic,
	/// Spherical Web Mercator in meters (EPSG:3857).
	WebMercator,
}

impl Crs {
	/// # Errors
	/// Fails for codes other than geographic WGS84 or Web Mercator.
	pub fn from_epsg(code: u32) -> Result<Crs> {
		Ok(match code {
			4326 | 4258 | 4269 | 4979 => Crs::Geographic,
			3857 | 3785 | 900_913 | 102_100 | 102_113 => Crs::WebMercator,
			_ => bail!("EPSG:{code} is not supported without the `gdal` feature (supported: EPSG:4326, EPSG:3857)"),
		})
	}

	#[must_use]
	pub fn epsg(&self) -> u32 {
		match self {
			Crs::Geographic => 4326,
			Crs::WebMercator => 3857,
		}
	}

	/// Native extent `[x_min, y_min, x_max, y_max]` → geographic bounds, clamped to the Web Mercator limits.
	///
	/// # Errors
	/// Fails if the clamped bounds are degenerate.
	pub fn bounds_to_geo(&self, bounds: [f64; 4]) -> Result<GeoBBox> {
		let [x0, y0, x1, y1] = bounds;
		let mut bbox = match self {
			Crs::Geographic => GeoBBox::from_corners(x0, y0, x1, y1)?,
			Crs::WebMercator => {
				let [lon0, lat0] = mercator_to_lon_lat(x0, y0);
				let [lon1, lat1] = mercator_to_lon_lat(x1, y1);
				GeoBBox::from_corners(lon0, lat0, lon1, lat1)?
			}
		};
		bbox.limit_to_mercator();
		ensure!(
			!bbox.is_empty(),
			"raster bounds {bounds:?} ({self}) are degenerate in geographic coordinates: {bbox:?}"
		);
		Ok(bbox)
	}

	/// Geographic bounds → native extent `[x_min, y_min, x_max, y_max]`.
	#[must_use]
	pub fn geo_to_bounds(&self, bbox: &GeoBBox) -> [f64; 4] {
		match self {
			Crs::Geographic => bbox.as_array(),
			Crs::WebMercator => {
				let [x0, y0] = lon_lat_to_mercator(bbox.x_min, bbox.y_min);
				let [x1, y1] = lon_lat_to_mercator(bbox.x_max, bbox.y_max);
				[x0, y0, x1, y1]
			}
		}
	}
}

impl Display for Crs {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "EPSG:{}", self.epsg())
	}
}
