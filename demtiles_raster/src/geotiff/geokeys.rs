//! Parsing of the GeoTIFF `GeoKeyDirectory`.

use crate::Crs;
use anyhow::{Result, bail, ensure};
use std::collections::HashMap;

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

/// The short-valued keys of a `GeoKeyDirectory`.
#[derive(Debug, Default, PartialEq)]
pub struct GeoKeys(HashMap<u16, u16>);

impl GeoKeys {
	/// Parses the directory: a 4 value header followed by `(key, location, count, value)` entries.
	/// Keys stored in other tags (doubles, ASCII) are skipped.
	pub fn parse(directory: &[u16]) -> Result<GeoKeys> {
		ensure!(directory.len() >= 4, "GeoKeyDirectory is too short");
		let count = directory[3] as usize;
		ensure!(
			directory.len() >= 4 + count * 4,
			"GeoKeyDirectory announces {count} keys but holds only {} values",
			directory.len()
		);
		let keys = directory[4..4 + count * 4]
			.chunks_exact(4)
			.filter(|entry| entry[1] == 0)
			.map(|entry| (entry[0], entry[3]))
			.collect();
		Ok(GeoKeys(keys))
	}

	pub fn get(&self, key: u16) -> Option<u16> {
		self.0.get(&key).copied()
	}

	/// Raster samples describe points rather than areas.
	pub fn is_pixel_is_point(&self) -> bool {
		self.get(GT_RASTER_TYPE) == Some(RASTER_PIXEL_IS_POINT)
	}

	/// The CRS described by the keys.
	pub fn crs(&self) -> Result<Crs> {
		match self.get(GT_MODEL_TYPE) {
			Some(MODEL_TYPE_GEOGRAPHIC) => match self.get(GEOGRAPHIC_TYPE) {
				None | Some(USER_DEFINED) => {
					log::debug!("geographic GeoTIFF without a known datum, assuming WGS84");
					Ok(Crs::Geographic)
				}
				Some(code) => Crs::from_epsg(u32::from(code)),
			},
			Some(MODEL_TYPE_PROJECTED) => match self.get(PROJECTED_CS_TYPE) {
				None | Some(USER_DEFINED) => {
					bail!("user-defined projections are not supported without the `gdal` feature")
				}
				Some(code) => Crs::from_epsg(u32::from(code)),
			},
			Some(other) => bail!("unsupported GeoTIFF model type {other}"),
			None => bail!("GeoTIFF has no model type key, the CRS is unknown"),
		}
	}
}

/// Builds a minimal directory for `crs`.
#[cfg(any(test, feature = "test"))]
#[rustfmt::skip]
pub fn directory_for(crs: Crs) -> Vec<u16> {
	let (model_type, key, code) = match crs {
		Crs::Geographic => (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE, 4326),
		Crs::WebMercator => (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE, 3857),
	};
	vec![
		1, 1, 0, 3,
		GT_MODEL_TYPE, 0, 1, model_type,
		GT_RASTER_TYPE, 0, 1, 1,
		key, 0, 1, code,
	]
}
