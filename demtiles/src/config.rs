//! Run configuration, read from YAML and overridden by command line flags.
//!
//! ```yaml
//! min_zoom: 8
//! max_zoom: 14
//! tile_size: 256
//! concurrency: 4
//! nodata: -9999
//! luminance:
//!   mode: linear
//!   min: 0
//!   max: 3000
//! ```

use crate::GeneratorOptions;
use anyhow::{Result, bail, ensure};
use demtiles_core::{ConcurrencyLimits, ZoomRange};
use demtiles_derive::context;
use demtiles_image::LuminanceMapping;
use demtiles_raster::RasterSource;
use serde::Deserialize;
use std::{fs::File, io::BufReader, io::Read, path::Path};

pub const DEFAULT_TILE_SIZE: u32 = 256;
pub const MAX_TILE_SIZE: u32 = 4096;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LuminanceMode {
	/// Stretch `min..max` (by default the raster's value range) onto `0..=255`.
	#[default]
	Linear,
	/// Use the elevation as luminance, clamped to `0..=255`.
	Clamp,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LuminanceConfig {
	#[serde(default)]
	pub mode: LuminanceMode,
	pub min: Option<f32>,
	pub max: Option<f32>,
}

impl LuminanceConfig {
	/// The mapping for `source`. Missing linear bounds are taken from the raster's valid samples.
	#[context("Failed to determine the luminance mapping")]
	pub fn resolve(&self, source: &dyn RasterSource, nodata: Option<f32>) -> Result<LuminanceMapping> {
		if self.mode == LuminanceMode::Clamp {
			ensure!(
				self.min.is_none() && self.max.is_none(),
				"min and max can only be used with the linear mode"
			);
			return Ok(LuminanceMapping::Clamp);
		}

		if let (Some(min), Some(max)) = (self.min, self.max) {
			ensure!(min < max, "luminance min ({min}) must be smaller than max ({max})");
			return Ok(LuminanceMapping::Linear { min, max });
		}

		log::debug!("scanning raster for its value range");
		let Some((raster_min, raster_max)) = source.value_range(nodata)? else {
			log::warn!("raster has no valid samples, every tile will be empty");
			return Ok(LuminanceMapping::Clamp);
		};
		let (min, max) = (self.min.unwrap_or(raster_min), self.max.unwrap_or(raster_max));
		ensure!(min <= max, "luminance min ({min}) must not exceed max ({max})");
		log::debug!("value range of the raster: {raster_min}..{raster_max}");
		Ok(LuminanceMapping::from_range((min, max)))
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// lowest zoom level, default 10
	pub min_zoom: Option<u8>,

	/// highest zoom level, default 15
	pub max_zoom: Option<u8>,

	/// width and height of the tiles in pixels, default 256
	pub tile_size: Option<u32>,

	/// number of tiles rendered in parallel, default: number of CPUs
	pub concurrency: Option<usize>,

	/// overrides the nodata value of the raster
	pub nodata: Option<f32>,

	#[serde(default)]
	pub luminance: LuminanceConfig,
}

impl Config {
	pub fn from_reader<R: Read>(reader: R) -> Result<Config> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Config> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	#[context("Failed to read config file {:?}", path)]
	pub fn from_path(path: &Path) -> Result<Config> {
		let file = File::open(path)?;
		Config::from_reader(BufReader::new(file))
	}

	/// Values set in `other` replace the values of `self`.
	pub fn merge(&mut self, other: Config) {
		self.min_zoom = other.min_zoom.or(self.min_zoom);
		self.max_zoom = other.max_zoom.or(self.max_zoom);
		self.tile_size = other.tile_size.or(self.tile_size);
		self.concurrency = other.concurrency.or(self.concurrency);
		self.nodata = other.nodata.or(self.nodata);
		if other.luminance != LuminanceConfig::default() {
			self.luminance = other.luminance;
		}
	}

	pub fn zoom_range(&self) -> Result<ZoomRange> {
		ZoomRange::new(
			self.min_zoom.unwrap_or(ZoomRange::DEFAULT_MIN),
			self.max_zoom.unwrap_or(ZoomRange::DEFAULT_MAX),
		)
	}

	pub fn tile_size(&self) -> Result<u32> {
		let size = self.tile_size.unwrap_or(DEFAULT_TILE_SIZE);
		if !(1..=MAX_TILE_SIZE).contains(&size) {
			bail!("tile_size must be between 1 and {MAX_TILE_SIZE}, got {size}");
		}
		Ok(size)
	}

	pub fn limits(&self) -> ConcurrencyLimits {
		ConcurrencyLimits::from_option(self.concurrency)
	}

	/// Validates the configuration and resolves it against `source`.
	#[context("Invalid configuration")]
	pub fn generator_options(&self, source: &dyn RasterSource) -> Result<GeneratorOptions> {
		let zoom_range = self.zoom_range()?;
		let tile_size = self.tile_size()?;
		let nodata = self.nodata.or(source.info().nodata);
		let luminance = self.luminance.resolve(source, nodata)?;
		Ok(GeneratorOptions {
			zoom_range,
			tile_size,
			limits: self.limits(),
			luminance,
			nodata: self.nodata,
			progress: false,
		})
	}
}
