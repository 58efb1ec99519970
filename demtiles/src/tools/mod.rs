pub mod generate;
pub mod probe;

use anyhow::{Context, Result, ensure};
use demtiles::{Config, LuminanceConfig, LuminanceMode};
use std::path::PathBuf;

/// Options shared by all subcommands. They override the values of the config file.
#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
	/// YAML file with default options
	#[arg(long, short, value_name = "FILE", display_order = 0)]
	config: Option<PathBuf>,

	/// minimum zoom level [default: 10]
	#[arg(long, value_name = "int", display_order = 1)]
	min_zoom: Option<u8>,

	/// maximum zoom level [default: 15]
	#[arg(long, value_name = "int", display_order = 1)]
	max_zoom: Option<u8>,

	/// tile width and height in pixels [default: 256]
	#[arg(long, value_name = "int", display_order = 2)]
	tile_size: Option<u32>,

	/// number of tiles rendered in parallel [default: number of CPUs]
	#[arg(long, short = 'j', value_name = "int", display_order = 2)]
	concurrency: Option<usize>,

	/// treat this value as nodata instead of the one stored in the raster
	#[arg(long, value_name = "float", allow_hyphen_values = true, display_order = 3)]
	nodata: Option<f32>,

	/// map elevations from min to max linearly onto luminance 0..255 [default: value range of the raster]
	#[arg(long, value_name = "min,max", allow_hyphen_values = true, display_order = 3, conflicts_with = "clamp")]
	scale: Option<String>,

	/// use elevations directly as luminance, clamped to 0..255
	#[arg(long, display_order = 3)]
	clamp: bool,
}

impl ConfigArgs {
	/// The config file (if any) with the command line values applied on top.
	pub fn load(&self) -> Result<Config> {
		let mut config = match &self.config {
			Some(path) => Config::from_path(path)?,
			None => Config::default(),
		};

		let mut luminance = LuminanceConfig::default();
		if self.clamp {
			luminance.mode = LuminanceMode::Clamp;
		}
		if let Some(scale) = &self.scale {
			let (min, max) = parse_scale(scale)?;
			luminance.min = Some(min);
			luminance.max = Some(max);
		}

		config.merge(Config {
			min_zoom: self.min_zoom,
			max_zoom: self.max_zoom,
			tile_size: self.tile_size,
			concurrency: self.concurrency,
			nodata: self.nodata,
			luminance,
		});
		log::debug!("configuration: {config:?}");
		Ok(config)
	}
}

fn parse_scale(text: &str) -> Result<(f32, f32)> {
	let values = text
		.split(&[',', ' ', ';'])
		.filter(|s| !s.is_empty())
		.map(|s| s.parse::<f32>().with_context(|| format!("scale value {s:?} is not a number")))
		.collect::<Result<Vec<f32>>>()?;
	ensure!(
		values.len() == 2,
		"scale must contain exactly 2 numbers (min,max), got {text:?}"
	);
	Ok((values[0], values[1]))
}
