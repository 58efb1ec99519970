use super::ConfigArgs;
use anyhow::Result;
use demtiles::{Config, PyramidGenerator};
use demtiles_core::TileBBox;
use demtiles_raster::{RasterSource, open_raster};
use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// elevation raster, e.g. a GeoTIFF in EPSG:4326 or EPSG:3857
	#[arg()]
	input_file: PathBuf,

	/// directory for the tiles, existing tiles are kept
	#[arg()]
	output_dir: PathBuf,

	#[command(flatten)]
	config: ConfigArgs,

	/// only count the tiles per zoom level, do not render anything
	#[arg(long, display_order = 4)]
	dry_run: bool,

	/// do not show progress bars
	#[arg(long, display_order = 4)]
	no_progress: bool,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	let config = arguments.config.load()?;
	let limits = config.limits();

	let runtime = tokio::runtime::Builder::new_multi_thread()
		.max_blocking_threads(limits.blocking_threads)
		.build()?;
	runtime.block_on(generate(arguments, &config))
}

async fn generate(arguments: &Subcommand, config: &Config) -> Result<()> {
	eprintln!(
		"generate tiles from {:?} into {:?}",
		arguments.input_file, arguments.output_dir
	);

	let source: Arc<dyn RasterSource> = Arc::from(open_raster(&arguments.input_file)?);
	let info = source.info();
	log::info!(
		"raster {}x{} in {}, bounds {:?}",
		info.width,
		info.height,
		info.crs,
		info.geo_bbox
	);

	if arguments.dry_run {
		let mut total = 0;
		for level in config.zoom_range()? {
			let count = TileBBox::from_geo(level, &info.geo_bbox)?.count_tiles();
			println!("zoom {level}: {count} tiles");
			total += count;
		}
		println!("total: {total} tiles");
		return Ok(());
	}

	let mut options = config.generator_options(source.as_ref())?;
	options.progress = !arguments.no_progress;

	let generator = PyramidGenerator::new(source, &arguments.output_dir, options)?;
	let summary = generator.run_with(|level| eprintln!("{level}")).await?;

	println!("{summary}");
	if summary.has_failures() {
		eprintln!("some tiles failed, run the command again to retry them");
	}
	println!("tiles: {}", url_template(&arguments.output_dir));

	Ok(())
}

fn url_template(output_dir: &Path) -> String {
	format!("{}/{{z}}/{{x}}/{{y}}.png", output_dir.display())
}
