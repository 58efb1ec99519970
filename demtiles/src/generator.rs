//! Drives the [`TileRenderer`] over all zoom levels.
//!
//! Levels are processed one after the other in ascending order. Within a level, tiles are rendered
//! on the blocking thread pool of the tokio runtime, at most `limits.render_workers` at a time, and
//! the outcomes are counted by the single consumer of the result stream.

use crate::{RenderOutcome, Summary, TileRenderer, ZoomSummary};
use anyhow::{Result, ensure};
use demtiles_core::{ConcurrencyLimits, TileBBox, TileCoord, ZoomRange, progress::get_progress_bar};
use demtiles_derive::context;
use demtiles_image::LuminanceMapping;
use demtiles_raster::RasterSource;
use futures::{StreamExt, stream};
use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

/// Everything that controls a run apart from input and output.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorOptions {
	pub zoom_range: ZoomRange,
	pub tile_size: u32,
	pub limits: ConcurrencyLimits,
	pub luminance: LuminanceMapping,
	/// Overrides the raster's nodata value.
	pub nodata: Option<f32>,
	/// Draw a progress bar per zoom level on stderr.
	pub progress: bool,
}

impl Default for GeneratorOptions {
	fn default() -> Self {
		GeneratorOptions {
			zoom_range: ZoomRange::default(),
			tile_size: 256,
			limits: ConcurrencyLimits::default(),
			luminance: LuminanceMapping::default(),
			nodata: None,
			progress: false,
		}
	}
}

#[derive(Debug)]
pub struct PyramidGenerator {
	source: Arc<dyn RasterSource>,
	output_dir: PathBuf,
	options: GeneratorOptions,
}

impl PyramidGenerator {
	/// Checks the run-level preconditions. Nothing is rendered yet.
	#[context("Failed to prepare tile generation into {:?}", output_dir)]
	pub fn new(source: Arc<dyn RasterSource>, output_dir: &Path, options: GeneratorOptions) -> Result<PyramidGenerator> {
		ensure!(options.tile_size > 0, "tile size must be positive");
		let bbox = source.info().geo_bbox;
		ensure!(!bbox.is_empty(), "raster bounds {bbox:?} are empty");
		ensure!(
			!output_dir.is_file(),
			"output directory {output_dir:?} is a file"
		);
		Ok(PyramidGenerator {
			source,
			output_dir: output_dir.to_path_buf(),
			options,
		})
	}

	pub fn options(&self) -> &GeneratorOptions {
		&self.options
	}

	/// Tiles covering the raster at `level`.
	pub fn tile_bbox(&self, level: u8) -> Result<TileBBox> {
		TileBBox::from_geo(level, &self.source.info().geo_bbox)
	}

	/// Number of covering tiles per zoom level.
	pub fn count_tiles(&self) -> Result<Vec<(u8, u64)>> {
		self.options
			.zoom_range
			.iter()
			.map(|level| Ok((level, self.tile_bbox(level)?.count_tiles())))
			.collect()
	}

	fn renderer(&self) -> Arc<TileRenderer> {
		Arc::new(TileRenderer::new(
			self.source.clone(),
			&self.output_dir,
			self.options.tile_size,
			self.options.luminance,
			self.options.nodata,
		))
	}

	/// Renders every zoom level. Existing tiles are kept, failing tiles are counted and skipped.
	pub async fn run(&self) -> Result<Summary> {
		self.run_with(|_| {}).await
	}

	/// Same as [`run`](Self::run), but hands the counts of each zoom level to `on_level` as soon as it is done.
	pub async fn run_with(&self, mut on_level: impl FnMut(&ZoomSummary)) -> Result<Summary> {
		log::debug!(
			"generating zoom levels {} with {} workers, tile size {}, luminance {}",
			self.options.zoom_range,
			self.options.limits.render_workers,
			self.options.tile_size,
			self.options.luminance
		);

		let renderer = self.renderer();
		let mut summary = Summary::default();
		for level in self.options.zoom_range {
			let level_summary = self.run_level(&renderer, level).await?;
			log::info!("completed {level_summary}");
			on_level(&level_summary);
			summary.levels.push(level_summary);
		}
		Ok(summary)
	}

	async fn run_level(&self, renderer: &Arc<TileRenderer>, level: u8) -> Result<ZoomSummary> {
		let bbox = self.tile_bbox(level)?;
		log::debug!("zoom {level}: {bbox:?}");

		let mut summary = ZoomSummary::new(level, bbox.count_tiles());
		let progress = get_progress_bar(&format!("zoom {level}"), summary.tiles, self.options.progress);

		let mut outcomes = stream::iter(bbox.iter_coords())
			.map(|coord| render_blocking(renderer.clone(), coord))
			.buffer_unordered(self.options.limits.render_workers);

		while let Some(outcome) = outcomes.next().await {
			summary.counts.record(&outcome);
			progress.inc(1);
		}
		progress.finish();

		Ok(summary)
	}
}

async fn render_blocking(renderer: Arc<TileRenderer>, coord: TileCoord) -> RenderOutcome {
	match tokio::task::spawn_blocking(move || renderer.render_tile(&coord)).await {
		Ok(outcome) => outcome,
		Err(err) => {
			log::error!("Error generating tile {coord}: {err}");
			RenderOutcome::Failed(format!("render task of tile {coord} failed: {err}"))
		}
	}
}

/// Renders all tiles of `source` into `output_dir`.
pub async fn generate_pyramid(
	source: Arc<dyn RasterSource>,
	options: GeneratorOptions,
	output_dir: &Path,
) -> Result<Summary> {
	PyramidGenerator::new(source, output_dir, options)?.run().await
}
