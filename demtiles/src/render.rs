//! Rendering of a single tile.
//!
//! The tile's geographic bounds are mapped to a fractional pixel window of the raster. The part of
//! the window inside the raster is placed at the tile pixels it covers geographically, so tiles on
//! the edge of the raster are partially transparent instead of stretched.

use anyhow::{Context, Result};
use demtiles_core::TileCoord;
use demtiles_derive::context;
use demtiles_image::{CropRect, LuminanceMapping, TileCanvas, png, resample};
use demtiles_raster::RasterSource;
use image::DynamicImage;
use std::{
	fmt::{self, Display},
	fs, io,
	path::{Path, PathBuf},
	sync::Arc,
};

/// What happened to one tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
	/// A new PNG was written.
	Written,
	/// The PNG already existed and was left untouched.
	Skipped,
	/// The tile does not overlap any valid sample of the raster.
	OutOfExtent,
	/// Rendering or writing failed. The run continues with the other tiles.
	Failed(String),
}

impl Display for RenderOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RenderOutcome::Written => write!(f, "written"),
			RenderOutcome::Skipped => write!(f, "skipped"),
			RenderOutcome::OutOfExtent => write!(f, "out of extent"),
			RenderOutcome::Failed(reason) => write!(f, "failed: {reason}"),
		}
	}
}

/// Renders tiles of one raster into `{output_dir}/{z}/{x}/{y}.png`.
#[derive(Debug)]
pub struct TileRenderer {
	source: Arc<dyn RasterSource>,
	output_dir: PathBuf,
	tile_size: u32,
	luminance: LuminanceMapping,
	nodata: Option<f32>,
}

impl TileRenderer {
	/// `nodata` replaces the raster's own nodata value when set.
	pub fn new(
		source: Arc<dyn RasterSource>,
		output_dir: &Path,
		tile_size: u32,
		luminance: LuminanceMapping,
		nodata: Option<f32>,
	) -> TileRenderer {
		let nodata = nodata.or(source.info().nodata);
		TileRenderer {
			source,
			output_dir: output_dir.to_path_buf(),
			tile_size,
			luminance,
			nodata,
		}
	}

	pub fn tile_path(&self, coord: &TileCoord) -> PathBuf {
		self.output_dir
			.join(coord.level.to_string())
			.join(coord.x.to_string())
			.join(format!("{}.png", coord.y))
	}

	/// Renders and writes one tile. Never fails: errors end up in [`RenderOutcome::Failed`].
	pub fn render_tile(&self, coord: &TileCoord) -> RenderOutcome {
		let path = self.tile_path(coord);
		if path.exists() {
			log::trace!("tile {coord} exists, skipping");
			return RenderOutcome::Skipped;
		}

		let result = self
			.render_image(coord)
			.and_then(|image| image.map(|image| write_tile(&path, &image)).transpose());

		match result {
			Ok(Some(())) => RenderOutcome::Written,
			Ok(None) => RenderOutcome::OutOfExtent,
			Err(err) => {
				log::error!("Error generating tile {coord}: {err:#}");
				RenderOutcome::Failed(format!("{err:#}"))
			}
		}
	}

	/// The tile as LA8 image, or `None` if it does not cover any valid sample.
	#[context("Failed to render tile {coord}")]
	pub fn render_image(&self, coord: &TileCoord) -> Result<Option<DynamicImage>> {
		let info = self.source.info();
		let window = self.source.pixel_window(&coord.to_geo_bbox())?;
		let Some(clipped) = window.clipped(info.width, info.height) else {
			return Ok(None);
		};

		// tile pixels covered by the raster
		let size = f64::from(self.tile_size);
		let (sx, sy) = (size / window.width, size / window.height);
		let px0 = ((clipped.col_off - window.col_off) * sx).round().clamp(0.0, size);
		let px1 = ((clipped.col_end() - window.col_off) * sx).round().clamp(0.0, size);
		let py0 = ((clipped.row_off - window.row_off) * sy).round().clamp(0.0, size);
		let py1 = ((clipped.row_end() - window.row_off) * sy).round().clamp(0.0, size);
		if px1 <= px0 || py1 <= py0 {
			return Ok(None);
		}

		let Some(block) = self.source.read_window(&window)? else {
			return Ok(None);
		};
		let grid = block.grid.with_nodata(self.nodata);
		if !grid.has_valid_values() {
			return Ok(None);
		}

		let crop = CropRect::new(
			window.col_off + px0 / sx - f64::from(block.col_off),
			window.row_off + py0 / sy - f64::from(block.row_off),
			(px1 - px0) / sx,
			(py1 - py0) / sy,
		);
		let resampled = resample(&grid, crop, (px1 - px0) as u32, (py1 - py0) as u32)?;

		let mut canvas = TileCanvas::new(self.tile_size);
		canvas.paste(&resampled, px0 as i64, py0 as i64, &self.luminance);
		if canvas.is_transparent() {
			return Ok(None);
		}
		Ok(Some(canvas.into_image()))
	}
}

/// Writes the PNG next to its destination first and renames it into place.
#[context("Failed to write tile {:?}", path)]
fn write_tile(path: &Path, image: &DynamicImage) -> Result<()> {
	let data = png::image2png(image)?;
	let dir = path.parent().context("tile path has no parent directory")?;
	fs::create_dir_all(dir)?;
	write_atomic(path, &data)?;
	Ok(())
}

/// Writes `data` to `{path}.tmp` and renames it to `path`. The temporary file is removed if either step fails.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
	let temp = path.with_extension("png.tmp");
	let result = fs::write(&temp, data).and_then(|()| fs::rename(&temp, path));
	if result.is_err() {
		let _ = fs::remove_file(&temp);
	}
	result
}
