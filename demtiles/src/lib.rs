//! Turns a georeferenced elevation raster into an XYZ pyramid of luminance + alpha PNG tiles.
//!
//! ```no_run
//! use demtiles::{Config, generate_pyramid};
//! use demtiles_raster::{RasterSource, open_raster};
//! use std::{path::Path, sync::Arc};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let source: Arc<dyn RasterSource> = Arc::from(open_raster(Path::new("dem.tif"))?);
//! let options = Config::default().generator_options(source.as_ref())?;
//! let summary = generate_pyramid(source, options, Path::new("tiles")).await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

mod config;
mod generator;
mod render;
mod summary;

pub use config::{Config, DEFAULT_TILE_SIZE, LuminanceConfig, LuminanceMode, MAX_TILE_SIZE};
pub use generator::{GeneratorOptions, PyramidGenerator, generate_pyramid};
pub use render::{RenderOutcome, TileRenderer};
pub use summary::{Summary, TileCounts, ZoomSummary};
