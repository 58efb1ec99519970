//! Elevation grids and the conversion of grid blocks into luminance + alpha PNG tiles.

mod grid;
mod luminance;
pub mod png;
mod resample;
mod tile;

pub use grid::*;
pub use luminance::LuminanceMapping;
pub use png::{image2png, png2image};
pub use resample::{CropRect, Resampled, resample};
pub use tile::TileCanvas;
