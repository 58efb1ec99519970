//! Geographic and tile-grid primitives shared by the demtiles crates: bounding boxes, tile
//! coordinates, the covering-tile index, zoom ranges, concurrency limits and progress output.

mod concurrency;
pub use concurrency::ConcurrencyLimits;

pub mod progress;

mod types;
pub use types::*;
