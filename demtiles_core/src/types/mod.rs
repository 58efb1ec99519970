mod geo_bbox;
mod tile_bbox;
mod tile_coord;
mod zoom_range;

pub use geo_bbox::*;
pub use tile_bbox::*;
pub use tile_coord::*;
pub use zoom_range::*;
