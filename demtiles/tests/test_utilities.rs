#![allow(unused)]

use assert_cmd::{Command, cargo};
use demtiles_image::ElevationGrid;
use demtiles_raster::testing::{TestRaster, write_geotiff};
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

#[cfg(windows)]
pub const BINARY_NAME: &str = "demtiles.exe";
#[cfg(not(windows))]
pub const BINARY_NAME: &str = "demtiles";

pub fn demtiles_cmd() -> Command {
	Command::new(cargo::cargo_bin!())
}

/// A temp directory holding `dem.tif`: 200×200 samples over lon -1..1, lat 50..52, with a nodata corner.
pub fn dem_fixture() -> (TempDir, PathBuf) {
	let dir = tempdir().expect("failed to create temp dir");
	let path = dir.path().join("dem.tif");
	let grid = ElevationGrid::from_fn(200, 200, Some(-9999.0), |x, y| {
		if x < 20 && y < 20 { -9999.0 } else { 100.0 + (x + y) as f32 }
	});
	write_geotiff(&path, &TestRaster::geographic(grid, [-1.0, 50.0, 1.0, 52.0])).expect("failed to write GeoTIFF");
	(dir, path)
}

/// All files below `dir`, relative and sorted.
pub fn list_files(dir: &Path) -> Vec<String> {
	fn walk(base: &Path, dir: &Path, files: &mut Vec<String>) {
		for entry in std::fs::read_dir(dir).unwrap() {
			let path = entry.unwrap().path();
			if path.is_dir() {
				walk(base, &path, files);
			} else {
				files.push(path.strip_prefix(base).unwrap().to_string_lossy().replace('\\', "/"));
			}
		}
	}
	let mut files = Vec::new();
	if dir.exists() {
		walk(dir, dir, &mut files);
	}
	files.sort();
	files
}
