mod test_utilities;
use assert_fs::TempDir;
use demtiles_image::png::png2image;
use image::ColorType;
use predicates::{prelude::*, str};
use pretty_assertions::assert_eq;
use std::fs;
use test_utilities::{dem_fixture, demtiles_cmd, list_files};

#[test]
fn generate_zoom_10() {
	let (_dir, input) = dem_fixture();
	let output = TempDir::new().unwrap();

	demtiles_cmd()
		.args(["generate", "--min-zoom", "10", "--max-zoom", "10", "--no-progress"])
		.arg(&input)
		.arg(output.path())
		.assert()
		.success()
		.stdout(str::contains("zoom 10: 60 tiles, 60 written, 0 skipped, 0 out of extent, 0 failed"))
		.stdout(str::contains("/{z}/{x}/{y}.png"));

	let files = list_files(output.path());
	assert_eq!(files.len(), 60);
	assert_eq!(files.first().unwrap(), "10/509/338.png");
	assert_eq!(files.last().unwrap(), "10/514/347.png");

	for file in &files {
		let image = png2image(&fs::read(output.path().join(file)).unwrap()).unwrap();
		assert_eq!(image.color(), ColorType::La8);
		assert_eq!((image.width(), image.height()), (256, 256));
	}
}

#[test]
fn second_run_skips_existing_tiles() {
	let (_dir, input) = dem_fixture();
	let output = TempDir::new().unwrap();

	let run = || {
		demtiles_cmd()
			.args(["generate", "--min-zoom=8", "--max-zoom=9", "--no-progress"])
			.arg(&input)
			.arg(output.path())
			.assert()
			.success()
	};

	run().stdout(str::contains("total: 26 tiles, 26 written, 0 skipped"));
	let before = list_files(output.path());

	run().stdout(str::contains("total: 26 tiles, 0 written, 26 skipped"));
	assert_eq!(list_files(output.path()), before);
}

#[test]
fn failed_tiles_are_reported() {
	let (_dir, input) = dem_fixture();
	let output = TempDir::new().unwrap();
	// a file where the column directory 8/127 belongs makes its three tiles unwritable
	fs::create_dir_all(output.path().join("8")).unwrap();
	fs::write(output.path().join("8/127"), b"in the way").unwrap();

	demtiles_cmd()
		.args(["generate", "--min-zoom=8", "--max-zoom=8", "--no-progress"])
		.arg(&input)
		.arg(output.path())
		.assert()
		.success()
		.stderr(str::contains("Error generating tile 8/127/84"))
		.stderr(str::contains("Error generating tile 8/127/85"))
		.stderr(str::contains("Error generating tile 8/127/86"))
		.stderr(str::contains("zoom 8: 6 tiles, 3 written, 0 skipped, 0 out of extent, 3 failed"))
		.stderr(str::contains("run the command again"))
		.stdout(str::contains("total: 6 tiles, 3 written, 0 skipped, 0 out of extent, 3 failed"));

	assert_eq!(
		list_files(output.path()),
		vec!["8/127", "8/128/84.png", "8/128/85.png", "8/128/86.png"]
	);
}

#[test]
fn quiet_hides_tile_errors() {
	let (_dir, input) = dem_fixture();
	let output = TempDir::new().unwrap();
	fs::create_dir_all(output.path().join("8")).unwrap();
	fs::write(output.path().join("8/127"), b"in the way").unwrap();

	demtiles_cmd()
		.args(["-q", "generate", "--min-zoom=8", "--max-zoom=8", "--no-progress"])
		.arg(&input)
		.arg(output.path())
		.assert()
		.success()
		.stderr(str::contains("Error generating tile").not());
}

#[test]
fn clamp_and_scale_conflict() {
	let (_dir, input) = dem_fixture();
	demtiles_cmd()
		.args(["generate", "--clamp", "--scale=0,100"])
		.arg(&input)
		.arg("out")
		.assert()
		.failure()
		.code(2)
		.stderr(str::contains("cannot be used with"));
}

#[test]
fn config_file() {
	let (dir, input) = dem_fixture();
	let config = dir.path().join("config.yml");
	fs::write(&config, "min_zoom: 7\nmax_zoom: 7\ntile_size: 128\nluminance:\n  mode: clamp\n").unwrap();
	let output = TempDir::new().unwrap();

	demtiles_cmd()
		.args(["generate", "--no-progress", "--config"])
		.arg(&config)
		.arg(&input)
		.arg(output.path())
		.assert()
		.success()
		.stdout(str::contains("zoom 7: 4 tiles, 4 written"));

	let image = png2image(&fs::read(output.path().join("7/63/42.png")).unwrap()).unwrap();
	assert_eq!(image.width(), 128);
}

#[test]
fn invalid_config_file() {
	let (dir, input) = dem_fixture();
	let config = dir.path().join("config.yml");
	fs::write(&config, "zoom: 7\n").unwrap();

	demtiles_cmd()
		.args(["generate", "--config"])
		.arg(&config)
		.arg(&input)
		.arg(dir.path().join("out"))
		.assert()
		.failure()
		.stderr(str::contains("unknown field `zoom`"));
}

#[test]
fn missing_input() {
	let output = TempDir::new().unwrap();
	demtiles_cmd()
		.args(["generate", "/does/not/exist.tif"])
		.arg(output.path())
		.assert()
		.failure()
		.code(1)
		.stderr(str::contains("does not exist"));
}

#[test]
fn unsupported_crs() {
	let dir = TempDir::new().unwrap();
	let input = dir.path().join("plain.tif");
	let mut file = fs::File::create(&input).unwrap();
	tiff::encoder::TiffEncoder::new(&mut file)
		.unwrap()
		.write_image::<tiff::encoder::colortype::Gray32Float>(2, 2, &[1.0, 2.0, 3.0, 4.0])
		.unwrap();

	demtiles_cmd()
		.args(["generate"])
		.arg(&input)
		.arg(dir.path().join("out"))
		.assert()
		.failure()
		.stderr(str::contains("not georeferenced"));
}

#[test]
fn dry_run() {
	let (_dir, input) = dem_fixture();
	let output = TempDir::new().unwrap();
	demtiles_cmd()
		.args(["generate", "--dry-run", "--min-zoom=9", "--max-zoom=10"])
		.arg(&input)
		.arg(output.path().join("tiles"))
		.assert()
		.success()
		.stdout(str::contains("zoom 10: 60 tiles"))
		.stdout(str::contains("total: 80 tiles"));
	assert!(!output.path().join("tiles").exists());
}
