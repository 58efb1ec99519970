//! Pure Rust GeoTIFF reader based on the `tiff` crate.
//!
//! Georeferencing comes from the GeoTIFF tags (`ModelPixelScale` + `ModelTiepoint` or
//! `ModelTransformation`, and the `GeoKeyDirectory`); nodata from the `GDAL_NODATA` tag.
//! Decoded strips/tiles are kept in a small LRU cache, because neighbouring tiles of the
//! pyramid read overlapping windows.

mod geokeys;

#[cfg(any(test, feature = "test"))]
pub use geokeys::directory_for;

use crate::{Crs, GeoTransform, RasterInfo, RasterSource};
use anyhow::{Context, Result, anyhow, bail, ensure};
use demtiles_core::GeoBBox;
use demtiles_derive::context;
use demtiles_image::ElevationGrid;
use geokeys::GeoKeys;
use lru::LruCache;
use std::{
	fmt::{self, Debug},
	fs::File,
	io::BufReader,
	num::NonZeroUsize,
	path::{Path, PathBuf},
	sync::{Arc, Mutex},
};
use tiff::{
	decoder::{Decoder, DecodingResult},
	tags::Tag,
};

pub(crate) const MODEL_PIXEL_SCALE: u16 = 33550;
pub(crate) const MODEL_TIEPOINT: u16 = 33922;
pub(crate) const MODEL_TRANSFORMATION: u16 = 34264;
pub(crate) const GEO_KEY_DIRECTORY: u16 = 34735;
pub(crate) const GDAL_NODATA: u16 = 42113;

const CACHED_CHUNKS: NonZeroUsize = NonZeroUsize::new(64).unwrap();

type TiffDecoder = Decoder<BufReader<File>>;

/// Band 1 of a decoded strip or tile, cropped to the part inside the image.
struct Chunk {
	width: u32,
	height: u32,
	values: Vec<f32>,
}

struct Reader {
	decoder: TiffDecoder,
	cache: LruCache<u32, Arc<Chunk>>,
}

pub struct GeoTiffSource {
	path: PathBuf,
	info: RasterInfo,
	crs: Crs,
	chunk_width: u32,
	chunk_height: u32,
	chunks_across: u32,
	samples_per_pixel: usize,
	reader: Mutex<Reader>,
}

impl GeoTiffSource {
	#[context("Failed to open GeoTIFF {:?}", path)]
	pub fn open(path: &Path) -> Result<GeoTiffSource> {
		let file = File::open(path)?;
		let mut decoder = Decoder::new(BufReader::new(file)).context("Failed to initialise TIFF decoder")?;

		let (width, height) = decoder.dimensions()?;
		ensure!(width > 0 && height > 0, "image is empty ({width}x{height})");

		let directory = tag_u16s(&mut decoder, GEO_KEY_DIRECTORY)?
			.ok_or_else(|| anyhow!("no GeoKeyDirectory tag, the file is not georeferenced"))?;
		let geo_keys = GeoKeys::parse(&directory)?;
		let crs = geo_keys.crs()?;

		let mut geo_transform = if let Some(matrix) = tag_f64s(&mut decoder, MODEL_TRANSFORMATION)? {
			GeoTransform::from_model_transformation(&matrix)?
		} else {
			let tiepoint =
				tag_f64s(&mut decoder, MODEL_TIEPOINT)?.ok_or_else(|| anyhow!("no ModelTiepoint tag"))?;
			let scale =
				tag_f64s(&mut decoder, MODEL_PIXEL_SCALE)?.ok_or_else(|| anyhow!("no ModelPixelScale tag"))?;
			GeoTransform::from_tiepoint_and_scale(&tiepoint, &scale)?
		};
		if geo_keys.is_pixel_is_point() {
			geo_transform = geo_transform.shifted(-0.5, -0.5);
		}

		let nodata = read_nodata(&mut decoder)?;

		let samples = tag_u16s(&mut decoder, 277)?.and_then(|v| v.first().copied()).unwrap_or(1);
		let planar = tag_u16s(&mut decoder, 284)?.and_then(|v| v.first().copied()).unwrap_or(1);
		let samples_per_pixel = if planar == 2 { 1 } else { usize::from(samples.max(1)) };

		let (chunk_width, chunk_height) = decoder.chunk_dimensions();
		ensure!(
			chunk_width > 0 && chunk_height > 0,
			"invalid chunk size {chunk_width}x{chunk_height}"
		);
		let chunks_across = width.div_ceil(chunk_width);

		let native_bounds = geo_transform.bounds(width, height);
		let geo_bbox = crs.bounds_to_geo(native_bounds)?;

		log::debug!(
			"opened GeoTIFF {path:?}: {width}x{height}, {crs}, chunks {chunk_width}x{chunk_height}, nodata {nodata:?}"
		);

		Ok(GeoTiffSource {
			path: path.to_path_buf(),
			info: RasterInfo {
				width,
				height,
				geo_transform,
				crs: crs.to_string(),
				native_bounds,
				geo_bbox,
				nodata,
			},
			crs,
			chunk_width,
			chunk_height,
			chunks_across,
			samples_per_pixel,
			reader: Mutex::new(Reader {
				decoder,
				cache: LruCache::new(CACHED_CHUNKS),
			}),
		})
	}

	fn chunk(&self, reader: &mut Reader, index: u32) -> Result<Arc<Chunk>> {
		if let Some(chunk) = reader.cache.get(&index) {
			return Ok(chunk.clone());
		}

		let col = index % self.chunks_across;
		let row = index / self.chunks_across;
		let width = self.chunk_width.min(self.info.width - col * self.chunk_width);
		let height = self.chunk_height.min(self.info.height - row * self.chunk_height);

		let decoded = reader
			.decoder
			.read_chunk(index)
			.with_context(|| format!("Failed to decode chunk {index}"))?;
		let band = first_band(decoded, self.samples_per_pixel)?;

		// edge chunks may be padded to the full chunk size
		let values = if band.len() == (width * height) as usize {
			band
		} else if band.len() == (self.chunk_width * self.chunk_height) as usize {
			band
				.chunks_exact(self.chunk_width as usize)
				.take(height as usize)
				.flat_map(|line| line[..width as usize].iter().copied())
				.collect()
		} else {
			bail!(
				"chunk {index} holds {} samples, expected {}x{}",
				band.len(),
				width,
				height
			);
		};

		let chunk = Arc::new(Chunk { width, height, values });
		reader.cache.put(index, chunk.clone());
		Ok(chunk)
	}
}

impl RasterSource for GeoTiffSource {
	fn info(&self) -> &RasterInfo {
		&self.info
	}

	fn geo_to_native(&self, bbox: &GeoBBox) -> Result<[f64; 4]> {
		Ok(self.crs.geo_to_bounds(bbox))
	}

	#[context("Failed to read window ({col_off}, {row_off}, {width}, {height}) from {:?}", self.path)]
	fn read(&self, col_off: u32, row_off: u32, width: u32, height: u32) -> Result<ElevationGrid> {
		ensure!(width > 0 && height > 0, "window is empty");
		ensure!(
			col_off + width <= self.info.width && row_off + height <= self.info.height,
			"window exceeds raster of {}x{}",
			self.info.width,
			self.info.height
		);

		let mut reader = self.reader.lock().map_err(|_| anyhow!("GeoTIFF reader is poisoned"))?;
		let mut out = vec![0f32; width as usize * height as usize];

		let (col_end, row_end) = (col_off + width, row_off + height);
		for chunk_row in row_off / self.chunk_height..=(row_end - 1) / self.chunk_height {
			for chunk_col in col_off / self.chunk_width..=(col_end - 1) / self.chunk_width {
				let chunk = self.chunk(&mut reader, chunk_row * self.chunks_across + chunk_col)?;
				let (ox, oy) = (chunk_col * self.chunk_width, chunk_row * self.chunk_height);

				let x0 = col_off.max(ox);
				let x1 = col_end.min(ox + chunk.width);
				let n = (x1 - x0) as usize;
				for y in row_off.max(oy)..row_end.min(oy + chunk.height) {
					let src = ((y - oy) * chunk.width + (x0 - ox)) as usize;
					let dst = ((y - row_off) * width + (x0 - col_off)) as usize;
					out[dst..dst + n].copy_from_slice(&chunk.values[src..src + n]);
				}
			}
		}

		ElevationGrid::new(width, height, out, self.info.nodata)
	}
}

impl Debug for GeoTiffSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GeoTiffSource")
			.field("path", &self.path)
			.field("info", &self.info)
			.field("chunk", &(self.chunk_width, self.chunk_height))
			.finish_non_exhaustive()
	}
}

fn tag_f64s(decoder: &mut TiffDecoder, code: u16) -> Result<Option<Vec<f64>>> {
	match decoder.find_tag(Tag::from_u16_exhaustive(code))? {
		Some(value) => Ok(Some(value.into_f64_vec()?)),
		None => Ok(None),
	}
}

fn tag_u16s(decoder: &mut TiffDecoder, code: u16) -> Result<Option<Vec<u16>>> {
	match decoder.find_tag(Tag::from_u16_exhaustive(code))? {
		Some(value) => Ok(Some(value.into_u16_vec()?)),
		None => Ok(None),
	}
}

fn read_nodata(decoder: &mut TiffDecoder) -> Result<Option<f32>> {
	let Some(value) = decoder.find_tag(Tag::from_u16_exhaustive(GDAL_NODATA))? else {
		return Ok(None);
	};
	let text = match value.into_string() {
		Ok(text) => text,
		Err(e) => {
			log::warn!("ignoring unreadable GDAL_NODATA tag: {e}");
			return Ok(None);
		}
	};
	parse_nodata(&text)
}

fn parse_nodata(text: &str) -> Result<Option<f32>> {
	let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
	if text.is_empty() {
		return Ok(None);
	}
	let value: f64 = text
		.parse()
		.with_context(|| format!("GDAL_NODATA value {text:?} is not a number"))?;
	Ok(Some(value as f32))
}

/// Converts decoded samples to `f32`, keeping every `samples`-th value (band 1 of interleaved data).
fn first_band(result: DecodingResult, samples: usize) -> Result<Vec<f32>> {
	fn pick<T: Copy>(values: &[T], samples: usize, to_f32: impl Fn(T) -> f32) -> Vec<f32> {
		values.iter().step_by(samples).map(|v| to_f32(*v)).collect()
	}
	Ok(match result {
		DecodingResult::U8(v) => pick(&v, samples, f32::from),
		DecodingResult::U16(v) => pick(&v, samples, f32::from),
		DecodingResult::U32(v) => pick(&v, samples, |x| x as f32),
		DecodingResult::U64(v) => pick(&v, samples, |x| x as f32),
		DecodingResult::I8(v) => pick(&v, samples, f32::from),
		DecodingResult::I16(v) => pick(&v, samples, f32::from),
		DecodingResult::I32(v) => pick(&v, samples, |x| x as f32),
		DecodingResult::I64(v) => pick(&v, samples, |x| x as f32),
		DecodingResult::F32(v) => pick(&v, samples, |x| x),
		DecodingResult::F64(v) => pick(&v, samples, |x| x as f32),
		#[allow(unreachable_patterns)]
		_ => bail!("unsupported sample format"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{TestRaster, write_geotiff};
	use crate::{PixelWindow, RasterSource};
	use approx::assert_relative_eq;
	use rstest::rstest;

	fn ramp(width: u32, height: u32) -> ElevationGrid {
		ElevationGrid::from_fn(width, height, Some(-9999.0), |x, y| (x + 1000 * y) as f32)
	}

	#[test]
	fn open_geographic() -> Result<()> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("dem.tif");
		write_geotiff(&path, &TestRaster::geographic(ramp(200, 100), [-1.0, 50.0, 1.0, 52.0]))?;

		let source = GeoTiffSource::open(&path)?;
		let info = source.info();
		assert_eq!((info.width, info.height), (200, 100));
		assert_eq!(info.crs, "EPSG:4326");
		assert_eq!(info.nodata, Some(-9999.0));
		assert_eq!(info.geo_transform.as_array(), [-1.0, 0.01, 0.0, 52.0, 0.0, -0.02]);
		assert_relative_eq!(info.geo_bbox.x_min, -1.0, epsilon = 1e-9);
		assert_relative_eq!(info.geo_bbox.y_min, 50.0, epsilon = 1e-9);
		assert_relative_eq!(info.geo_bbox.x_max, 1.0, epsilon = 1e-9);
		assert_relative_eq!(info.geo_bbox.y_max, 52.0, epsilon = 1e-9);
		Ok(())
	}

	#[test]
	fn open_web_mercator() -> Result<()> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("dem.tif");
		let raster = TestRaster {
			grid: ramp(64, 64),
			geo_transform: [0.0, 100.0, 0.0, 6_400.0, 0.0, -100.0],
			crs: Crs::WebMercator,
			rows_per_strip: 8,
		};
		write_geotiff(&path, &raster)?;

		let source = GeoTiffSource::open(&path)?;
		assert_eq!(source.info().crs, "EPSG:3857");
		assert_eq!(source.info().native_bounds, [0.0, 0.0, 6_400.0, 6_400.0]);
		assert!(source.info().geo_bbox.x_max > 0.05 && source.info().geo_bbox.x_max < 0.06);
		Ok(())
	}

	#[rstest]
	#[case(0, 0, 3, 2)]
	#[case(10, 5, 20, 30)]
	#[case(190, 90, 10, 10)]
	#[case(0, 0, 200, 100)]
	fn read_across_strips(#[case] col: u32, #[case] row: u32, #[case] width: u32, #[case] height: u32) -> Result<()> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("dem.tif");
		let mut raster = TestRaster::geographic(ramp(200, 100), [-1.0, 50.0, 1.0, 52.0]);
		raster.rows_per_strip = 7;
		write_geotiff(&path, &raster)?;

		let source = GeoTiffSource::open(&path)?;
		let grid = source.read(col, row, width, height)?;
		let expected = ramp(200, 100);
		for y in 0..height {
			for x in 0..width {
				assert_eq!(grid.get(x, y), expected.get(col + x, row + y));
			}
		}
		Ok(())
	}

	#[test]
	fn read_outside_fails() -> Result<()> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("dem.tif");
		write_geotiff(&path, &TestRaster::geographic(ramp(20, 10), [0.0, 0.0, 2.0, 1.0]))?;
		let source = GeoTiffSource::open(&path)?;
		let err = source.read(15, 0, 10, 1).unwrap_err();
		assert!(err.to_string().starts_with("Failed to read window (15, 0, 10, 1)"));
		Ok(())
	}

	#[test]
	fn window_for_tile() -> Result<()> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("dem.tif");
		write_geotiff(&path, &TestRaster::geographic(ramp(200, 100), [-1.0, 50.0, 1.0, 52.0]))?;
		let source = GeoTiffSource::open(&path)?;

		let window = source.pixel_window(&GeoBBox::new(-0.5, 51.0, 0.0, 51.5)?)?;
		assert_relative_eq!(window.col_off, 50.0, epsilon = 1e-6);
		assert_relative_eq!(window.row_off, 25.0, epsilon = 1e-6);
		assert_relative_eq!(window.width, 50.0, epsilon = 1e-6);
		assert_relative_eq!(window.height, 25.0, epsilon = 1e-6);

		let block = source.read_window(&PixelWindow::new(-10.0, 90.5, 20.0, 20.0))?.unwrap();
		assert_eq!((block.col_off, block.row_off), (0, 90));
		assert_eq!((block.grid.width(), block.grid.height()), (10, 10));
		Ok(())
	}

	#[test]
	fn value_range() -> Result<()> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("dem.tif");
		let grid = ElevationGrid::from_fn(30, 300, Some(-9999.0), |x, y| {
			if x == 0 { -9999.0 } else { (x * y) as f32 }
		});
		write_geotiff(&path, &TestRaster::geographic(grid, [0.0, 0.0, 1.0, 1.0]))?;
		let source = GeoTiffSource::open(&path)?;
		assert_eq!(source.value_range(source.info().nodata)?, Some((0.0, 29.0 * 299.0)));
		assert_eq!(source.value_range(None)?, Some((-9999.0, 29.0 * 299.0)));
		Ok(())
	}

	#[test]
	fn missing_file() {
		let err = GeoTiffSource::open(Path::new("/does/not/exist.tif")).unwrap_err();
		assert!(err.to_string().starts_with("Failed to open GeoTIFF"));
	}

	#[test]
	fn plain_tiff_is_not_georeferenced() -> Result<()> {
		use tiff::encoder::{TiffEncoder, colortype::Gray32Float};
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("plain.tif");
		let mut file = File::create(&path)?;
		TiffEncoder::new(&mut file)?.write_image::<Gray32Float>(2, 2, &[1.0, 2.0, 3.0, 4.0])?;

		let err = GeoTiffSource::open(&path).unwrap_err();
		assert!(format!("{err:#}").contains("not georeferenced"));
		Ok(())
	}

	#[rstest]
	#[case("-9999", Some(-9999.0))]
	#[case(" 0\0", Some(0.0))]
	#[case("", None)]
	#[case("3.5e2", Some(350.0))]
	fn nodata_text(#[case] text: &str, #[case] expected: Option<f32>) {
		assert_eq!(parse_nodata(text).unwrap(), expected);
	}

	#[test]
	fn nodata_garbage() {
		assert!(parse_nodata("none").is_err());
	}

	#[test]
	fn interleaved_samples_keep_first_band() {
		let values = first_band(DecodingResult::U16(vec![1, 100, 2, 200, 3, 300]), 2).unwrap();
		assert_eq!(values, vec![1.0, 2.0, 3.0]);
	}
}
