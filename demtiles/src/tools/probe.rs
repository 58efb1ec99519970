use super::ConfigArgs;
use anyhow::Result;
use demtiles_core::TileBBox;
use demtiles_raster::open_raster;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// elevation raster, e.g. a GeoTIFF in EPSG:4326 or EPSG:3857
	#[arg(required = true)]
	filename: PathBuf,

	#[command(flatten)]
	config: ConfigArgs,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	eprintln!("probe {:?}", arguments.filename);

	let config = arguments.config.load()?;
	let source = open_raster(&arguments.filename)?;
	let info = source.info();
	let nodata = config.nodata.or(info.nodata);

	println!("size: {}x{}", info.width, info.height);
	println!("crs: {}", info.crs);
	println!("geotransform: {:?}", info.geo_transform.as_array());
	let [pixel_width, pixel_height] = info.geo_transform.pixel_size();
	println!("pixel size: {pixel_width} x {pixel_height}");
	println!("native bounds: {:?}", info.native_bounds);
	println!("geographic bounds: {:?}", info.geo_bbox.as_array());
	match nodata {
		Some(value) => println!("nodata: {value}"),
		None => println!("nodata: none"),
	}
	match source.value_range(nodata)? {
		Some((min, max)) => println!("value range: {min}..{max}"),
		None => println!("value range: no valid samples"),
	}
	println!("luminance: {}", config.luminance.resolve(source.as_ref(), nodata)?);

	println!("tiles:");
	let mut total = 0;
	for level in config.zoom_range()? {
		let bbox = TileBBox::from_geo(level, &info.geo_bbox)?;
		println!("  zoom {level}: {} tiles ({bbox:?})", bbox.count_tiles());
		total += bbox.count_tiles();
	}
	println!("  total: {total} tiles");

	Ok(())
}
