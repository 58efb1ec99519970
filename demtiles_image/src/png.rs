use anyhow::{Result, anyhow, bail};
use image::{
	DynamicImage, ImageEncoder, ImageFormat,
	codecs::png::{CompressionType, FilterType, PngEncoder},
	load_from_memory_with_format,
};

/// Encodes an 8-bit image as PNG with the best compression.
pub fn image2png(image: &DynamicImage) -> Result<Vec<u8>> {
	let color = image.color();
	if color.bytes_per_pixel() != color.channel_count() {
		bail!("png only supports 8-bit images, got {color:?}");
	}

	let mut buffer: Vec<u8> = Vec::new();
	PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive).write_image(
		image.as_bytes(),
		image.width(),
		image.height(),
		color.into(),
	)?;

	Ok(buffer)
}

pub fn png2image(data: &[u8]) -> Result<DynamicImage> {
	load_from_memory_with_format(data, ImageFormat::Png).map_err(|e| anyhow!("Failed to decode PNG image: {e}"))
}
