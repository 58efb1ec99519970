use crate::{LuminanceMapping, Resampled};
use image::{DynamicImage, GrayAlphaImage, LumaA};

/// A square luminance + alpha tile, fully transparent until blocks are pasted onto it.
pub struct TileCanvas {
	image: GrayAlphaImage,
}

impl TileCanvas {
	#[must_use]
	pub fn new(size: u32) -> TileCanvas {
		TileCanvas {
			image: GrayAlphaImage::from_pixel(size, size, LumaA([0, 0])),
		}
	}

	#[must_use]
	pub fn size(&self) -> u32 {
		self.image.width()
	}

	/// Draws `block` with its top-left corner at tile pixel (`x`, `y`).
	///
	/// Valid samples become opaque pixels with luminance from `mapping`; invalid ones and everything
	/// outside the tile are skipped.
	pub fn paste(&mut self, block: &Resampled, x: i64, y: i64, mapping: &LuminanceMapping) {
		let size = i64::from(self.size());
		for by in 0..block.height {
			let ty = y + i64::from(by);
			if !(0..size).contains(&ty) {
				continue;
			}
			for bx in 0..block.width {
				let tx = x + i64::from(bx);
				if !(0..size).contains(&tx) {
					continue;
				}
				if let Some((value, true)) = block.get(bx, by) {
					self.image.put_pixel(tx as u32, ty as u32, LumaA([mapping.to_luma(value), 255]));
				}
			}
		}
	}

	/// Whether no pixel has been drawn.
	#[must_use]
	pub fn is_transparent(&self) -> bool {
		self.image.pixels().all(|p| p[1] == 0)
	}

	#[must_use]
	pub fn into_image(self) -> DynamicImage {
		DynamicImage::ImageLumaA8(self.image)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn block(width: u32, height: u32, value: f32) -> Resampled {
		let n = (width * height) as usize;
		Resampled {
			width,
			height,
			values: vec![value; n],
			valid: vec![true; n],
		}
	}

	#[test]
	fn new_canvas_is_transparent() {
		let canvas = TileCanvas::new(4);
		assert!(canvas.is_transparent());
		let image = canvas.into_image();
		assert_eq!((image.width(), image.height()), (4, 4));
		assert_eq!(image.color(), image::ColorType::La8);
	}

	#[test]
	fn paste_full_block() {
		let mut canvas = TileCanvas::new(2);
		canvas.paste(&block(2, 2, 100.0), 0, 0, &LuminanceMapping::Clamp);
		let image = canvas.into_image().into_luma_alpha8();
		assert!(image.pixels().all(|p| *p == LumaA([100, 255])));
	}

	#[test]
	fn paste_clips_and_keeps_rest_transparent() {
		let mut canvas = TileCanvas::new(4);
		canvas.paste(&block(3, 3, 50.0), 2, -1, &LuminanceMapping::Clamp);
		let image = canvas.into_image().into_luma_alpha8();
		assert_eq!(image.get_pixel(2, 0), &LumaA([50, 255]));
		assert_eq!(image.get_pixel(3, 1), &LumaA([50, 255]));
		assert_eq!(image.get_pixel(3, 2), &LumaA([0, 0]));
		assert_eq!(image.get_pixel(1, 0), &LumaA([0, 0]));
		assert_eq!(image.pixels().filter(|p| p[1] == 255).count(), 4);
	}

	#[test]
	fn invalid_samples_stay_transparent() {
		let mut b = block(2, 1, 10.0);
		b.valid[0] = false;
		let mut canvas = TileCanvas::new(2);
		canvas.paste(&b, 0, 0, &LuminanceMapping::Linear { min: 0.0, max: 10.0 });
		let image = canvas.into_image().into_luma_alpha8();
		assert_eq!(image.get_pixel(0, 0), &LumaA([0, 0]));
		assert_eq!(image.get_pixel(1, 0), &LumaA([255, 255]));
	}
}
