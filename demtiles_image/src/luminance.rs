use std::fmt::{self, Display};

/// How an elevation value becomes an 8-bit luminance value.
///
/// ```
/// use demtiles_image::LuminanceMapping;
///
/// let linear = LuminanceMapping::Linear { min: 0.0, max: 510.0 };
/// assert_eq!(linear.to_luma(255.0), 128);
/// assert_eq!(linear.to_luma(-20.0), 0);
///
/// assert_eq!(LuminanceMapping::Clamp.to_luma(312.7), 255);
/// assert_eq!(LuminanceMapping::Clamp.to_luma(42.9), 42);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LuminanceMapping {
	/// `[min, max]` is stretched onto `0..=255`; values outside are clamped.
	Linear { min: f32, max: f32 },
	/// The elevation is used as luminance directly, truncated and clamped to `0..=255`.
	#[default]
	Clamp,
}

impl LuminanceMapping {
	/// Linear mapping over a value range, as produced by [`ElevationGrid::value_range`](crate::ElevationGrid::value_range).
	#[must_use]
	pub fn from_range((min, max): (f32, f32)) -> LuminanceMapping {
		LuminanceMapping::Linear { min, max }
	}

	#[must_use]
	pub fn to_luma(&self, value: f32) -> u8 {
		match *self {
			LuminanceMapping::Linear { min, max } => {
				if max <= min {
					return 0;
				}
				((value - min) / (max - min) * 255.0).round().clamp(0.0, 255.0) as u8
			}
			LuminanceMapping::Clamp => value.clamp(0.0, 255.0) as u8,
		}
	}
}

impl Display for LuminanceMapping {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LuminanceMapping::Linear { min, max } => write!(f, "linear {min}..{max}"),
			LuminanceMapping::Clamp => write!(f, "clamp"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(100.0, 0)]
	#[case(99.0, 0)]
	#[case(150.0, 128)]
	#[case(200.0, 255)]
	#[case(1000.0, 255)]
	fn linear(#[case] value: f32, #[case] luma: u8) {
		let mapping = LuminanceMapping::Linear { min: 100.0, max: 200.0 };
		assert_eq!(mapping.to_luma(value), luma);
	}

	#[test]
	fn flat_range_is_black() {
		let mapping = LuminanceMapping::from_range((7.0, 7.0));
		assert_eq!(mapping.to_luma(7.0), 0);
		assert_eq!(mapping.to_luma(8.0), 0);
	}

	#[rstest]
	#[case(-3.0, 0)]
	#[case(0.9, 0)]
	#[case(128.5, 128)]
	#[case(255.0, 255)]
	#[case(4000.0, 255)]
	fn clamp(#[case] value: f32, #[case] luma: u8) {
		assert_eq!(LuminanceMapping::Clamp.to_luma(value), luma);
	}

	#[test]
	fn display() {
		assert_eq!(LuminanceMapping::Linear { min: 0.0, max: 10.5 }.to_string(), "linear 0..10.5");
		assert_eq!(LuminanceMapping::Clamp.to_string(), "clamp");
	}
}
