use anyhow::{Result, ensure};
use std::fmt::{self, Display};

/// Highest zoom level addressable with `u32` tile indices.
pub const MAX_ZOOM_LEVEL: u8 = 31;

/// Closed range of zoom levels `[min, max]` to generate.
///
/// ```
/// use demtiles_core::ZoomRange;
///
/// let zooms = ZoomRange::default();
/// assert_eq!(zooms.iter().collect::<Vec<u8>>(), vec![10, 11, 12, 13, 14, 15]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ZoomRange {
	min: u8,
	max: u8,
}

impl ZoomRange {
	pub const DEFAULT_MIN: u8 = 10;
	pub const DEFAULT_MAX: u8 = 15;

	/// # Errors
	/// Fails unless `min <= max <= 31`.
	pub fn new(min: u8, max: u8) -> Result<ZoomRange> {
		ensure!(
			max <= MAX_ZOOM_LEVEL,
			"max_zoom ({max}) must be <= {MAX_ZOOM_LEVEL}"
		);
		ensure!(min <= max, "min_zoom ({min}) must be <= max_zoom ({max})");
		Ok(ZoomRange { min, max })
	}

	#[must_use]
	pub fn min(&self) -> u8 {
		self.min
	}

	#[must_use]
	pub fn max(&self) -> u8 {
		self.max
	}

	#[must_use]
	pub fn contains(&self, level: u8) -> bool {
		(self.min..=self.max).contains(&level)
	}

	/// Number of levels in the range.
	#[must_use]
	pub fn len(&self) -> usize {
		usize::from(self.max - self.min) + 1
	}

	/// Ascending iterator over the levels.
	pub fn iter(&self) -> std::ops::RangeInclusive<u8> {
		self.min..=self.max
	}
}

impl Default for ZoomRange {
	fn default() -> Self {
		ZoomRange {
			min: Self::DEFAULT_MIN,
			max: Self::DEFAULT_MAX,
		}
	}
}

impl Display for ZoomRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}..={}", self.min, self.max)
	}
}

impl IntoIterator for ZoomRange {
	type Item = u8;
	type IntoIter = std::ops::RangeInclusive<u8>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
