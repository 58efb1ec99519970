use anyhow::{Result, ensure};
use std::fmt::{self, Debug};

/// A row-major grid of elevation samples.
///
/// Samples equal to the nodata value, and NaN or infinite samples, are *invalid*: they carry no
/// elevation and end up transparent in the rendered tile.
#[derive(Clone, PartialEq)]
pub struct ElevationGrid {
	width: u32,
	height: u32,
	values: Vec<f32>,
	nodata: Option<f32>,
}

impl ElevationGrid {
	/// # Errors
	/// Fails if `values` does not hold exactly `width * height` samples.
	pub fn new(width: u32, height: u32, values: Vec<f32>, nodata: Option<f32>) -> Result<ElevationGrid> {
		let expected = width as usize * height as usize;
		ensure!(
			values.len() == expected,
			"grid of {width}x{height} needs {expected} samples, got {}",
			values.len()
		);
		Ok(ElevationGrid {
			width,
			height,
			values,
			nodata,
		})
	}

	/// Builds a grid by evaluating `f(x, y)` for every sample.
	pub fn from_fn(width: u32, height: u32, nodata: Option<f32>, f: impl Fn(u32, u32) -> f32) -> ElevationGrid {
		let values = (0..height).flat_map(|y| (0..width).map(move |x| (x, y))).map(|(x, y)| f(x, y)).collect();
		ElevationGrid {
			width,
			height,
			values,
			nodata,
		}
	}

	/// Replaces the nodata value.
	#[must_use]
	pub fn with_nodata(mut self, nodata: Option<f32>) -> ElevationGrid {
		self.nodata = nodata;
		self
	}

	#[must_use]
	pub fn width(&self) -> u32 {
		self.width
	}

	#[must_use]
	pub fn height(&self) -> u32 {
		self.height
	}

	#[must_use]
	pub fn nodata(&self) -> Option<f32> {
		self.nodata
	}

	#[must_use]
	pub fn values(&self) -> &[f32] {
		&self.values
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Sample at column `x`, row `y`.
	#[must_use]
	pub fn get(&self, x: u32, y: u32) -> Option<f32> {
		if x >= self.width || y >= self.height {
			return None;
		}
		self.values.get(y as usize * self.width as usize + x as usize).copied()
	}

	#[must_use]
	pub fn is_valid(&self, value: f32) -> bool {
		is_valid_sample(value, self.nodata)
	}

	pub fn valid_values(&self) -> impl Iterator<Item = f32> + '_ {
		self.values.iter().copied().filter(|v| self.is_valid(*v))
	}

	#[must_use]
	pub fn count_valid(&self) -> usize {
		self.valid_values().count()
	}

	#[must_use]
	pub fn has_valid_values(&self) -> bool {
		self.values.iter().any(|v| self.is_valid(*v))
	}

	/// Minimum and maximum of all valid samples.
	#[must_use]
	pub fn value_range(&self) -> Option<(f32, f32)> {
		self.valid_values().fold(None, |range, v| match range {
			None => Some((v, v)),
			Some((min, max)) => Some((min.min(v), max.max(v))),
		})
	}

	/// Mean of all valid samples.
	#[must_use]
	pub fn mean(&self) -> Option<f32> {
		let (sum, count) = self
			.valid_values()
			.fold((0f64, 0usize), |(sum, count), v| (sum + f64::from(v), count + 1));
		(count > 0).then(|| (sum / count as f64) as f32)
	}
}

/// Whether `value` carries an elevation: finite, and not the nodata value.
#[must_use]
pub fn is_valid_sample(value: f32, nodata: Option<f32>) -> bool {
	value.is_finite() && nodata.is_none_or(|n| value != n)
}

impl Debug for ElevationGrid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ElevationGrid({}x{}, nodata: {:?})", self.width, self.height, self.nodata)
	}
}
