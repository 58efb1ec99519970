use crate::RenderOutcome;
use std::fmt::{self, Display};

/// How many tiles ended in each [`RenderOutcome`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileCounts {
	pub written: u64,
	pub skipped: u64,
	pub out_of_extent: u64,
	pub failed: u64,
}

impl TileCounts {
	pub fn record(&mut self, outcome: &RenderOutcome) {
		match outcome {
			RenderOutcome::Written => self.written += 1,
			RenderOutcome::Skipped => self.skipped += 1,
			RenderOutcome::OutOfExtent => self.out_of_extent += 1,
			RenderOutcome::Failed(_) => self.failed += 1,
		}
	}

	pub fn add(&mut self, other: &TileCounts) {
		self.written += other.written;
		self.skipped += other.skipped;
		self.out_of_extent += other.out_of_extent;
		self.failed += other.failed;
	}

	pub fn total(&self) -> u64 {
		self.written + self.skipped + self.out_of_extent + self.failed
	}
}

impl Display for TileCounts {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} written, {} skipped, {} out of extent, {} failed",
			self.written, self.skipped, self.out_of_extent, self.failed
		)
	}
}

/// Result of one zoom level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoomSummary {
	pub level: u8,
	/// Number of tiles covering the raster at this level.
	pub tiles: u64,
	pub counts: TileCounts,
}

impl ZoomSummary {
	pub fn new(level: u8, tiles: u64) -> ZoomSummary {
		ZoomSummary {
			level,
			tiles,
			counts: TileCounts::default(),
		}
	}
}

impl Display for ZoomSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "zoom {}: {} tiles, {}", self.level, self.tiles, self.counts)
	}
}

/// Result of a whole run, one entry per processed zoom level in ascending order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
	pub levels: Vec<ZoomSummary>,
}

impl Summary {
	pub fn totals(&self) -> TileCounts {
		let mut counts = TileCounts::default();
		for level in &self.levels {
			counts.add(&level.counts);
		}
		counts
	}

	pub fn level(&self, level: u8) -> Option<&ZoomSummary> {
		self.levels.iter().find(|s| s.level == level)
	}

	pub fn has_failures(&self) -> bool {
		self.totals().failed > 0
	}
}

impl Display for Summary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for level in &self.levels {
			writeln!(f, "{level}")?;
		}
		let totals = self.totals();
		write!(f, "total: {} tiles, {totals}", totals.total())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn counting() {
		let mut summary = Summary::default();
		let mut level = ZoomSummary::new(3, 4);
		for outcome in [
			RenderOutcome::Written,
			RenderOutcome::Written,
			RenderOutcome::OutOfExtent,
			RenderOutcome::Failed("broken".into()),
		] {
			level.counts.record(&outcome);
		}
		summary.levels.push(level);

		let mut level = ZoomSummary::new(4, 1);
		level.counts.record(&RenderOutcome::Skipped);
		summary.levels.push(level);

		let totals = summary.totals();
		assert_eq!(
			totals,
			TileCounts {
				written: 2,
				skipped: 1,
				out_of_extent: 1,
				failed: 1
			}
		);
		assert_eq!(totals.total(), 5);
		assert!(summary.has_failures());
		assert_eq!(summary.level(4).unwrap().counts.skipped, 1);
		assert!(summary.level(5).is_none());
	}

	#[test]
	fn display() {
		let mut level = ZoomSummary::new(10, 2);
		level.counts.record(&RenderOutcome::Written);
		level.counts.record(&RenderOutcome::Skipped);
		let summary = Summary { levels: vec![level] };
		assert_eq!(
			summary.to_string(),
			"zoom 10: 2 tiles, 1 written, 1 skipped, 0 out of extent, 0 failed\n\
			 total: 2 tiles, 1 written, 1 skipped, 0 out of extent, 0 failed"
		);
	}
}
