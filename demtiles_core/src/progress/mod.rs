//! Terminal progress reporting for long running loops.
//!
//! ```rust
//! use demtiles_core::progress::*;
//!
//! let progress = get_progress_bar("zoom 10", 60, false);
//! progress.inc(10);
//! progress.inc(49);
//! progress.finish();
//! assert_eq!(progress.position(), 60);
//! ```

mod progress_bar;

pub use progress_bar::ProgressBar;

/// Creates a progress bar. A bar that is not `visible` only counts and never touches the terminal.
#[must_use]
pub fn get_progress_bar(message: &str, max_value: u64, visible: bool) -> ProgressBar {
	if visible {
		ProgressBar::new(message, max_value)
	} else {
		ProgressBar::hidden(message, max_value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hidden_bar_counts() {
		let progress = get_progress_bar("Test", 5, false);
		progress.inc(10);
		progress.inc(3);
		assert_eq!(progress.position(), 5);
		progress.finish();
	}
}
