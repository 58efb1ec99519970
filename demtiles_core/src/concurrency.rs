//! Worker counts for tile rendering.
//!
//! ```
//! use demtiles_core::ConcurrencyLimits;
//!
//! let limits = ConcurrencyLimits::default();
//! assert_eq!(limits.render_workers, ConcurrencyLimits::cpu_count());
//!
//! // a configured worker count of 0 means "use the default"
//! let limits = ConcurrencyLimits::from_option(Some(0));
//! assert_eq!(limits.render_workers, ConcurrencyLimits::cpu_count());
//! assert_eq!(ConcurrencyLimits::from_option(Some(3)).render_workers, 3);
//! ```

/// How many tiles may be rendered at the same time, and how large the blocking thread pool needs to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
	/// Tiles rendered in parallel. `1` renders strictly one tile after the other.
	pub render_workers: usize,

	/// Upper limit for the blocking threads of the runtime that executes the workers.
	pub blocking_threads: usize,
}

impl ConcurrencyLimits {
	pub fn new(render_workers: usize) -> Self {
		let render_workers = render_workers.max(1);
		Self {
			render_workers,
			blocking_threads: render_workers,
		}
	}

	/// Uses the configured worker count, falling back to the CPU count for `None` or `0`.
	pub fn from_option(render_workers: Option<usize>) -> Self {
		match render_workers {
			Some(n) if n > 0 => Self::new(n),
			_ => Self::default(),
		}
	}

	/// Number of logical CPUs available.
	pub fn cpu_count() -> usize {
		num_cpus::get()
	}
}

impl Default for ConcurrencyLimits {
	fn default() -> Self {
		Self::new(num_cpus::get())
	}
}
