//! Lightweight terminal progress bar: message, bar with sub-character precision, pos/len, percentage,
//! rate and ETA. Redraws are throttled so that thousands of tiny tiles do not flood stderr.

use std::env;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

const REDRAW_INTERVAL: Duration = Duration::from_millis(500);

struct Inner {
	message: String,
	len: u64,
	pos: u64,
	start: Instant,
	last_draw: Option<Instant>,
	finished: bool,
	visible: bool,
}

impl Inner {
	fn new(message: &str, len: u64, visible: bool) -> Inner {
		Inner {
			message: message.to_string(),
			len,
			pos: 0,
			start: Instant::now(),
			last_draw: None,
			finished: false,
			visible,
		}
	}

	fn redraw(&mut self) {
		if !self.visible {
			return;
		}
		if let Some(last) = self.last_draw
			&& last.elapsed() < REDRAW_INTERVAL
			&& !self.finished
		{
			return;
		}
		self.last_draw = Some(Instant::now());

		let line = self.render_line(terminal_width());
		let mut stderr = io::stderr();
		let _ = write!(stderr, "\r\x1b[2K{line}");
		let _ = stderr.flush();
	}

	fn render_line(&self, total_width: usize) -> String {
		let len = self.len.max(1);
		let pos = self.pos.min(len);
		let elapsed = self.start.elapsed().as_secs_f64();
		let per_sec = if elapsed > 0.0 { pos as f64 / elapsed } else { 0.0 };
		let eta_secs = if per_sec > 0.0 {
			((len - pos) as f64 / per_sec).max(0.0)
		} else {
			0.0
		};

		let percent = (pos as f64 * 100.0 / len as f64).floor() as u64;
		let right = format!(
			"▏{}/{} ({percent:>3}%) {:>5} {:>5}",
			self.pos,
			self.len,
			format_rate(per_sec),
			format_eta(Duration::from_secs_f64(eta_secs))
		);

		let taken = self.message.chars().count() + right.chars().count() + 1;
		let bar = make_bar(pos, len, total_width.saturating_sub(taken).max(10));
		format!("{}▕{bar}{right}", self.message)
	}
}

/// A terminal progress bar handle, cloneable and thread-safe.
#[derive(Clone)]
pub struct ProgressBar {
	inner: Arc<Mutex<Inner>>,
}

impl ProgressBar {
	/// A bar drawn on stderr.
	pub fn new(message: &str, max_value: u64) -> ProgressBar {
		let progress = ProgressBar {
			inner: Arc::new(Mutex::new(Inner::new(message, max_value, true))),
		};
		progress.lock().redraw();
		progress
	}

	/// A bar that keeps count without drawing anything.
	pub fn hidden(message: &str, max_value: u64) -> ProgressBar {
		ProgressBar {
			inner: Arc::new(Mutex::new(Inner::new(message, max_value, false))),
		}
	}

	fn lock(&self) -> MutexGuard<'_, Inner> {
		match self.inner.lock() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		}
	}

	pub fn inc(&self, value: u64) {
		let mut inner = self.lock();
		inner.pos = inner.pos.saturating_add(value).min(inner.len);
		inner.redraw();
	}

	#[must_use]
	pub fn position(&self) -> u64 {
		self.lock().pos
	}

	/// Sets the position to the maximum and ends the line.
	pub fn finish(&self) {
		let mut inner = self.lock();
		inner.pos = inner.len;
		inner.finished = true;
		inner.redraw();
		if inner.visible {
			let _ = io::stderr().write_all(b"\n");
			let _ = io::stderr().flush();
		}
	}
}

fn terminal_width() -> usize {
	if let Ok(cols) = env::var("COLUMNS")
		&& let Ok(v) = cols.parse::<usize>()
	{
		return v.max(10);
	}
	80
}

fn make_bar(pos: u64, len: u64, width: usize) -> String {
	let width = width.max(1);
	let exact = (pos as f64 / len.max(1) as f64).clamp(0.0, 1.0) * width as f64;
	let whole = (exact.floor() as usize).min(width);

	// eighths of a cell, thinnest first
	let partials = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];

	let mut s: String = std::iter::repeat_n('█', whole).collect();
	if whole < width {
		let idx = ((exact - whole as f64) * 8.0).floor() as usize;
		s.push(partials[idx.min(7)]);
		s.extend(std::iter::repeat_n(' ', width - whole - 1));
	}
	s
}

fn format_rate(per_sec: f64) -> String {
	if !per_sec.is_finite() {
		return "--/s".to_string();
	}
	let abs = per_sec.abs();
	if abs >= 1_000_000.0 {
		format!("{:.1}M/s", per_sec / 1_000_000.0)
	} else if abs >= 1_000.0 {
		format!("{:.1}k/s", per_sec / 1_000.0)
	} else {
		format!("{per_sec:.0}/s")
	}
}

fn format_eta(d: Duration) -> String {
	let total = d.as_secs();
	let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
	if h > 0 {
		format!("{h:02}:{m:02}:{s:02}")
	} else {
		format!("{m:02}:{s:02}")
	}
}
