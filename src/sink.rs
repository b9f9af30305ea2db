//! Action line sink
//!
//! Every intended or performed action is reported as exactly one line.
//! Workers report concurrently, so sinks must accept `record` from many
//! threads and must never interleave two lines.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Prefix marking a simulated action
pub const DRYRUN_PREFIX: &str = "(dryrun) ";

/// What a line reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
	/// Free-form progress note (run header, phase names)
	Note(String),
	/// `src` is (or would be) copied over `dest`
	Copy { src: PathBuf, dest: PathBuf },
	/// `path` is (or would be) removed
	Delete { path: PathBuf },
}

/// One reported line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLine {
	pub dry_run: bool,
	pub action: Action,
}

impl fmt::Display for ActionLine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.dry_run {
			f.write_str(DRYRUN_PREFIX)?;
		}
		match &self.action {
			Action::Note(msg) => write!(f, "{}", msg),
			Action::Copy { src, dest } => write!(f, "{} -> {}", src.display(), dest.display()),
			Action::Delete { path } => write!(f, "DELETE: {}", path.display()),
		}
	}
}

/// Receiver of action lines
pub trait ActionSink: Send + Sync {
	fn record(&self, line: &ActionLine);
}

impl<T: Fn(&ActionLine) + Send + Sync> ActionSink for T {
	fn record(&self, line: &ActionLine) {
		self(line);
	}
}

/// Writes each line to stdout under the stdout lock
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ActionSink for StdoutSink {
	fn record(&self, line: &ActionLine) {
		let stdout = std::io::stdout();
		let mut out = stdout.lock();
		// A closed stdout must not fail the sync itself
		let _ = writeln!(out, "{}", line);
	}
}

/// Collects rendered lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
	lines: Mutex<Vec<ActionLine>>,
}

impl MemorySink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Snapshot of the recorded lines, in arrival order
	pub fn lines(&self) -> Vec<ActionLine> {
		match self.lines.lock() {
			Ok(guard) => guard.clone(),
			Err(poisoned) => poisoned.into_inner().clone(),
		}
	}

	/// Rendered lines, sorted, for order-independent comparisons
	pub fn rendered_sorted(&self) -> Vec<String> {
		let mut out: Vec<String> = self.lines().iter().map(|l| l.to_string()).collect();
		out.sort();
		out
	}
}

impl ActionSink for MemorySink {
	fn record(&self, line: &ActionLine) {
		match self.lines.lock() {
			Ok(mut guard) => guard.push(line.clone()),
			Err(poisoned) => poisoned.into_inner().push(line.clone()),
		}
	}
}


// vim: ts=4
