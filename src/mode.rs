//! Execution mode gate
//!
//! Every filesystem mutation goes through a [`Gate`]. In dry-run mode the
//! gate records the same action line it would record when forced, prefixed
//! with `(dryrun) `, and returns `Ok(())` without touching the disk.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{SyncError, SyncResult};
use crate::logging::*;
use crate::sink::{Action, ActionLine, ActionSink};

/// Suffix of in-progress copies; renamed over the destination when complete
pub const TEMP_SUFFIX: &str = ".treesync-tmp";

/// Whether mutations are simulated or performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
	/// Log intended mutations only
	#[default]
	DryRun,
	/// Perform mutations
	Force,
}

impl ExecutionMode {
	/// `--force` leaves dry-run; nothing else does
	pub fn from_force(force: bool) -> Self {
		if force {
			ExecutionMode::Force
		} else {
			ExecutionMode::DryRun
		}
	}

	pub fn is_dry_run(self) -> bool {
		self == ExecutionMode::DryRun
	}
}

/// Mutation gate bound to one execution mode and one sink
#[derive(Clone)]
pub struct Gate {
	mode: ExecutionMode,
	sink: Arc<dyn ActionSink>,
}

impl std::fmt::Debug for Gate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Gate").field("mode", &self.mode).finish()
	}
}

impl Gate {
	pub fn new(mode: ExecutionMode, sink: Arc<dyn ActionSink>) -> Self {
		Gate { mode, sink }
	}

	pub fn mode(&self) -> ExecutionMode {
		self.mode
	}

	fn emit(&self, action: Action) {
		self.sink.record(&ActionLine { dry_run: self.mode.is_dry_run(), action });
	}

	/// Report a progress note
	pub fn note(&self, msg: impl Into<String>) {
		self.emit(Action::Note(msg.into()));
	}

	/// Create `dir` and its parents; succeeds if it already exists
	pub fn create_dir_all(&self, dir: &Path) -> SyncResult<()> {
		if self.mode.is_dry_run() {
			debug!("(dryrun) mkdir -p {}", dir.display());
			return Ok(());
		}
		fs::create_dir_all(dir).map_err(|e| SyncError::io(dir, e))
	}

	/// Copy the bytes of `src` over `dest`, creating parent directories.
	///
	/// The data is written to a sibling temp file first and renamed into
	/// place, so `dest` never holds a partial copy.
	pub fn copy(&self, src: &Path, dest: &Path) -> SyncResult<()> {
		self.emit(Action::Copy { src: src.to_path_buf(), dest: dest.to_path_buf() });
		if self.mode.is_dry_run() {
			return Ok(());
		}
		if let Some(parent) = dest.parent() {
			self.create_dir_all(parent)?;
		}
		let temp = temp_path_for(dest);
		if let Err(e) = fs::copy(src, &temp) {
			let _ = fs::remove_file(&temp);
			return Err(SyncError::io(src, e));
		}
		if let Err(e) = fs::rename(&temp, dest) {
			let _ = fs::remove_file(&temp);
			return Err(SyncError::io(dest, e));
		}
		Ok(())
	}

	/// Remove the file at `path`
	pub fn delete(&self, path: &Path) -> SyncResult<()> {
		self.emit(Action::Delete { path: path.to_path_buf() });
		if self.mode.is_dry_run() {
			return Ok(());
		}
		fs::remove_file(path).map_err(|e| SyncError::io(path, e))
	}
}

/// `dir/name` -> `dir/.name.treesync-tmp`
pub fn temp_path_for(dest: &Path) -> PathBuf {
	let mut name = OsString::from(".");
	name.push(dest.file_name().unwrap_or_default());
	name.push(TEMP_SUFFIX);
	dest.with_file_name(name)
}


// vim: ts=4
