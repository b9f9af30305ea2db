//! Sync decision policy
//!
//! Copy is decided by content identity; delete by existence alone. A
//! destination file that merely differs from its source is never deleted,
//! only one with no source counterpart at all.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{SyncError, SyncResult};
use crate::identity::{self, BUF_SIZE};
use crate::logging::*;
use crate::mapper::Direction;
use crate::mode::Gate;
use crate::types::{Outcome, WorkItem};

/// True unless `dest` is a regular file with the same size and digest as `src`.
///
/// `src_size` is the size seen during enumeration, if known.
pub fn should_copy(src: &Path, src_size: Option<u64>, dest: &Path, buf_size: usize) -> SyncResult<bool> {
	Ok(!identity::same_content(src, src_size, dest, buf_size)?)
}

/// True iff nothing at all (of any type) exists at `mapped_src`.
///
/// A dangling symlink counts as existing. An error other than "not found"
/// is returned so the destination file is left alone.
pub fn should_delete(mapped_src: &Path) -> SyncResult<bool> {
	match fs::symlink_metadata(mapped_src) {
		Ok(_) => Ok(false),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
		Err(e) => Err(SyncError::io(mapped_src, e)),
	}
}

/// Decision policy bound to a mutation gate
#[derive(Debug, Clone)]
pub struct SyncPolicy {
	gate: Gate,
	buf_size: usize,
}

impl SyncPolicy {
	pub fn new(gate: Gate) -> Self {
		SyncPolicy { gate, buf_size: BUF_SIZE }
	}

	pub fn with_buffer_size(mut self, buf_size: usize) -> Self {
		self.buf_size = buf_size;
		self
	}

	pub fn gate(&self) -> &Gate {
		&self.gate
	}

	/// Copy `item.file` over `item.counterpart` unless the content already matches
	pub fn copy_if_needed(&self, item: &WorkItem) -> SyncResult<Outcome> {
		let src = &item.file.path;
		let dest = &item.counterpart;
		if !should_copy(src, Some(item.file.size), dest, self.buf_size)? {
			debug!("unchanged: {}", dest.display());
			return Ok(Outcome::Unchanged);
		}
		self.gate.copy(src, dest)?;
		Ok(Outcome::Copied)
	}

	/// Delete `item.file` (a destination file) when `item.counterpart` is gone
	pub fn delete_if_orphaned(&self, item: &WorkItem) -> SyncResult<Outcome> {
		if !should_delete(&item.counterpart)? {
			return Ok(Outcome::Unchanged);
		}
		self.gate.delete(&item.file.path)?;
		Ok(Outcome::Deleted)
	}

	/// Run the action for a traversal in `direction`
	pub fn apply(&self, direction: Direction, item: &WorkItem) -> SyncResult<Outcome> {
		match direction {
			Direction::Copy => self.copy_if_needed(item),
			Direction::Delete => self.delete_if_orphaned(item),
		}
	}
}


// vim: ts=4
