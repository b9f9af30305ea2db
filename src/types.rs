use std::path::PathBuf;

/// A regular file discovered during a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
	/// Absolute path of the file
	pub path: PathBuf,
	/// Size in bytes at enumeration time
	pub size: u64,
	/// Root the walk started from
	pub root: PathBuf,
}

/// One unit of work handed to the worker pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
	pub file: FileCandidate,
	/// Mapped counterpart of `file` in the other tree
	pub counterpart: PathBuf,
}

/// What a work item did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	/// Content already identical, or the source still exists on a delete check
	Unchanged,
	/// File copied (or would be, in dry-run)
	Copied,
	/// File deleted (or would be, in dry-run)
	Deleted,
}

// vim: ts=4
