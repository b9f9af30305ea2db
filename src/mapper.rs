//! Path mapping between the source tree and the destination tree
//!
//! The destination does not mirror the *contents* of the source root, it
//! mirrors the source root itself: syncing `foo` into `bar` writes
//! `bar/foo/...`. That nested `bar/foo` subtree is the managed namespace.
//! Copy always writes inside it and delete only ever considers files inside
//! it, so unrelated content elsewhere under `bar` is never touched.
//!
//! All functions here are pure path arithmetic; nothing touches the disk.

use std::path::{Path, PathBuf};

/// Which way a traversal runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	/// Walk the source, act on the destination counterpart
	Copy,
	/// Walk the destination, look up the source counterpart
	Delete,
}

impl std::fmt::Display for Direction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Direction::Copy => write!(f, "copy"),
			Direction::Delete => write!(f, "delete"),
		}
	}
}

/// Result of mapping a path into the other tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapping {
	/// The counterpart path in the other tree
	Mapped(PathBuf),
	/// The path is outside the managed namespace; skip it
	NotApplicable,
}

impl Mapping {
	pub fn into_option(self) -> Option<PathBuf> {
		match self {
			Mapping::Mapped(path) => Some(path),
			Mapping::NotApplicable => None,
		}
	}

	pub fn is_applicable(&self) -> bool {
		matches!(self, Mapping::Mapped(_))
	}
}

/// The (source, destination) directory pair of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPair {
	source: PathBuf,
	destination: PathBuf,
}

impl RootPair {
	/// Both paths are expected to be absolute and resolved
	pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
		RootPair { source: source.into(), destination: destination.into() }
	}

	pub fn source(&self) -> &Path {
		&self.source
	}

	pub fn destination(&self) -> &Path {
		&self.destination
	}

	/// `destination / basename(source)`, the subtree copy writes into
	pub fn namespace(&self) -> Option<PathBuf> {
		self.source.file_name().map(|name| self.destination.join(name))
	}

	/// The root a traversal in `direction` enumerates
	pub fn walk_root(&self, direction: Direction) -> &Path {
		match direction {
			Direction::Copy => &self.source,
			Direction::Delete => &self.destination,
		}
	}

	/// Map a file found while walking `walk_root(direction)` into the other tree
	pub fn counterpart(&self, direction: Direction, file: &Path) -> Mapping {
		match direction {
			Direction::Copy => map_copy(file, &self.source, &self.destination),
			Direction::Delete => map_delete(file, &self.destination, &self.source),
		}
	}
}

/// Map a file under `source_root` to its place under `dest_root`.
///
/// The path is taken relative to the *parent* of `source_root`, so the
/// source root's own name becomes the first segment under `dest_root`.
pub fn map_copy(file_in_source: &Path, source_root: &Path, dest_root: &Path) -> Mapping {
	let parent = match source_root.parent() {
		Some(parent) if source_root.file_name().is_some() => parent,
		_ => return Mapping::NotApplicable,
	};
	if !file_in_source.starts_with(source_root) {
		return Mapping::NotApplicable;
	}
	match file_in_source.strip_prefix(parent) {
		Ok(relative) => Mapping::Mapped(dest_root.join(relative)),
		Err(_) => Mapping::NotApplicable,
	}
}

/// Map a file under `dest_root` back to where it would live under `source_root`.
///
/// Only files strictly inside `dest_root / basename(source_root)` map;
/// anything else is [`Mapping::NotApplicable`].
pub fn map_delete(file_in_dest: &Path, dest_root: &Path, source_root: &Path) -> Mapping {
	let name = match source_root.file_name() {
		Some(name) => name,
		None => return Mapping::NotApplicable,
	};
	let namespace = dest_root.join(name);
	match file_in_dest.strip_prefix(&namespace) {
		Ok(relative) if !relative.as_os_str().is_empty() => {
			Mapping::Mapped(source_root.join(relative))
		}
		_ => Mapping::NotApplicable,
	}
}


// vim: ts=4
