//! Root path resolution and validation

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use super::ValidationError;

/// Check if path is within a root directory (or is the root itself)
pub fn is_path_within_root(path: &Path, root: &Path) -> bool {
	path.starts_with(root)
}

/// Resolve a path to an absolute path with symlinks resolved.
///
/// Paths that do not exist yet are resolved through their deepest existing
/// ancestor; the missing tail is appended lexically.
pub fn resolve_path(path: &Path) -> Result<PathBuf, ValidationError> {
	if path.as_os_str().is_empty() {
		return Err(ValidationError::PathError("Needs start and target locations".to_string()));
	}

	let absolute = if path.is_absolute() {
		path.to_path_buf()
	} else {
		let cwd = env::current_dir().map_err(|e| {
			ValidationError::PathError(format!("Cannot determine current directory: {}", e))
		})?;
		cwd.join(path)
	};

	let mut existing = absolute.as_path();
	let mut tail: Vec<Component> = Vec::new();
	loop {
		if let Ok(resolved) = fs::canonicalize(existing) {
			let mut out = resolved;
			for component in tail.iter().rev() {
				match component {
					Component::ParentDir => {
						out.pop();
					}
					Component::CurDir => {}
					other => out.push(other.as_os_str()),
				}
			}
			return Ok(out);
		}
		match (existing.parent(), existing.components().next_back()) {
			(Some(parent), Some(last)) => {
				tail.push(last);
				existing = parent;
			}
			_ => return Ok(absolute),
		}
	}
}

/// Validate the source root of a sync: an existing directory with a name.
///
/// The name matters because the destination nests the source under
/// `target/<basename(start)>`.
pub fn validate_source_root(start: &Path) -> Result<(), ValidationError> {
	if !start.is_dir() {
		return Err(ValidationError::PathError(format!(
			"start and target need to be directories: {} is not a directory",
			start.display()
		)));
	}
	if start.file_name().is_none() {
		return Err(ValidationError::PathError(format!(
			"start {} has no final path component to nest under the target",
			start.display()
		)));
	}
	Ok(())
}

/// Validate the destination root against an already validated source root.
pub fn validate_destination_root(target: &Path, start: &Path) -> Result<(), ValidationError> {
	if target.exists() && !target.is_dir() {
		return Err(ValidationError::PathError(format!(
			"start and target need to be directories: {} exists and is not a directory",
			target.display()
		)));
	}
	if is_path_within_root(target, start) {
		return Err(ValidationError::PathError(format!(
			"target {} may not be inside start {}",
			target.display(),
			start.display()
		)));
	}
	Ok(())
}


// vim: ts=4
