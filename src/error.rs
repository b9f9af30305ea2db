//! Error types for treesync operations

use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use crate::validation::ValidationError;

/// Main error type for sync operations
#[derive(Debug)]
pub enum SyncError {
	/// Roots or configuration rejected before any traversal started
	Validation(ValidationError),

	/// I/O failure on a specific file
	Io { path: PathBuf, source: io::Error },

	/// A directory could not be enumerated
	Walk { path: PathBuf, message: String },

	/// External tool failed to start or exited non-zero
	Subprocess { program: String, status: Option<ExitStatus>, stderr: String },

	/// Archive could not be unpacked
	Archive { path: PathBuf, message: String },

	/// Config file unreadable or malformed
	Config { path: PathBuf, message: String },

	/// One or more work items failed during a traversal
	Traversal { failures: usize, first: Box<SyncError> },

	/// Worker task panicked or was cancelled
	Task { message: String },

	/// Operation aborted by user
	Aborted,
}

impl SyncError {
	/// Wrap an I/O error together with the path it happened on
	pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
		SyncError::Io { path: path.as_ref().to_path_buf(), source }
	}

	/// The path this error is about, if it has one
	pub fn path(&self) -> Option<&Path> {
		match self {
			SyncError::Io { path, .. }
			| SyncError::Walk { path, .. }
			| SyncError::Archive { path, .. }
			| SyncError::Config { path, .. } => Some(path),
			SyncError::Traversal { first, .. } => first.path(),
			_ => None,
		}
	}
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncError::Validation(e) => write!(f, "{}", e),
			SyncError::Io { path, source } => write!(f, "I/O error on {}: {}", path.display(), source),
			SyncError::Walk { path, message } => {
				write!(f, "Cannot enumerate {}: {}", path.display(), message)
			}
			SyncError::Subprocess { program, status: Some(status), stderr } => {
				write!(f, "{} failed ({}): {}", program, status, stderr.trim())
			}
			SyncError::Subprocess { program, status: None, stderr } => {
				write!(f, "{} could not be run: {}", program, stderr.trim())
			}
			SyncError::Archive { path, message } => {
				write!(f, "Cannot extract {}: {}", path.display(), message)
			}
			SyncError::Config { path, message } => {
				write!(f, "Invalid config file {}: {}", path.display(), message)
			}
			SyncError::Traversal { failures: 1, first } => write!(f, "{}", first),
			SyncError::Traversal { failures, first } => {
				write!(f, "{} (and {} more failures)", first, failures - 1)
			}
			SyncError::Task { message } => write!(f, "Worker task failed: {}", message),
			SyncError::Aborted => write!(f, "Operation aborted by user"),
		}
	}
}

impl Error for SyncError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			SyncError::Validation(e) => Some(e),
			SyncError::Io { source, .. } => Some(source),
			SyncError::Traversal { first, .. } => Some(first.as_ref()),
			_ => None,
		}
	}
}

impl From<ValidationError> for SyncError {
	fn from(e: ValidationError) -> Self {
		SyncError::Validation(e)
	}
}

impl From<walkdir::Error> for SyncError {
	fn from(e: walkdir::Error) -> Self {
		let path = e.path().map(Path::to_path_buf).unwrap_or_default();
		SyncError::Walk { path, message: e.to_string() }
	}
}

impl From<tokio::task::JoinError> for SyncError {
	fn from(e: tokio::task::JoinError) -> Self {
		SyncError::Task { message: e.to_string() }
	}
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_io_error_mentions_path() {
		let err = SyncError::io("/data/file.txt", io::Error::new(io::ErrorKind::NotFound, "gone"));
		assert!(err.to_string().contains("/data/file.txt"));
		assert_eq!(err.path(), Some(Path::new("/data/file.txt")));
	}

	#[test]
	fn test_traversal_error_display() {
		let first = SyncError::io("/a", io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
		let err = SyncError::Traversal { failures: 3, first: Box::new(first) };
		let msg = err.to_string();
		assert!(msg.contains("/a"));
		assert!(msg.contains("2 more"));
		assert_eq!(err.path(), Some(Path::new("/a")));
	}

	#[test]
	fn test_single_failure_has_no_suffix() {
		let first = SyncError::Task { message: "panicked".to_string() };
		let err = SyncError::Traversal { failures: 1, first: Box::new(first) };
		assert!(!err.to_string().contains("more failures"));
	}

	#[test]
	fn test_validation_is_source() {
		let err: SyncError = ValidationError::PathError("bad".to_string()).into();
		assert!(err.source().is_some());
	}
}

// vim: ts=4
