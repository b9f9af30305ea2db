//! Content identity: streaming SHA-256 digests of file contents
//!
//! Two files are the same content iff both exist, their sizes match and
//! their digests match. The size check runs first so differing files are
//! usually rejected without reading either of them.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{SyncError, SyncResult};

/// Read chunk size used while hashing
pub const BUF_SIZE: usize = 65536;

/// Hex-encoded SHA-256 digest of a file's contents, read in `BUF_SIZE` chunks
pub fn file_digest(path: &Path) -> SyncResult<String> {
	file_digest_with_buffer(path, BUF_SIZE)
}

/// Same as [`file_digest`] with an explicit read buffer size
pub fn file_digest_with_buffer(path: &Path, buf_size: usize) -> SyncResult<String> {
	let mut file = fs::File::open(path).map_err(|e| SyncError::io(path, e))?;
	let mut hasher = Sha256::new();
	let mut buf = vec![0u8; buf_size.max(1)];
	loop {
		let n = match file.read(&mut buf) {
			Ok(0) => break,
			Ok(n) => n,
			Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
			Err(e) => return Err(SyncError::io(path, e)),
		};
		hasher.update(&buf[..n]);
	}
	Ok(hex::encode(hasher.finalize()))
}

/// Compare two regular files by size, then by digest.
///
/// `a_size` lets the caller pass a size it already knows (from the walk)
/// so the first file is not stat'ed twice.
pub fn same_content(a: &Path, a_size: Option<u64>, b: &Path, buf_size: usize) -> SyncResult<bool> {
	let b_meta = match fs::metadata(b) {
		Ok(m) if m.is_file() => m,
		Ok(_) => return Ok(false),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
		Err(e) => return Err(SyncError::io(b, e)),
	};
	let a_size = match a_size {
		Some(size) => size,
		None => fs::metadata(a).map_err(|e| SyncError::io(a, e))?.len(),
	};
	if a_size != b_meta.len() {
		return Ok(false);
	}
	Ok(file_digest_with_buffer(a, buf_size)? == file_digest_with_buffer(b, buf_size)?)
}


// vim: ts=4
