//! Archive extraction in place

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncResult};
use crate::logging::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
	/// `.tgz` or `.tar.gz`
	TarGz,
	Tar,
	/// Single gzip-compressed file
	Gz,
}

/// Recognise an archive by file name
pub fn archive_kind(path: &Path) -> Option<ArchiveKind> {
	let name = path.file_name()?.to_str()?.to_lowercase();
	if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
		Some(ArchiveKind::TarGz)
	} else if name.ends_with(".tar") {
		Some(ArchiveKind::Tar)
	} else if name.ends_with(".gz") {
		Some(ArchiveKind::Gz)
	} else {
		None
	}
}

/// Unpack `path` into its own directory and remove it.
///
/// Tar members land next to the archive; a plain `.gz` becomes the same
/// name without the suffix. Returns None (and leaves the file alone) when
/// `path` is not an archive.
pub fn handle_archive(path: &Path) -> SyncResult<Option<ArchiveKind>> {
	let kind = match archive_kind(path) {
		Some(kind) => kind,
		None => return Ok(None),
	};
	let dir = match path.parent() {
		Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
		_ => PathBuf::from("."),
	};
	let gunzipped = path.with_extension("");
	if kind == ArchiveKind::Gz && gunzipped.as_path() == path {
		return Err(SyncError::Archive {
			path: path.to_path_buf(),
			message: "no file name left after stripping .gz".to_string(),
		});
	}
	let file = File::open(path).map_err(|e| SyncError::io(path, e))?;

	debug!("extracting {} ({:?})", path.display(), kind);
	match kind {
		ArchiveKind::TarGz => unpack(path, GzDecoder::new(file), &dir)?,
		ArchiveKind::Tar => unpack(path, file, &dir)?,
		ArchiveKind::Gz => gunzip(path, file, &gunzipped)?,
	}

	fs::remove_file(path).map_err(|e| SyncError::io(path, e))?;
	Ok(Some(kind))
}

fn unpack<R: Read>(path: &Path, reader: R, dir: &Path) -> SyncResult<()> {
	let mut archive = tar::Archive::new(reader);
	archive
		.unpack(dir)
		.map_err(|e| SyncError::Archive { path: path.to_path_buf(), message: e.to_string() })
}

fn gunzip(path: &Path, file: File, out: &Path) -> SyncResult<()> {
	let mut decoder = GzDecoder::new(file);
	let mut dest = File::create(out).map_err(|e| SyncError::io(out, e))?;
	if let Err(e) = io::copy(&mut decoder, &mut dest) {
		drop(dest);
		let _ = fs::remove_file(out);
		return Err(SyncError::Archive { path: path.to_path_buf(), message: e.to_string() });
	}
	Ok(())
}


// vim: ts=4
