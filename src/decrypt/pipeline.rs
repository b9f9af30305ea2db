//! Walk an encrypted tree and mirror it, decrypted and unpacked

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{SyncError, SyncResult};
use crate::logging::*;
use crate::mapper::{Direction, RootPair};
use crate::types::{Outcome, WorkItem};
use crate::validation::{is_path_within_root, resolve_path, ValidationError};
use crate::walker::{TreeWalker, WalkSummary};

use super::archive::handle_archive;
use super::gpg::GpgDecryptor;

const GPG_EXTENSION: &str = "gpg";

pub struct DecryptPipeline {
	decryptor: Arc<GpgDecryptor>,
	walker: TreeWalker,
}

impl DecryptPipeline {
	/// Hidden files and directories are never processed
	pub fn new(decryptor: GpgDecryptor, walker: TreeWalker) -> Self {
		DecryptPipeline { decryptor: Arc::new(decryptor), walker: walker.skip_hidden(true) }
	}

	/// Process every file under `base_dir` into `output/<basename(base_dir)>/...`
	///
	/// `copied` in the summary counts the files processed. An `output` inside
	/// `base_dir` is rejected, since the walk would pick up its own results.
	pub async fn run(&self, base_dir: &Path, output: &Path) -> SyncResult<WalkSummary> {
		check_output_outside(base_dir, output)?;
		let pair = RootPair::new(base_dir, output);
		let decryptor = self.decryptor.clone();
		let action = Arc::new(move |item: &WorkItem| -> SyncResult<Outcome> {
			process_file(&decryptor, &item.file.path, &item.counterpart)
		});
		let summary = self.walker.traverse(&pair, Direction::Copy, action).await?;
		info!("processed {} files into {}", summary.copied, output.display());
		Ok(summary)
	}
}

/// Decrypt or copy one file to `dest`, then unpack it if it is an archive
pub fn process_file(decryptor: &GpgDecryptor, src: &Path, dest: &Path) -> SyncResult<Outcome> {
	if let Some(dir) = dest.parent() {
		fs::create_dir_all(dir).map_err(|e| SyncError::io(dir, e))?;
	}

	let produced: PathBuf = if is_encrypted(src) {
		let plain = dest.with_extension("");
		decryptor.decrypt_file(src, &plain)?;
		plain
	} else {
		fs::copy(src, dest).map_err(|e| SyncError::io(src, e))?;
		dest.to_path_buf()
	};

	if let Some(kind) = handle_archive(&produced)? {
		debug!("unpacked {:?} {}", kind, produced.display());
	}
	Ok(Outcome::Copied)
}

/// Reject an output directory that is `base_dir` itself or lies inside it
pub fn check_output_outside(base_dir: &Path, output: &Path) -> SyncResult<()> {
	let base = resolve_path(base_dir)?;
	let out = resolve_path(output)?;
	if is_path_within_root(&out, &base) {
		return Err(SyncError::Validation(ValidationError::PathError(format!(
			"output {} may not be inside {}",
			out.display(),
			base.display()
		))));
	}
	Ok(())
}

fn is_encrypted(path: &Path) -> bool {
	path.extension().map(|ext| ext == GPG_EXTENSION).unwrap_or(false)
}


// vim: ts=4
