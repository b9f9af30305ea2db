//! GPG decryption through the `gpg` command line tool

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{SyncError, SyncResult};
use crate::logging::*;

/// Decrypts single files with a fixed passphrase.
///
/// The passphrase goes to gpg on stdin (`--passphrase-fd 0`), never on
/// the command line.
#[derive(Clone)]
pub struct GpgDecryptor {
	program: String,
	passphrase: String,
}

impl fmt::Debug for GpgDecryptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GpgDecryptor")
			.field("program", &self.program)
			.field("passphrase", &"<redacted>")
			.finish()
	}
}

impl GpgDecryptor {
	pub fn new(passphrase: impl Into<String>) -> Self {
		GpgDecryptor { program: "gpg".to_string(), passphrase: passphrase.into() }
	}

	/// Use a different gpg binary
	pub fn with_program(mut self, program: impl Into<String>) -> Self {
		self.program = program.into();
		self
	}

	pub fn program(&self) -> &str {
		&self.program
	}

	/// Arguments passed to gpg for `src`
	pub fn args(&self, src: &Path) -> Vec<OsString> {
		let mut args: Vec<OsString> = [
			"--batch",
			"--quiet",
			"--ignore-mdc-error",
			"--pinentry-mode",
			"loopback",
			"--passphrase-fd",
			"0",
			"--decrypt",
		]
		.iter()
		.map(OsString::from)
		.collect();
		args.push(src.as_os_str().to_os_string());
		args
	}

	/// Decrypt `src` into `dest`. On failure `dest` is removed.
	pub fn decrypt_file(&self, src: &Path, dest: &Path) -> SyncResult<()> {
		debug!("decrypting {} -> {}", src.display(), dest.display());
		let out = File::create(dest).map_err(|e| SyncError::io(dest, e))?;

		let spawned = Command::new(&self.program)
			.args(self.args(src))
			.stdin(Stdio::piped())
			.stdout(Stdio::from(out))
			.stderr(Stdio::piped())
			.spawn();
		let mut child = match spawned {
			Ok(child) => child,
			Err(e) => {
				let _ = fs::remove_file(dest);
				return Err(SyncError::Subprocess {
					program: self.program.clone(),
					status: None,
					stderr: e.to_string(),
				});
			}
		};

		if let Some(mut stdin) = child.stdin.take() {
			match writeln!(stdin, "{}", self.passphrase) {
				// gpg may exit before reading the passphrase
				Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
					let _ = child.kill();
					let _ = child.wait();
					let _ = fs::remove_file(dest);
					return Err(SyncError::Subprocess {
						program: self.program.clone(),
						status: None,
						stderr: e.to_string(),
					});
				}
				_ => {}
			}
		}

		let output = child.wait_with_output().map_err(|e| SyncError::Subprocess {
			program: self.program.clone(),
			status: None,
			stderr: e.to_string(),
		})?;
		if !output.status.success() {
			let _ = fs::remove_file(dest);
			return Err(SyncError::Subprocess {
				program: self.program.clone(),
				status: Some(output.status),
				stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
			});
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_args_do_not_carry_passphrase() {
		let gpg = GpgDecryptor::new("s3cret");
		let args = gpg.args(Path::new("/in/file.gpg"));
		assert!(args.iter().all(|a| a != "s3cret"));
		assert_eq!(args.last().unwrap(), "/in/file.gpg");
		assert!(args.iter().any(|a| a == "--passphrase-fd"));
	}

	#[test]
	fn test_debug_redacts_passphrase() {
		let gpg = GpgDecryptor::new("s3cret");
		assert!(!format!("{:?}", gpg).contains("s3cret"));
	}

	#[test]
	fn test_missing_program() {
		let tmp = TempDir::new().unwrap();
		let dest = tmp.path().join("out");
		let gpg = GpgDecryptor::new("pw").with_program("/nonexistent/treesync-gpg");

		let err = gpg.decrypt_file(&tmp.path().join("in.gpg"), &dest).unwrap_err();
		assert!(matches!(err, SyncError::Subprocess { status: None, .. }));
		assert!(!dest.exists());
	}

	#[cfg(unix)]
	#[test]
	fn test_nonzero_exit_removes_output() {
		let tmp = TempDir::new().unwrap();
		let dest = tmp.path().join("out");
		let gpg = GpgDecryptor::new("pw").with_program("false");

		let err = gpg.decrypt_file(&tmp.path().join("in.gpg"), &dest).unwrap_err();
		assert!(matches!(err, SyncError::Subprocess { status: Some(_), .. }));
		assert!(!dest.exists());
	}

	#[cfg(unix)]
	#[test]
	fn test_success_keeps_output() {
		let tmp = TempDir::new().unwrap();
		let dest = tmp.path().join("out");
		let gpg = GpgDecryptor::new("pw").with_program("true");

		gpg.decrypt_file(&tmp.path().join("in.gpg"), &dest).unwrap();
		assert!(dest.exists());
	}
}

// vim: ts=4
