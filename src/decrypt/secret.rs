//! Passphrase prompt with terminal echo disabled

use std::io::{self, BufRead, Write};
use termios::{tcsetattr, Termios, ECHO, ISIG, TCSANOW};

use crate::error::{SyncError, SyncResult};

/// RAII guard that turns off echo and signal keys on stdin.
///
/// With ISIG cleared an interrupt key arrives as `^C` in the line instead
/// of killing the process with echo still off.
struct EchoGuard {
	fd: i32,
	original: Termios,
}

impl EchoGuard {
	/// Returns None if stdin is not a terminal
	fn new() -> Option<Self> {
		let fd = 0; // stdin
		let original = Termios::from_fd(fd).ok()?;
		let mut quiet = original;
		quiet.c_lflag &= !(ECHO | ISIG);
		tcsetattr(fd, TCSANOW, &quiet).ok()?;
		Some(EchoGuard { fd, original })
	}
}

impl Drop for EchoGuard {
	fn drop(&mut self) {
		let _ = tcsetattr(self.fd, TCSANOW, &self.original);
	}
}

/// Print `prompt` on stderr and read one line from stdin without echoing it
pub fn prompt_secret(prompt: &str) -> SyncResult<String> {
	let mut stderr = io::stderr();
	let _ = write!(stderr, "{}", prompt);
	let _ = stderr.flush();

	let guard = EchoGuard::new();
	let result = read_secret(io::stdin().lock());
	if guard.is_some() {
		drop(guard);
		// The user's Enter was not echoed
		let _ = writeln!(stderr);
	}
	result
}

/// Read one passphrase line, dropping the line terminator.
///
/// End of input, an empty line or an interrupt character aborts.
pub fn read_secret<R: BufRead>(mut reader: R) -> SyncResult<String> {
	let mut line = String::new();
	let n = reader.read_line(&mut line).map_err(|e| SyncError::io("<stdin>", e))?;
	if n == 0 || line.contains('\x03') || line.contains('\x04') {
		return Err(SyncError::Aborted);
	}
	let trimmed = line.trim_end_matches(|c| c == '\n' || c == '\r');
	if trimmed.is_empty() {
		return Err(SyncError::Aborted);
	}
	Ok(trimmed.to_string())
}


// vim: ts=4
