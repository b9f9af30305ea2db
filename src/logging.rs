//! Logging prelude module for convenient access to tracing macros.
//!
//! Diagnostics only. The user-facing action lines go through
//! [`crate::sink`], not through tracing.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("This is an info message");
//! debug!("Debug information");
//! ```

pub use tracing::{debug, error, info, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// By default, logs at INFO level and above are displayed (DEBUG with
/// `verbose`). `RUST_LOG` overrides both:
///
/// ```bash
/// RUST_LOG=debug treesync -c src dst
/// RUST_LOG=treesync::walker=trace treesync -c src dst
/// ```
pub fn init_tracing(verbose: bool) {
	let default_level = if verbose { "debug" } else { "info" };
	let _ = tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
		)
		.with_writer(std::io::stderr)
		.with_target(false)
		.try_init();
}

// vim: ts=4
