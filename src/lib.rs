//! # treesync - content-addressed one-way directory tree sync
//!
//! treesync mirrors a source tree into `target/<basename(start)>/...`,
//! copying only files whose SHA-256 content differs, and optionally
//! deletes destination files whose source counterpart no longer exists.
//! Everything is simulated unless the run is forced.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use treesync::{Config, ExecutionMode, Orchestrator, StdoutSink, SyncOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = Orchestrator::new(Config::default(), Arc::new(StdoutSink));
//!     let options = SyncOptions::new("./photos", "/mnt/backup")
//!         .copy(true)
//!         .delete(true)
//!         .mode(ExecutionMode::Force);
//!     let report = orchestrator.run(&options).await?;
//!     println!("{:?}", report.copy);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod decrypt;
pub mod error;
pub mod identity;
pub mod logging;
pub mod mapper;
pub mod mode;
pub mod orchestrator;
pub mod policy;
pub mod sink;
pub mod types;
pub mod validation;
pub mod walker;

// Re-export commonly used types and functions
pub use config::Config;
pub use error::{SyncError, SyncResult};
pub use identity::{file_digest, BUF_SIZE};
pub use mapper::{map_copy, map_delete, Direction, Mapping, RootPair};
pub use mode::{ExecutionMode, Gate};
pub use orchestrator::{Orchestrator, RunReport, SyncOptions};
pub use policy::{should_copy, should_delete, SyncPolicy};
pub use sink::{ActionLine, ActionSink, MemorySink, StdoutSink, DRYRUN_PREFIX};
pub use walker::{TreeWalker, WalkSummary};

// vim: ts=4
