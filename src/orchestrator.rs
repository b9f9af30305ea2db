//! Run orchestration: resolve and validate the roots, then run the copy
//! traversal and the delete traversal in that order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::SyncResult;
use crate::logging::*;
use crate::mapper::{Direction, RootPair};
use crate::mode::{ExecutionMode, Gate};
use crate::policy::SyncPolicy;
use crate::sink::ActionSink;
use crate::types::WorkItem;
use crate::validation::{resolve_path, validate_destination_root, validate_source_root, Validator};
use crate::walker::{TreeWalker, WalkSummary};

/// What one invocation should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
	pub start: PathBuf,
	pub target: PathBuf,
	pub copy: bool,
	pub delete: bool,
	pub mode: ExecutionMode,
}

impl SyncOptions {
	/// Dry-run options with neither traversal enabled
	pub fn new(start: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
		SyncOptions {
			start: start.into(),
			target: target.into(),
			copy: false,
			delete: false,
			mode: ExecutionMode::DryRun,
		}
	}

	pub fn copy(mut self, enabled: bool) -> Self {
		self.copy = enabled;
		self
	}

	pub fn delete(mut self, enabled: bool) -> Self {
		self.delete = enabled;
		self
	}

	pub fn mode(mut self, mode: ExecutionMode) -> Self {
		self.mode = mode;
		self
	}
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
	pub pair: RootPair,
	pub copy: Option<WalkSummary>,
	pub delete: Option<WalkSummary>,
}

/// Resolve both roots to absolute paths and validate them
pub fn resolve_roots(start: &Path, target: &Path) -> SyncResult<RootPair> {
	let start = resolve_path(start)?;
	validate_source_root(&start)?;
	let target = resolve_path(target)?;
	validate_destination_root(&target, &start)?;
	Ok(RootPair::new(start, target))
}

/// Runs sync invocations against one configuration and one action sink
pub struct Orchestrator {
	config: Config,
	sink: Arc<dyn ActionSink>,
}

impl Orchestrator {
	pub fn new(config: Config, sink: Arc<dyn ActionSink>) -> Self {
		Orchestrator { config, sink }
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Validate everything, then copy and/or delete.
	///
	/// Validation failures return before any traversal starts. A failed
	/// copy traversal is returned without starting the delete traversal.
	pub async fn run(&self, options: &SyncOptions) -> SyncResult<RunReport> {
		self.config.validate()?;
		let pair = resolve_roots(&options.start, &options.target)?;

		let gate = Gate::new(options.mode, self.sink.clone());
		gate.note(format!("{} -> {}", pair.source().display(), pair.destination().display()));

		let policy = Arc::new(SyncPolicy::new(gate.clone()).with_buffer_size(self.config.buffer_size));
		let walker = TreeWalker::from_config(&self.config);
		let mut report = RunReport { pair: pair.clone(), copy: None, delete: None };

		if !options.copy && !options.delete {
			info!("Nothing to do: pass --copy and/or --delete");
		}

		if options.copy {
			gate.note("Copying...");
			let policy = policy.clone();
			let action = Arc::new(move |item: &WorkItem| policy.apply(Direction::Copy, item));
			report.copy = Some(walker.traverse(&pair, Direction::Copy, action).await?);
		}

		if options.delete {
			gate.note("Deleting non-existing files...");
			let policy = policy.clone();
			let action = Arc::new(move |item: &WorkItem| policy.apply(Direction::Delete, item));
			report.delete = Some(walker.traverse(&pair, Direction::Delete, action).await?);
		}

		Ok(report)
	}
}


// vim: ts=4
