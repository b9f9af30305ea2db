//! Bounded parallel tree walker
//!
//! One blocking thread enumerates the tree and streams candidates to the
//! controlling task. The controller maps each candidate into the other tree
//! and dispatches it to the worker pool, holding at most
//! `pool_size * backlog_factor` unresolved items at any moment: a permit is
//! taken before dispatch and given back when the item finishes.
//!
//! Items run to completion; a failure does not cancel its siblings. After
//! the drain the first failure observed is returned, with the failure count.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::logging::*;
use crate::mapper::{Direction, Mapping, RootPair};
use crate::types::{FileCandidate, Outcome, WorkItem};

/// In-flight items allowed per worker
pub const DEFAULT_BACKLOG_FACTOR: usize = 3;

/// Pool size used when available parallelism cannot be detected
pub const FALLBACK_POOL_SIZE: usize = 2;

/// Number of processing units, or [`FALLBACK_POOL_SIZE`]
pub fn default_pool_size() -> usize {
	std::thread::available_parallelism().map(|n| n.get()).unwrap_or(FALLBACK_POOL_SIZE)
}

/// Per-file action run on a pool worker; may block on I/O
pub trait WorkAction: Send + Sync + 'static {
	fn run(&self, item: &WorkItem) -> SyncResult<Outcome>;
}

impl<F> WorkAction for F
where
	F: Fn(&WorkItem) -> SyncResult<Outcome> + Send + Sync + 'static,
{
	fn run(&self, item: &WorkItem) -> SyncResult<Outcome> {
		self(item)
	}
}

/// Counts for one finished traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkSummary {
	pub direction: Direction,
	/// Regular files enumerated
	pub files_seen: usize,
	pub copied: usize,
	pub deleted: usize,
	pub unchanged: usize,
	/// Files whose mapping was not applicable
	pub skipped: usize,
	/// Highest number of unresolved work items observed
	pub peak_in_flight: usize,
}

impl WalkSummary {
	fn new(direction: Direction) -> Self {
		WalkSummary {
			direction,
			files_seen: 0,
			copied: 0,
			deleted: 0,
			unchanged: 0,
			skipped: 0,
			peak_in_flight: 0,
		}
	}
}

/// Outcome bookkeeping for a traversal in progress
struct Tally {
	summary: WalkSummary,
	failures: usize,
	first: Option<SyncError>,
}

impl Tally {
	fn new(direction: Direction) -> Self {
		Tally { summary: WalkSummary::new(direction), failures: 0, first: None }
	}

	fn fail(&mut self, err: SyncError) {
		warn!("{}", err);
		self.failures += 1;
		if self.first.is_none() {
			self.first = Some(err);
		}
	}

	fn record(&mut self, done: Result<SyncResult<Outcome>, tokio::task::JoinError>) {
		match done {
			Ok(Ok(Outcome::Copied)) => self.summary.copied += 1,
			Ok(Ok(Outcome::Deleted)) => self.summary.deleted += 1,
			Ok(Ok(Outcome::Unchanged)) => self.summary.unchanged += 1,
			Ok(Err(e)) => self.fail(e),
			Err(e) => self.fail(e.into()),
		}
	}

	fn finish(mut self, peak: usize) -> SyncResult<WalkSummary> {
		self.summary.peak_in_flight = peak;
		match self.first {
			Some(first) => Err(SyncError::Traversal { failures: self.failures, first: Box::new(first) }),
			None => Ok(self.summary),
		}
	}
}

/// Live count of unresolved items, with its high-water mark
#[derive(Debug, Default)]
struct Gauge {
	current: AtomicUsize,
	peak: AtomicUsize,
}

/// A dispatched item's hold on the backlog; released on drop
struct Slot {
	gauge: Arc<Gauge>,
	_permit: OwnedSemaphorePermit,
}

impl Slot {
	fn enter(gauge: Arc<Gauge>, permit: OwnedSemaphorePermit) -> Self {
		let now = gauge.current.fetch_add(1, Ordering::SeqCst) + 1;
		gauge.peak.fetch_max(now, Ordering::SeqCst);
		Slot { gauge, _permit: permit }
	}
}

impl Drop for Slot {
	fn drop(&mut self) {
		// Runs before the permit field is dropped, so the count never exceeds the permits
		self.gauge.current.fetch_sub(1, Ordering::SeqCst);
	}
}

/// Walks one root of a [`RootPair`] and runs an action per mapped file
#[derive(Debug, Clone)]
pub struct TreeWalker {
	pool_size: usize,
	backlog_factor: usize,
	follow_symlinks: bool,
	skip_hidden: bool,
}

impl Default for TreeWalker {
	fn default() -> Self {
		TreeWalker::new(default_pool_size())
	}
}

impl TreeWalker {
	pub fn new(pool_size: usize) -> Self {
		TreeWalker {
			pool_size: pool_size.max(1),
			backlog_factor: DEFAULT_BACKLOG_FACTOR,
			follow_symlinks: false,
			skip_hidden: false,
		}
	}

	pub fn from_config(config: &Config) -> Self {
		TreeWalker::new(config.pool_size())
			.backlog_factor(config.backlog_factor)
			.follow_symlinks(config.follow_symlinks)
	}

	pub fn backlog_factor(mut self, factor: usize) -> Self {
		self.backlog_factor = factor.max(1);
		self
	}

	pub fn follow_symlinks(mut self, follow: bool) -> Self {
		self.follow_symlinks = follow;
		self
	}

	/// Skip files and directories whose name starts with `.`
	pub fn skip_hidden(mut self, skip: bool) -> Self {
		self.skip_hidden = skip;
		self
	}

	pub fn pool_size(&self) -> usize {
		self.pool_size
	}

	/// Maximum number of unresolved work items
	pub fn in_flight_bound(&self) -> usize {
		self.pool_size * self.backlog_factor
	}

	/// Walk `pair.walk_root(direction)` and run `action` for every file that
	/// maps into the other tree. Unmapped files are skipped.
	pub async fn traverse<A: WorkAction>(
		&self,
		pair: &RootPair,
		direction: Direction,
		action: Arc<A>,
	) -> SyncResult<WalkSummary> {
		let walk_root = pair.walk_root(direction).to_path_buf();
		let mut tally = Tally::new(direction);

		if !walk_root.exists() {
			debug!("{} traversal: {} does not exist, nothing to do", direction, walk_root.display());
			return tally.finish(0);
		}

		debug!(
			"{} traversal of {}: {} workers, at most {} in flight",
			direction,
			walk_root.display(),
			self.pool_size,
			self.in_flight_bound()
		);

		let (tx, mut rx) = mpsc::channel::<SyncResult<FileCandidate>>(self.pool_size);
		let filter = EntryFilter {
			follow_symlinks: self.follow_symlinks,
			skip_hidden: self.skip_hidden,
			// A dangling link in the destination is still something to delete
			keep_dangling: direction == Direction::Delete,
		};
		let enumerator = tokio::task::spawn_blocking(move || enumerate(&walk_root, filter, &tx));

		let backlog = Arc::new(Semaphore::new(self.in_flight_bound()));
		let workers = Arc::new(Semaphore::new(self.pool_size));
		let gauge = Arc::new(Gauge::default());
		let mut tasks: JoinSet<SyncResult<Outcome>> = JoinSet::new();

		while let Some(found) = rx.recv().await {
			let file = match found {
				Ok(file) => file,
				Err(e) => {
					tally.fail(e);
					continue;
				}
			};
			tally.summary.files_seen += 1;

			let counterpart = match pair.counterpart(direction, &file.path) {
				Mapping::Mapped(path) => path,
				Mapping::NotApplicable => {
					debug!("skipping {}: outside the managed subtree", file.path.display());
					tally.summary.skipped += 1;
					continue;
				}
			};

			let permit = backlog
				.clone()
				.acquire_owned()
				.await
				.map_err(|e| SyncError::Task { message: e.to_string() })?;
			let slot = Slot::enter(gauge.clone(), permit);
			let item = WorkItem { file, counterpart };
			let action = action.clone();
			let workers = workers.clone();

			tasks.spawn(async move {
				let _slot = slot;
				let _worker = workers
					.acquire_owned()
					.await
					.map_err(|e| SyncError::Task { message: e.to_string() })?;
				match tokio::task::spawn_blocking(move || action.run(&item)).await {
					Ok(result) => result,
					Err(e) => Err(e.into()),
				}
			});

			while let Some(done) = tasks.try_join_next() {
				tally.record(done);
			}
		}

		if let Err(e) = enumerator.await {
			tally.fail(e.into());
		}
		while let Some(done) = tasks.join_next().await {
			tally.record(done);
		}

		let peak = gauge.peak.load(Ordering::SeqCst);
		let summary = tally.finish(peak)?;
		info!(
			"{} traversal done: {} files, {} copied, {} deleted, {} unchanged, {} skipped",
			direction,
			summary.files_seen,
			summary.copied,
			summary.deleted,
			summary.unchanged,
			summary.skipped
		);
		Ok(summary)
	}
}

fn is_hidden(entry: &DirEntry) -> bool {
	entry.file_name().to_str().map(|name| name.starts_with('.')).unwrap_or(false)
}

#[derive(Debug, Clone, Copy)]
struct EntryFilter {
	follow_symlinks: bool,
	skip_hidden: bool,
	keep_dangling: bool,
}

/// Blocking enumeration; stops early if the receiver goes away
fn enumerate(root: &Path, filter: EntryFilter, tx: &mpsc::Sender<SyncResult<FileCandidate>>) {
	let skip_hidden = filter.skip_hidden;
	let entries = WalkDir::new(root)
		.follow_links(filter.follow_symlinks)
		.into_iter()
		.filter_entry(|e| !(skip_hidden && e.depth() > 0 && is_hidden(e)));

	for entry in entries {
		let found = match entry {
			Ok(entry) => match candidate(root, &entry, filter.keep_dangling) {
				Ok(Some(file)) => Ok(file),
				Ok(None) => continue,
				Err(e) => Err(e),
			},
			Err(e) => Err(SyncError::from(e)),
		};
		if tx.blocking_send(found).is_err() {
			break;
		}
	}
}

/// Regular files (or symlinks to them) become candidates, and dangling
/// links when `keep_dangling` is set; everything else is passed over
fn candidate(root: &Path, entry: &DirEntry, keep_dangling: bool) -> SyncResult<Option<FileCandidate>> {
	if entry.file_type().is_dir() {
		return Ok(None);
	}
	let path = entry.path();
	let meta = match fs::metadata(path) {
		Ok(meta) => meta,
		Err(e) if e.kind() == io::ErrorKind::NotFound => {
			if keep_dangling && entry.path_is_symlink() {
				return Ok(Some(FileCandidate { path: path.to_path_buf(), size: 0, root: PathBuf::from(root) }));
			}
			debug!("skipping dangling link {}", path.display());
			return Ok(None);
		}
		Err(e) => return Err(SyncError::io(path, e)),
	};
	if !meta.is_file() {
		debug!("skipping non-regular file {}", path.display());
		return Ok(None);
	}
	Ok(Some(FileCandidate { path: path.to_path_buf(), size: meta.len(), root: PathBuf::from(root) }))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;
	use std::time::Duration;
	use tempfile::TempDir;

	fn make_tree(root: &Path, files: &[&str]) {
		for f in files {
			let path = root.join(f);
			fs::create_dir_all(path.parent().unwrap()).unwrap();
			fs::write(&path, f.as_bytes()).unwrap();
		}
	}

	#[test]
	fn test_in_flight_bound() {
		let walker = TreeWalker::new(4);
		assert_eq!(walker.in_flight_bound(), 12);
		assert_eq!(TreeWalker::new(0).pool_size(), 1);
		assert_eq!(TreeWalker::new(2).backlog_factor(5).in_flight_bound(), 10);
	}

	#[test]
	fn test_default_pool_size_is_positive() {
		assert!(default_pool_size() >= 1);
	}

	#[tokio::test]
	async fn test_traverse_visits_every_file_once() {
		let tmp = TempDir::new().unwrap();
		let src = tmp.path().join("foo");
		make_tree(&src, &["dir1/file1", "dir1/dir2/file2", "dir3/file3", "dir3/dir4/file4"]);
		let pair = RootPair::new(&src, tmp.path().join("bar"));

		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = seen.clone();
		let action = Arc::new(move |item: &WorkItem| -> SyncResult<Outcome> {
			sink.lock().unwrap().push((item.file.path.clone(), item.counterpart.clone()));
			Ok(Outcome::Copied)
		});

		let summary = TreeWalker::new(2).traverse(&pair, Direction::Copy, action).await.unwrap();
		assert_eq!(summary.files_seen, 4);
		assert_eq!(summary.copied, 4);

		let mut seen = seen.lock().unwrap().clone();
		seen.sort();
		assert_eq!(seen.len(), 4);
		assert_eq!(seen[0].0, src.join("dir1/dir2/file2"));
		assert_eq!(seen[0].1, tmp.path().join("bar/foo/dir1/dir2/file2"));
	}

	#[tokio::test]
	async fn test_traverse_skips_unmapped_files() {
		let tmp = TempDir::new().unwrap();
		let src = tmp.path().join("foo");
		let dest = tmp.path().join("bar");
		fs::create_dir_all(&src).unwrap();
		make_tree(&dest, &["dir5/file5", "foo/dir6/file6"]);
		let pair = RootPair::new(&src, &dest);

		let action = Arc::new(|item: &WorkItem| -> SyncResult<Outcome> {
			assert!(item.file.path.ends_with("foo/dir6/file6"));
			Ok(Outcome::Unchanged)
		});
		let summary = TreeWalker::new(2).traverse(&pair, Direction::Delete, action).await.unwrap();
		assert_eq!(summary.files_seen, 2);
		assert_eq!(summary.skipped, 1);
		assert_eq!(summary.unchanged, 1);
	}

	#[tokio::test]
	async fn test_traverse_missing_root_is_empty() {
		let tmp = TempDir::new().unwrap();
		let pair = RootPair::new(tmp.path().join("foo"), tmp.path().join("bar"));
		let action = Arc::new(|_: &WorkItem| -> SyncResult<Outcome> { Ok(Outcome::Deleted) });
		let summary = TreeWalker::new(2).traverse(&pair, Direction::Delete, action).await.unwrap();
		assert_eq!(summary.files_seen, 0);
	}

	#[tokio::test]
	async fn test_backpressure_bound_holds() {
		let tmp = TempDir::new().unwrap();
		let src = tmp.path().join("foo");
		let names: Vec<String> = (0..60).map(|i| format!("d{}/f{}", i % 5, i)).collect();
		let refs: Vec<&str> = names.iter().map(String::as_str).collect();
		make_tree(&src, &refs);
		let pair = RootPair::new(&src, tmp.path().join("bar"));

		let running = Arc::new(AtomicUsize::new(0));
		let max_running = Arc::new(AtomicUsize::new(0));
		let (r, m) = (running.clone(), max_running.clone());
		let action = Arc::new(move |_: &WorkItem| -> SyncResult<Outcome> {
			let now = r.fetch_add(1, Ordering::SeqCst) + 1;
			m.fetch_max(now, Ordering::SeqCst);
			std::thread::sleep(Duration::from_millis(5));
			r.fetch_sub(1, Ordering::SeqCst);
			Ok(Outcome::Copied)
		});

		let walker = TreeWalker::new(2);
		let summary = walker.traverse(&pair, Direction::Copy, action).await.unwrap();
		assert_eq!(summary.copied, 60);
		assert!(summary.peak_in_flight >= 1);
		assert!(summary.peak_in_flight <= walker.in_flight_bound());
		assert!(max_running.load(Ordering::SeqCst) <= walker.pool_size());
	}

	#[tokio::test]
	async fn test_failure_reported_after_full_drain() {
		let tmp = TempDir::new().unwrap();
		let src = tmp.path().join("foo");
		make_tree(&src, &["a", "b", "c", "d", "e", "f"]);
		let pair = RootPair::new(&src, tmp.path().join("bar"));

		let completed = Arc::new(AtomicUsize::new(0));
		let done = completed.clone();
		let action = Arc::new(move |item: &WorkItem| -> SyncResult<Outcome> {
			done.fetch_add(1, Ordering::SeqCst);
			if item.file.path.ends_with("c") || item.file.path.ends_with("e") {
				return Err(SyncError::io(
					&item.file.path,
					io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
				));
			}
			Ok(Outcome::Copied)
		});

		let err = TreeWalker::new(2).traverse(&pair, Direction::Copy, action).await.unwrap_err();
		assert_eq!(completed.load(Ordering::SeqCst), 6);
		match err {
			SyncError::Traversal { failures, first } => {
				assert_eq!(failures, 2);
				let path = first.path().unwrap().to_path_buf();
				assert!(path.ends_with("c") || path.ends_with("e"));
			}
			other => panic!("unexpected error: {}", other),
		}
	}

	#[tokio::test]
	async fn test_skip_hidden() {
		let tmp = TempDir::new().unwrap();
		let src = tmp.path().join("foo");
		make_tree(&src, &["visible", ".hidden", ".git/config", "sub/.dotfile", "sub/ok"]);
		let pair = RootPair::new(&src, tmp.path().join("bar"));

		let action = Arc::new(|_: &WorkItem| -> SyncResult<Outcome> { Ok(Outcome::Copied) });
		let summary = TreeWalker::new(2)
			.skip_hidden(true)
			.traverse(&pair, Direction::Copy, action)
			.await
			.unwrap();
		assert_eq!(summary.files_seen, 2);
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_dangling_links_and_dir_links_are_not_files() {
		let tmp = TempDir::new().unwrap();
		let src = tmp.path().join("foo");
		make_tree(&src, &["real"]);
		std::os::unix::fs::symlink(src.join("missing"), src.join("dangling")).unwrap();
		std::os::unix::fs::symlink(tmp.path(), src.join("dirlink")).unwrap();
		std::os::unix::fs::symlink(src.join("real"), src.join("filelink")).unwrap();
		let pair = RootPair::new(&src, tmp.path().join("bar"));

		let action = Arc::new(|_: &WorkItem| -> SyncResult<Outcome> { Ok(Outcome::Copied) });
		let summary = TreeWalker::new(2).traverse(&pair, Direction::Copy, action).await.unwrap();
		assert_eq!(summary.files_seen, 2);
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_dangling_link_enumerated_for_delete() {
		let tmp = TempDir::new().unwrap();
		let src = tmp.path().join("foo");
		let dest = tmp.path().join("bar");
		fs::create_dir_all(&src).unwrap();
		fs::create_dir_all(dest.join("foo")).unwrap();
		std::os::unix::fs::symlink(tmp.path().join("missing"), dest.join("foo/orphan_link")).unwrap();
		let pair = RootPair::new(&src, &dest);

		let action = Arc::new(|item: &WorkItem| -> SyncResult<Outcome> {
			assert!(item.file.path.ends_with("foo/orphan_link"));
			assert!(item.counterpart.ends_with("foo/orphan_link"));
			Ok(Outcome::Deleted)
		});
		let summary = TreeWalker::new(2).traverse(&pair, Direction::Delete, action).await.unwrap();
		assert_eq!(summary.files_seen, 1);
		assert_eq!(summary.deleted, 1);
	}
}

// vim: ts=4
