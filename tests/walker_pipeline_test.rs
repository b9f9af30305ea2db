//! Walker bound and decrypt pipeline tests against the public API
//!
//! - In-flight work never exceeds pool_size * backlog_factor
//! - Every mapped file is visited exactly once
//! - The decrypt pipeline mirrors a tree and unpacks archives in it

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use treesync::decrypt::{DecryptPipeline, GpgDecryptor};
use treesync::types::{Outcome, WorkItem};
use treesync::{Direction, RootPair, SyncResult, TreeWalker};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_in_flight_bound_holds_on_large_tree() {
	let tmp = TempDir::new().unwrap();
	let src = tmp.path().join("src");
	for d in 0..5 {
		for f in 0..20 {
			let dir = src.join(format!("d{}", d));
			fs::create_dir_all(&dir).unwrap();
			fs::write(dir.join(format!("f{}", f)), format!("{}-{}", d, f)).unwrap();
		}
	}

	let active = Arc::new(AtomicUsize::new(0));
	let max_active = Arc::new(AtomicUsize::new(0));
	let visited = Arc::new(Mutex::new(Vec::<PathBuf>::new()));
	let (a, m, v) = (active.clone(), max_active.clone(), visited.clone());
	let action = Arc::new(move |item: &WorkItem| -> SyncResult<Outcome> {
		let now = a.fetch_add(1, Ordering::SeqCst) + 1;
		m.fetch_max(now, Ordering::SeqCst);
		std::thread::sleep(Duration::from_millis(2));
		v.lock().unwrap().push(item.file.path.clone());
		a.fetch_sub(1, Ordering::SeqCst);
		Ok(Outcome::Unchanged)
	});

	let walker = TreeWalker::new(2).backlog_factor(3);
	let pair = RootPair::new(&src, tmp.path().join("dst"));
	let summary = walker.traverse(&pair, Direction::Copy, action).await.unwrap();

	assert_eq!(summary.files_seen, 100);
	assert_eq!(summary.unchanged, 100);
	assert!(summary.peak_in_flight <= walker.in_flight_bound());
	assert!(max_active.load(Ordering::SeqCst) <= walker.pool_size());

	let visited = visited.lock().unwrap();
	let unique: HashSet<&PathBuf> = visited.iter().collect();
	assert_eq!(visited.len(), 100);
	assert_eq!(unique.len(), 100);
}

#[tokio::test]
async fn test_decrypt_pipeline_unpacks_tarball() {
	let tmp = TempDir::new().unwrap();
	let base = tmp.path().join("vault");
	fs::create_dir_all(base.join("2024")).unwrap();

	let encoder = GzEncoder::new(File::create(base.join("2024/photos.tgz")).unwrap(), Compression::fast());
	let mut builder = tar::Builder::new(encoder);
	let data = b"jpeg bytes";
	let mut header = tar::Header::new_gnu();
	header.set_size(data.len() as u64);
	header.set_mode(0o644);
	builder.append_data(&mut header, "album/pic.jpg", &data[..]).unwrap();
	builder.into_inner().unwrap().finish().unwrap().flush().unwrap();

	let output = tmp.path().join("decrypted");
	let pipeline = DecryptPipeline::new(GpgDecryptor::new("unused"), TreeWalker::new(2));
	let summary = pipeline.run(&base, &output).await.unwrap();

	assert_eq!(summary.copied, 1);
	assert_eq!(fs::read(output.join("vault/2024/album/pic.jpg")).unwrap(), data);
	assert!(!output.join("vault/2024/photos.tgz").exists());
	// Source tree is left as it was
	assert!(base.join("2024/photos.tgz").exists());
}
