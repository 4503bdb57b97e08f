// SPDX-License-Identifier: AGPL-3.0-or-later
//! Streaming filesystem walker
//!
//! A single producer walks the tree on Tokio's blocking pool and pushes one
//! [`EntryDescriptor`] per visited entry into a bounded channel. The
//! consumer pulls entries with [`Walker::next`] and finishes with
//! [`Walker::close`], which cancels the producer, waits for it, and returns
//! the traversal error, if any.
//!
//! ```text
//! walkdir (blocking pool) --publish--> mpsc(10) --next()--> consumer
//!          ^                                                   |
//!          +-------------- CancellationToken <---- close() ----+
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use fsrch_core::path::{name_string, rel_path_string};
use fsrch_core::{Column, EntryDescriptor, FsrchError, FsrchResult, Row, RowStream, FS_TABLE};
use futures::Stream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Capacity of the entry channel between producer and consumer
pub const CHANNEL_CAPACITY: usize = 10;

/// Outcome of publishing one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Do not descend into the entry that failed to publish
    SkipDir,
}

/// Pull-based walk over a directory tree
pub struct Walker {
    root: PathBuf,
    entries: mpsc::Receiver<EntryDescriptor>,
    cancel: CancellationToken,
    task: Option<JoinHandle<FsrchResult<()>>>,
    rows_read: u64,
    published: Arc<AtomicU64>,
}

impl Walker {
    /// Starts walking `root` in the background.
    ///
    /// Never fails; traversal errors are reported by [`Walker::close`].
    /// Must be called from within a Tokio runtime.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let published = Arc::new(AtomicU64::new(0));

        let traversal = Traversal {
            root: root.clone(),
            tx,
            cancel: cancel.clone(),
            published: Arc::clone(&published),
            handle: Handle::current(),
        };

        debug!(root = %root.display(), "starting walk");
        let task = tokio::task::spawn_blocking(move || traversal.run());

        Self {
            root,
            entries: rx,
            cancel,
            task: Some(task),
            rows_read: 0,
            published,
        }
    }

    /// Waits for the next entry. Returns `None` once the walk has ended,
    /// and keeps returning `None` after that.
    pub async fn next(&mut self) -> Option<EntryDescriptor> {
        let entry = self.entries.recv().await?;
        self.rows_read += 1;
        Some(entry)
    }

    /// Ordinal of the last entry handed to the consumer (1-based; 0 before
    /// the first).
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Number of entries the producer has pushed into the channel so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Cancels the walk, waits for the producer to exit, and returns the
    /// traversal error if one ended the walk. Cancellation alone is not an
    /// error. Calling `close` again returns `Ok(())`.
    pub async fn close(&mut self) -> FsrchResult<()> {
        self.cancel.cancel();
        let Some(task) = self.task.take() else {
            return Ok(());
        };

        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(FsrchError::Task(e.to_string())),
        };
        debug!(
            root = %self.root.display(),
            rows = self.rows_read,
            published = self.published(),
            "walker closed"
        );
        result
    }
}

impl Drop for Walker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for Walker {
    type Item = EntryDescriptor;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.entries.poll_recv(cx) {
            Poll::Ready(Some(entry)) => {
                this.rows_read += 1;
                Poll::Ready(Some(entry))
            }
            other => other,
        }
    }
}

#[async_trait]
impl RowStream for Walker {
    fn columns(&self) -> &'static [Column] {
        FS_TABLE.columns
    }

    async fn next_row(&mut self) -> Option<Row> {
        let entry = Walker::next(self).await?;
        Some(Row::new(self.rows_read, FS_TABLE.columns, Vec::from(entry.project())))
    }

    async fn close(&mut self) -> FsrchResult<()> {
        Walker::close(self).await
    }
}

/// Producer half, owned by the blocking task
struct Traversal {
    root: PathBuf,
    tx: mpsc::Sender<EntryDescriptor>,
    cancel: CancellationToken,
    published: Arc<AtomicU64>,
    handle: Handle,
}

impl Traversal {
    /// Pre-order, depth-first, children in file name order. Dropping `self`
    /// on return closes the channel.
    fn run(self) -> FsrchResult<()> {
        let mut entries = WalkDir::new(&self.root)
            .follow_root_links(false)
            .sort_by_file_name()
            .into_iter();

        loop {
            // Checked before walkdir reads the next entry or directory.
            if self.cancel.is_cancelled() {
                debug!(root = %self.root.display(), "walk cancelled");
                break;
            }

            let dent = match entries.next() {
                Some(Ok(dent)) => dent,
                Some(Err(err)) => return Err(self.fail(err)),
                None => break,
            };

            let descriptor = match self.describe(&dent) {
                Ok(descriptor) => descriptor,
                Err(err) => return Err(self.fail(err)),
            };

            if self.publish(descriptor) == Flow::SkipDir && dent.file_type().is_dir() {
                debug!(path = %dent.path().display(), "skipping subtree");
                entries.skip_current_dir();
            }
        }

        debug!(
            root = %self.root.display(),
            published = self.published.load(Ordering::Relaxed),
            "walk finished"
        );
        Ok(())
    }

    fn describe(&self, dent: &walkdir::DirEntry) -> Result<EntryDescriptor, walkdir::Error> {
        let metadata = dent.metadata()?;
        let relative = dent.path().strip_prefix(&self.root).unwrap_or(dent.path());
        Ok(EntryDescriptor::from_metadata(
            name_string(dent.file_name()),
            rel_path_string(relative),
            &metadata,
        ))
    }

    /// Blocks until the consumer has room or the walk is cancelled,
    /// whichever comes first.
    fn publish(&self, entry: EntryDescriptor) -> Flow {
        self.handle.block_on(async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Flow::SkipDir,
                sent = self.tx.send(entry) => match sent {
                    Ok(()) => {
                        self.published.fetch_add(1, Ordering::Relaxed);
                        Flow::Continue
                    }
                    // Receiver dropped; the walker cancels before that happens.
                    Err(_) => Flow::SkipDir,
                },
            }
        })
    }

    fn fail(&self, err: walkdir::Error) -> FsrchError {
        let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
        let message = err.to_string();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message));
        warn!(root = %self.root.display(), path = %path.display(), error = %source, "walk failed");
        FsrchError::Traversal { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsrch_core::{EntryKind, Value};
    use futures::StreamExt;
    use std::collections::HashSet;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("f.txt"), b"f").unwrap();
        fs::write(root.join("a.txt"), b"hello").unwrap();
        fs::create_dir_all(root.join("b/d")).unwrap();
        fs::write(root.join("b/c.txt"), b"c").unwrap();
        fs::write(root.join("b/d/e.txt"), b"e").unwrap();
        temp
    }

    fn wide_tree(files: usize) -> TempDir {
        let temp = TempDir::new().unwrap();
        for i in 0..files {
            fs::write(temp.path().join(format!("file-{i:04}.txt")), b"x").unwrap();
        }
        temp
    }

    async fn drain(walker: &mut Walker) -> Vec<EntryDescriptor> {
        let mut out = Vec::new();
        while let Some(entry) = walker.next().await {
            out.push(entry);
        }
        out
    }

    fn rel_paths(entries: &[EntryDescriptor]) -> Vec<&str> {
        entries.iter().map(|e| e.rel_path()).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_full_walk_yields_every_entry_in_preorder() {
        let temp = sample_tree();
        let mut walker = Walker::open(temp.path());

        let entries = drain(&mut walker).await;
        assert_eq!(
            rel_paths(&entries),
            vec![".", "a.txt", "b", "b/c.txt", "b/d", "b/d/e.txt", "f.txt"]
        );

        let unique: HashSet<_> = entries.iter().map(|e| e.rel_path()).collect();
        assert_eq!(unique.len(), entries.len());

        for entry in &entries {
            assert!(entry.rel_path() == "." || entry.rel_path().ends_with(entry.name()));
        }

        assert!(walker.next().await.is_none());
        assert!(walker.next().await.is_none());
        assert_eq!(walker.rows_read(), 7);
        walker.close().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_entry_fields() {
        let temp = sample_tree();
        let mut walker = Walker::open(temp.path());
        let entries = drain(&mut walker).await;
        walker.close().await.unwrap();

        let root = &entries[0];
        assert!(root.is_dir());
        assert_eq!(root.size(), 0);
        assert_eq!(
            root.name(),
            temp.path().file_name().unwrap().to_string_lossy()
        );

        let a = entries.iter().find(|e| e.rel_path() == "a.txt").unwrap();
        assert_eq!(a.name(), "a.txt");
        assert_eq!(a.size(), 5);
        assert_eq!(a.kind(), EntryKind::File);
        assert!(a.is_file());

        let b = entries.iter().find(|e| e.rel_path() == "b").unwrap();
        assert!(b.is_dir());
        assert_eq!(b.size(), 0);
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_symlinks_are_not_followed() {
        let temp = sample_tree();
        std::os::unix::fs::symlink(temp.path().join("b"), temp.path().join("link")).unwrap();

        let mut walker = Walker::open(temp.path());
        let entries = drain(&mut walker).await;
        walker.close().await.unwrap();

        assert!(!rel_paths(&entries).iter().any(|p| p.starts_with("link/")));
        let link = entries.iter().find(|e| e.rel_path() == "link").unwrap();
        assert_eq!(link.kind(), EntryKind::Symlink);
        assert!(!link.is_dir());
        assert!(link.is_file());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_walk_order_is_stable() {
        let temp = sample_tree();

        let mut first = Walker::open(temp.path());
        let a = drain(&mut first).await;
        first.close().await.unwrap();

        let mut second = Walker::open(temp.path());
        let b = drain(&mut second).await;
        second.close().await.unwrap();

        assert_eq!(a, b);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_close_before_exhaustion_cancels() {
        let temp = wide_tree(200);
        let mut walker = Walker::open(temp.path());

        assert!(walker.next().await.is_some());
        let closed = tokio::time::timeout(Duration::from_secs(5), walker.close()).await;
        assert!(closed.expect("close should not hang").is_ok());
        assert!(walker.published() <= CHANNEL_CAPACITY as u64 + 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_close_twice_is_ok() {
        let temp = sample_tree();
        let mut walker = Walker::open(temp.path());
        walker.close().await.unwrap();
        walker.close().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_missing_root_reports_error_on_close() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        let mut walker = Walker::open(&missing);

        assert!(walker.next().await.is_none());
        assert_eq!(walker.rows_read(), 0);

        let err = walker.close().await.unwrap_err();
        assert!(err.is_traversal());
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unreadable_directory_halts_walk() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::create_dir(root.join("locked")).unwrap();
        fs::write(root.join("locked/x.txt"), b"x").unwrap();
        fs::write(root.join("z.txt"), b"z").unwrap();

        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Permission bits are not enforced (running as root).
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut walker = Walker::open(root);
        let entries = drain(&mut walker).await;
        let result = walker.close().await;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(rel_paths(&entries), vec![".", "a.txt", "locked"]);
        let err = result.unwrap_err();
        match &err {
            FsrchError::Traversal { path, .. } => assert!(path.ends_with("locked")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_directory_removed_mid_walk_halts_walk() {
        let temp = wide_tree(20);
        let root = temp.path();
        fs::create_dir(root.join("zzz")).unwrap();
        fs::write(root.join("zzz/inner.txt"), b"i").unwrap();

        // Once the channel is full the root listing has been read, but
        // `zzz` has not been visited yet.
        let mut walker = Walker::open(root);
        tokio::time::timeout(Duration::from_secs(5), async {
            while walker.published() < CHANNEL_CAPACITY as u64 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        fs::remove_dir_all(root.join("zzz")).unwrap();

        let entries = drain(&mut walker).await;
        let result = walker.close().await;

        assert_eq!(entries.len(), 21);
        assert_eq!(entries[0].rel_path(), ".");
        assert_eq!(entries.last().map(|e| e.rel_path()), Some("file-0019.txt"));

        let err = result.unwrap_err();
        assert!(err.is_traversal());
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
        match &err {
            FsrchError::Traversal { path, .. } => assert!(path.ends_with("zzz")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_non_utf8_names_stay_distinct() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(OsStr::from_bytes(b"x\xfe")), b"1").unwrap();
        fs::write(temp.path().join(OsStr::from_bytes(b"x\xff")), b"2").unwrap();

        let mut walker = Walker::open(temp.path());
        let entries = drain(&mut walker).await;
        walker.close().await.unwrap();

        assert_eq!(rel_paths(&entries), vec![".", "x\\xfe", "x\\xff"]);
        assert_eq!(entries[2].name(), "x\\xff");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_consumer_applies_backpressure() {
        let temp = wide_tree(50);
        let mut walker = Walker::open(temp.path());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(walker.published() <= CHANNEL_CAPACITY as u64);

        let mut seen = Vec::new();
        while let Some(entry) = walker.next().await {
            assert!(walker.published().saturating_sub(walker.rows_read()) <= CHANNEL_CAPACITY as u64 + 1);
            seen.push(entry.rel_path().to_string());
            if seen.len() % 5 == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
        walker.close().await.unwrap();

        assert_eq!(seen.len(), 51);
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), 51);
        let mut sorted = seen[1..].to_vec();
        sorted.sort();
        assert_eq!(sorted, seen[1..].to_vec());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_row_stream_projection_and_ids() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub/a.txt"), vec![b'x'; 1536]).unwrap();

        let mut stream: Box<dyn RowStream> = Box::new(Walker::open(temp.path()));
        assert_eq!(stream.columns().len(), 5);

        let mut rows = Vec::new();
        while let Some(row) = stream.next_row().await {
            rows.push(row);
        }
        stream.close().await.unwrap();

        let ids: Vec<u64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let file = rows.iter().find(|r| r.get("relPath") == Some(&Value::from("sub/a.txt"))).unwrap();
        assert_eq!(
            file.values,
            vec![
                Value::from("a.txt"),
                Value::from("sub/a.txt"),
                Value::Int(1536),
                Value::Bool(false),
                Value::Bool(true),
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stream_impl() {
        let temp = sample_tree();
        let mut walker = Walker::open(temp.path());
        let names: Vec<String> = walker
            .by_ref()
            .map(|e| e.rel_path().to_string())
            .collect()
            .await;
        assert_eq!(names.len(), 7);
        assert_eq!(walker.rows_read(), 7);
        walker.close().await.unwrap();
    }
}
