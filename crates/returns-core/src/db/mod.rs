//! SQLite storage for return records.
//!
//! This module owns every handle to the on-disk store and everything that
//! touches the single `returns` table:
//!
//! - [`ConnectionManager`]: one connection per calling thread, reopened after
//!   a reload
//! - [`schema`]: column type inference and table (re)creation
//! - [`records`]: parameterized inserts and newest-first reads

use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
    thread::{self, ThreadId},
    time::Duration,
};

use log::{debug, warn};
use rusqlite::Connection;

use crate::error::{ReturnsError, Result};

pub mod records;
pub mod schema;

/// Default store location, relative to the process working directory.
pub const DEFAULT_DATABASE_PATH: &str = "ReturnsData.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

struct CachedConnection {
    connection: Connection,
    epoch: u64,
}

type HandleCache = Mutex<HashMap<ThreadId, CachedConnection>>;

fn lock_cache(cache: &HandleCache) -> MutexGuard<'_, HashMap<ThreadId, CachedConnection>> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-thread list of caches holding a handle for this thread.
///
/// Dropped when the thread exits, which closes the thread's handles in every
/// manager that is still alive.
struct HandleReleaser {
    thread: ThreadId,
    caches: Vec<Weak<HandleCache>>,
}

impl HandleReleaser {
    fn watch(&mut self, cache: Weak<HandleCache>) {
        self.caches.retain(|c| c.strong_count() > 0);
        if !self.caches.iter().any(|c| c.ptr_eq(&cache)) {
            self.caches.push(cache);
        }
    }
}

impl Drop for HandleReleaser {
    fn drop(&mut self) {
        for cache in self.caches.drain(..).filter_map(|c| c.upgrade()) {
            let released = lock_cache(&cache).remove(&self.thread);
            if let Some(cached) = released {
                ConnectionManager::close(cached);
            }
        }
    }
}

thread_local! {
    static RELEASER: RefCell<HandleReleaser> = RefCell::new(HandleReleaser {
        thread: thread::current().id(),
        caches: Vec::new(),
    });
}

/// Per-thread connection cache for a single store file.
///
/// Each execution context gets its own handle; handles are never shared
/// across threads and are closed when their thread exits. A reload bumps the
/// epoch so that every context reopens its handle on next use instead of
/// continuing with one opened before the table was replaced.
pub struct ConnectionManager {
    path: PathBuf,
    handles: Arc<HandleCache>,
    epoch: AtomicU64,
}

impl ConnectionManager {
    /// Creates a manager for the store at `path`. Nothing is opened yet.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            handles: Arc::new(Mutex::new(HashMap::new())),
            epoch: AtomicU64::new(0),
        }
    }

    /// Path of the backing store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `f` with the calling thread's connection, opening one if needed.
    ///
    /// The cache lock is released while `f` runs, so other threads are never
    /// blocked on this thread's statements. `f` must not call back into the
    /// same manager.
    ///
    /// # Errors
    ///
    /// Returns `ReturnsError::StoreUnavailable` if a new handle cannot be
    /// opened, otherwise whatever `f` returns.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let id = thread::current().id();
        let epoch = self.epoch.load(Ordering::Acquire);

        let cached = self.lock().remove(&id);
        let mut cached = match cached {
            Some(cached) if cached.epoch == epoch => cached,
            Some(stale) => {
                debug!(
                    "Reopening connection for {id:?}: opened at epoch {}, now {epoch}",
                    stale.epoch
                );
                drop(stale);
                self.open(epoch)?
            }
            None => self.open(epoch)?,
        };

        let result = f(&mut cached.connection);
        self.lock().insert(id, cached);
        result
    }

    /// Closes and forgets the calling thread's connection only.
    pub fn invalidate_current(&self) {
        let id = thread::current().id();
        if let Some(cached) = self.lock().remove(&id) {
            Self::close(cached);
            debug!("Invalidated connection for {id:?}");
        }
    }

    /// Marks every handle stale after a schema-altering write.
    ///
    /// Idle cached handles are closed right away. A handle in use by another
    /// thread is replaced on that thread's next call to
    /// [`with_connection`](Self::with_connection).
    pub fn advance_epoch(&self) -> u64 {
        let next = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        let stale: Vec<CachedConnection> = {
            let mut handles = self.lock();
            let ids: Vec<ThreadId> = handles
                .iter()
                .filter(|(_, cached)| cached.epoch < next)
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| handles.remove(id)).collect()
        };
        debug!(
            "Connection epoch advanced to {next}, closed {} stale handle(s)",
            stale.len()
        );
        for cached in stale {
            Self::close(cached);
        }
        next
    }

    /// Current reload epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Number of handles currently cached.
    pub fn open_handles(&self) -> usize {
        self.lock().len()
    }

    /// Best-effort close of every cached handle.
    pub fn close_all(&self) {
        let drained: Vec<CachedConnection> = self.lock().drain().map(|(_, c)| c).collect();
        let count = drained.len();
        for cached in drained {
            Self::close(cached);
        }
        debug!("Closed {count} cached connection(s)");
    }

    fn open(&self, epoch: u64) -> Result<CachedConnection> {
        let connection =
            Connection::open(&self.path).map_err(|source| ReturnsError::StoreUnavailable {
                path: self.path.clone(),
                source,
            })?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(|source| ReturnsError::StoreUnavailable {
                path: self.path.clone(),
                source,
            })?;
        debug!(
            "Opened connection to {} for {:?}",
            self.path.display(),
            thread::current().id()
        );
        let cache = Arc::downgrade(&self.handles);
        if RELEASER
            .try_with(|releaser| releaser.borrow_mut().watch(cache))
            .is_err()
        {
            warn!("Thread is exiting; its connection will be closed with the manager");
        }
        Ok(CachedConnection { connection, epoch })
    }

    fn close(cached: CachedConnection) {
        if let Err((_, e)) = cached.connection.close() {
            warn!("Failed to close connection cleanly: {e}");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ThreadId, CachedConnection>> {
        lock_cache(&self.handles)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.close_all();
    }
}

/// Double-quotes an identifier for use in generated SQL.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use std::sync::{mpsc, Arc};

    use tempfile::TempDir;

    use super::*;

    fn manager() -> (TempDir, ConnectionManager) {
        let dir = TempDir::new().expect("temp dir");
        let manager = ConnectionManager::new(dir.path().join("returns.db"));
        (dir, manager)
    }

    fn connection_epoch(manager: &ConnectionManager) -> u64 {
        let id = thread::current().id();
        manager.lock().get(&id).map(|c| c.epoch).expect("cached")
    }

    #[test]
    fn reuses_handle_within_a_thread() {
        let (_dir, manager) = manager();
        manager
            .with_connection(|conn| {
                conn.execute_batch("CREATE TABLE t (x INTEGER)")
                    .map_err(|e| ReturnsError::database("create").with_source(e))
            })
            .expect("create");
        manager
            .with_connection(|conn| {
                conn.execute("INSERT INTO t (x) VALUES (1)", [])
                    .map_err(|e| ReturnsError::database("insert").with_source(e))
            })
            .expect("insert");
        assert_eq!(manager.open_handles(), 1);
    }

    /// Runs `f` on a worker thread that stays alive until the returned
    /// sender is dropped or signalled.
    fn parked_worker(manager: &Arc<ConnectionManager>) -> (mpsc::Sender<()>, thread::JoinHandle<()>) {
        let worker = Arc::clone(manager);
        let (ready_tx, ready_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            worker.with_connection(|_| Ok(())).expect("worker");
            ready_tx.send(()).expect("ready");
            let _ = release_rx.recv();
        });
        ready_rx.recv().expect("worker ready");
        (release_tx, handle)
    }

    #[test]
    fn each_thread_gets_its_own_handle() {
        let (_dir, manager) = manager();
        let manager = Arc::new(manager);
        manager.with_connection(|_| Ok(())).expect("main thread");

        let (release, worker) = parked_worker(&manager);
        assert_eq!(manager.open_handles(), 2);

        drop(release);
        worker.join().expect("join");
    }

    #[test]
    fn handles_are_closed_when_their_thread_exits() {
        let (_dir, manager) = manager();
        let manager = Arc::new(manager);

        let workers: Vec<_> = (0..20)
            .map(|_| {
                let worker = Arc::clone(&manager);
                thread::spawn(move || worker.with_connection(|_| Ok(())).expect("worker"))
            })
            .collect();
        for worker in workers {
            worker.join().expect("join");
        }

        assert_eq!(manager.open_handles(), 0);
    }

    #[test]
    fn invalidate_current_leaves_other_threads_alone() {
        let (_dir, manager) = manager();
        let manager = Arc::new(manager);
        let (release, worker) = parked_worker(&manager);
        manager.with_connection(|_| Ok(())).expect("main thread");

        manager.invalidate_current();
        assert_eq!(manager.open_handles(), 1);

        drop(release);
        worker.join().expect("join");
    }

    #[test]
    fn advance_epoch_closes_idle_handles() {
        let (_dir, manager) = manager();
        let manager = Arc::new(manager);
        let (release, worker) = parked_worker(&manager);
        manager.with_connection(|_| Ok(())).expect("main thread");
        assert_eq!(manager.open_handles(), 2);

        manager.advance_epoch();
        assert_eq!(manager.open_handles(), 0);

        drop(release);
        worker.join().expect("join");
    }

    #[test]
    fn path_is_kept() {
        let (dir, manager) = manager();
        assert_eq!(manager.path(), dir.path().join("returns.db"));
    }

    #[test]
    fn stale_handles_are_reopened_after_epoch_advance() {
        let (_dir, manager) = manager();
        manager.with_connection(|_| Ok(())).expect("open");
        assert_eq!(connection_epoch(&manager), 0);

        assert_eq!(manager.advance_epoch(), 1);
        manager.with_connection(|_| Ok(())).expect("reopen");
        assert_eq!(connection_epoch(&manager), 1);
    }

    #[test]
    fn close_all_drains_cache() {
        let (_dir, manager) = manager();
        manager.with_connection(|_| Ok(())).expect("open");
        manager.close_all();
        assert_eq!(manager.open_handles(), 0);
    }

    #[test]
    fn unreachable_store_is_reported() {
        let manager = ConnectionManager::new("/nonexistent-dir/for/sure/returns.db");
        let err = manager.with_connection(|_| Ok(())).unwrap_err();
        assert!(matches!(err, ReturnsError::StoreUnavailable { .. }));
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_identifier("order_id"), "\"order_id\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
