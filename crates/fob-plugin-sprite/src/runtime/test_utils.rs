//! Runtime test doubles.
//!
//! - `MemoryRuntime`: in-memory filesystem for unit tests
//! - `CountingRuntime`: wraps another runtime and records every write, used to
//!   check that unchanged artifacts are never rewritten

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Runtime, RuntimeError, RuntimeResult};

/// In-memory runtime. Directories are implicit.
#[derive(Debug, Default, Clone)]
pub struct MemoryRuntime {
    files: Arc<Mutex<FxHashMap<PathBuf, Vec<u8>>>>,
    writes: Arc<Mutex<Vec<PathBuf>>>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file without counting it as a write.
    pub fn seed(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.files.lock().insert(path.into(), content.into());
    }

    /// Current content of a file, if present.
    pub fn content(&self, path: &Path) -> Option<String> {
        self.files
            .lock()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Number of writes issued against `path`.
    pub fn write_count(&self, path: &Path) -> usize {
        self.writes.lock().iter().filter(|p| p.as_path() == path).count()
    }
}

#[async_trait]
impl Runtime for MemoryRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| RuntimeError::FileNotFound(path.to_path_buf()))
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        self.writes.lock().push(path.to_path_buf());
        self.files.lock().insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock();
        files.contains_key(path) || files.keys().any(|p| p.starts_with(path))
    }

    async fn create_dir_all(&self, _path: &Path) -> RuntimeResult<()> {
        Ok(())
    }
}

/// Runtime wrapper that records the path of every write.
#[derive(Debug, Clone)]
pub struct CountingRuntime<R> {
    inner: R,
    writes: Arc<Mutex<Vec<PathBuf>>>,
}

impl<R: Runtime> CountingRuntime<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of writes issued against `path`.
    pub fn write_count(&self, path: &Path) -> usize {
        self.writes.lock().iter().filter(|p| p.as_path() == path).count()
    }
}

#[async_trait]
impl<R: Runtime> Runtime for CountingRuntime<R> {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.inner.read_file(path).await
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        self.writes.lock().push(path.to_path_buf());
        self.inner.write_file(path, content).await
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    async fn create_dir_all(&self, path: &Path) -> RuntimeResult<()> {
        self.inner.create_dir_all(path).await
    }
}
