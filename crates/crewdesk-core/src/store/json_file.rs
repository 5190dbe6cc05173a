//! Whole-file JSON persistence for the keyed-record stores.
//!
//! Each store owns one pretty-printed JSON document that the external job
//! also reads. Every mutation is read-modify-write under a per-file lock and
//! lands on disk through a temp file + rename, so readers never observe a
//! half-written document. Blocking file I/O runs on `spawn_blocking`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ServerError;

/// Thread-safe handle to one JSON document on disk.
pub struct JsonFile<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    path: PathBuf,
    seed: fn() -> T,
    /// Write the seed value out the first time a missing file is read.
    persist_seed: bool,
    lock: Mutex<()>,
}

impl<T> Clone for JsonFile<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> std::fmt::Debug for JsonFile<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFile")
            .field("path", &self.inner.path)
            .finish()
    }
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// A missing file reads as `seed()` without touching disk.
    pub fn new(path: impl Into<PathBuf>, seed: fn() -> T) -> Self {
        Self::build(path.into(), seed, false)
    }

    /// A missing file is created from `seed()` on first read.
    pub fn seeded(path: impl Into<PathBuf>, seed: fn() -> T) -> Self {
        Self::build(path.into(), seed, true)
    }

    fn build(path: PathBuf, seed: fn() -> T, persist_seed: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                path,
                seed,
                persist_seed,
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn read_blocking(&self) -> Result<T, ServerError> {
        let _guard = self.lock()?;
        self.load()
    }

    /// Apply `f` to the current document and write the result back. Nothing
    /// is written when `f` fails.
    pub fn update_blocking<F, R>(&self, f: F) -> Result<R, ServerError>
    where
        F: FnOnce(&mut T) -> Result<R, ServerError>,
    {
        let _guard = self.lock()?;
        let mut value = self.load()?;
        let out = f(&mut value)?;
        write_atomic(&self.inner.path, &value)?;
        Ok(out)
    }

    pub async fn read(&self) -> Result<T, ServerError> {
        let file = self.clone();
        tokio::task::spawn_blocking(move || file.read_blocking())
            .await
            .map_err(|e| ServerError::Internal(format!("Task join error: {}", e)))?
    }

    pub async fn update<F, R>(&self, f: F) -> Result<R, ServerError>
    where
        F: FnOnce(&mut T) -> Result<R, ServerError> + Send + 'static,
        R: Send + 'static,
    {
        let file = self.clone();
        tokio::task::spawn_blocking(move || file.update_blocking(f))
            .await
            .map_err(|e| ServerError::Internal(format!("Task join error: {}", e)))?
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, ServerError> {
        self.inner
            .lock
            .lock()
            .map_err(|e| ServerError::Storage(format!("Lock poisoned: {}", e)))
    }

    fn load(&self) -> Result<T, ServerError> {
        let path = &self.inner.path;
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                ServerError::Storage(format!("Failed to parse {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let seed = (self.inner.seed)();
                if self.inner.persist_seed {
                    write_atomic(path, &seed)?;
                    tracing::info!("Initialized {} with defaults", path.display());
                }
                Ok(seed)
            }
            Err(e) => Err(ServerError::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ServerError> {
    let storage = |e: &dyn std::fmt::Display| {
        ServerError::Storage(format!("Failed to write {}: {}", path.display(), e))
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| storage(&e))?;

    let mut body = serde_json::to_string_pretty(value).map_err(|e| storage(&e))?;
    body.push('\n');

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| storage(&e))?;
    tmp.write_all(body.as_bytes()).map_err(|e| storage(&e))?;
    tmp.as_file().sync_all().map_err(|e| storage(&e))?;
    tmp.persist(path).map_err(|e| storage(&e.error))?;
    Ok(())
}
