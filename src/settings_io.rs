//! Durable storage for the theme settings file.
//!
//! Directory detection lives here, together with the `SettingsStorage`
//! abstraction the store reads and writes through. Only the top-level
//! binary should call `DirectoryContext::from_system`; everything else
//! receives paths by construction.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Directory paths for application state.
#[derive(Debug, Clone)]
pub struct DirectoryContext {
    /// Private data directory for durable state
    /// e.g., ~/.local/share/<app> on Linux, ~/Library/Application Support/<app> on macOS
    pub data_dir: PathBuf,
}

impl DirectoryContext {
    /// File name of the persisted theme preference.
    pub const SETTINGS_FILENAME: &'static str = "theme-settings.json";

    /// Create a DirectoryContext from the system directories.
    /// This should ONLY be called from main()
    pub fn from_system(app_name: &str) -> io::Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "Could not determine data directory",
                )
            })?
            .join(app_name);

        Ok(Self { data_dir })
    }

    /// Use an explicit data directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Create a DirectoryContext for testing with a temp directory
    pub fn for_testing(temp_dir: &Path) -> Self {
        Self {
            data_dir: temp_dir.join("data"),
        }
    }

    /// Get the theme settings file path
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(Self::SETTINGS_FILENAME)
    }

    /// Local file storage rooted at `settings_path()`
    pub fn settings_storage(&self) -> LocalSettingsStorage {
        LocalSettingsStorage::new(self.settings_path())
    }
}

/// Async single-record storage backend.
///
/// The store holds exactly one serialized record; `write` replaces it
/// entirely.
#[async_trait]
pub trait SettingsStorage: Send + Sync {
    /// Read the stored record.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    async fn read(&self) -> io::Result<Option<String>>;

    /// Replace the stored record.
    async fn write(&self, contents: &str) -> io::Result<()>;

    /// Filesystem location, if the backend has one.
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Type alias for shared settings storage.
pub type SharedSettingsStorage = Arc<dyn SettingsStorage>;

/// Settings file on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalSettingsStorage {
    path: PathBuf,
}

impl LocalSettingsStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl SettingsStorage for LocalSettingsStorage {
    async fn read(&self) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write to a sibling temp file, then rename over the target so a
        // crash mid-write never leaves a truncated record behind
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, contents).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        Ok(())
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// In-memory storage for tests and hosts without a filesystem.
///
/// Clones share the same record, so a test can keep one handle to inspect
/// what the store wrote and hand another to a second store to simulate a
/// restart.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStorage {
    inner: Arc<Mutex<MemoryRecord>>,
}

#[derive(Debug, Default)]
struct MemoryRecord {
    contents: Option<String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

impl MemorySettingsStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing record.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.lock().contents = Some(contents.into());
        storage
    }

    /// Make every subsequent read fail with an I/O error.
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make every subsequent write fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Current record.
    pub fn contents(&self) -> Option<String> {
        self.lock().contents.clone()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryRecord> {
        // A poisoned lock only means a test panicked mid-update; the record is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SettingsStorage for MemorySettingsStorage {
    async fn read(&self) -> io::Result<Option<String>> {
        let record = self.lock();
        if record.fail_reads {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "simulated read failure",
            ));
        }
        Ok(record.contents.clone())
    }

    async fn write(&self, contents: &str) -> io::Result<()> {
        let mut record = self.lock();
        if record.fail_writes {
            return Err(io::Error::other("simulated write failure"));
        }
        record.contents = Some(contents.to_string());
        record.writes += 1;
        Ok(())
    }
}
