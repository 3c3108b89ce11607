//! Shared test utilities: logging setup and an in-memory document source.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    config::WikiConfig, error::WikiGraphError, event::GraphEvent, paths::relative_page_path,
    source::DocumentSource,
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Everything currently queued on a graph event receiver.
pub fn drain(rx: &mut UnboundedReceiver<GraphEvent>) -> Vec<GraphEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Documents held in memory, keyed by path relative to a fixed root. Reads of paths marked with
/// [`MemorySource::fail_reads`] fail with an I/O error.
#[derive(Debug)]
pub struct MemorySource {
    root: PathBuf,
    files: Mutex<BTreeMap<String, String>>,
    failing: Mutex<BTreeSet<String>>,
}

impl MemorySource {
    pub fn with_files(files: &[(&str, &str)]) -> Arc<MemorySource> {
        Arc::new(MemorySource {
            root: PathBuf::from("/wiki"),
            files: Mutex::new(
                files
                    .iter()
                    .map(|(path, text)| (path.to_string(), text.to_string()))
                    .collect(),
            ),
            failing: Mutex::new(BTreeSet::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn locator(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Add or overwrite a document, returning its locator.
    pub fn put(&self, path: &str, text: &str) -> PathBuf {
        self.files.lock().insert(path.to_string(), text.to_string());
        self.locator(path)
    }

    pub fn remove(&self, path: &str) {
        self.files.lock().remove(path);
    }

    pub fn contents(&self, path: &str) -> Option<String> {
        self.files.lock().get(path).cloned()
    }

    pub fn fail_reads(&self, path: &str) {
        self.failing.lock().insert(path.to_string());
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn enumerate(
        &self,
        _root: &Path,
        config: &WikiConfig,
    ) -> Result<Vec<PathBuf>, WikiGraphError> {
        Ok(self
            .files
            .lock()
            .keys()
            .filter(|path| config.is_document(path))
            .take(config.max_files)
            .map(|path| self.locator(path))
            .collect())
    }

    async fn read(&self, locator: &Path) -> Result<String, WikiGraphError> {
        let path = relative_page_path(&self.root, locator)?;
        if self.failing.lock().contains(&path) {
            return Err(WikiGraphError::Io(format!("injected read failure for {path}")));
        }
        self.files
            .lock()
            .get(&path)
            .cloned()
            .ok_or_else(|| WikiGraphError::NotFound(path))
    }

    async fn exists(&self, locator: &Path) -> Result<bool, WikiGraphError> {
        let path = relative_page_path(&self.root, locator)?;
        Ok(self.files.lock().contains_key(&path))
    }

    async fn write(&self, locator: &Path, text: String) -> Result<(), WikiGraphError> {
        let path = relative_page_path(&self.root, locator)?;
        self.files.lock().insert(path, text);
        Ok(())
    }
}
