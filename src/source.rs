//! Access to the documents backing a wiki.
//!
//! The synchronizer never touches the file system directly; it goes through a [`DocumentSource`]
//! so that tests (and embedders with their own storage) can substitute one.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::{config::WikiConfig, error::WikiGraphError, paths::relative_page_path};

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Locators of every document under `root` that `config` selects, in path order, at most
    /// `config.max_files` of them.
    async fn enumerate(
        &self,
        root: &Path,
        config: &WikiConfig,
    ) -> Result<Vec<PathBuf>, WikiGraphError>;

    async fn read(&self, locator: &Path) -> Result<String, WikiGraphError>;

    /// Whether a document is stored at `locator`, tracked or not.
    async fn exists(&self, locator: &Path) -> Result<bool, WikiGraphError>;

    async fn write(&self, locator: &Path, text: String) -> Result<(), WikiGraphError>;
}

/// The local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentSource;

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Documents selected by `config` below `dir`, keyed by their path relative to `root`, in path
/// order. Hidden directories are not descended into.
fn walk_documents(root: &Path, dir: &Path, config: &WikiConfig) -> Vec<(String, PathBuf)> {
    let mut documents = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| !is_hidden(e) || e.path() == dir)
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let locator = e.into_path();
            let relative = relative_page_path(root, &locator).ok()?;
            config
                .is_document(&relative)
                .then_some((relative, locator))
        })
        .collect::<Vec<(String, PathBuf)>>();
    documents.sort_by(|a, b| a.0.cmp(&b.0));
    documents
}

/// Walk `root` for documents selected by `config`, at most `config.max_files` of them.
pub fn iter_documents(root: &Path, config: &WikiConfig) -> Vec<PathBuf> {
    let mut documents = walk_documents(root, root, config);
    if documents.len() > config.max_files {
        tracing::warn!(
            "Found {} documents under {:?}; indexing only the first {}",
            documents.len(),
            root,
            config.max_files
        );
        documents.truncate(config.max_files);
    }
    documents.into_iter().map(|(_, locator)| locator).collect()
}

/// Every document below `dir`, a directory inside the wiki at `root`. Used when a whole
/// directory appears at once, e.g. by a rename.
pub fn documents_under(root: &Path, dir: &Path, config: &WikiConfig) -> Vec<PathBuf> {
    walk_documents(root, dir, config)
        .into_iter()
        .map(|(_, locator)| locator)
        .collect()
}

#[async_trait]
impl DocumentSource for FsDocumentSource {
    async fn enumerate(
        &self,
        root: &Path,
        config: &WikiConfig,
    ) -> Result<Vec<PathBuf>, WikiGraphError> {
        if !root.is_dir() {
            return Err(WikiGraphError::NotFound(format!(
                "wiki root {root:?} is not a directory"
            )));
        }
        let root = root.to_path_buf();
        let config = config.clone();
        Ok(tokio::task::spawn_blocking(move || iter_documents(&root, &config)).await?)
    }

    async fn read(&self, locator: &Path) -> Result<String, WikiGraphError> {
        Ok(tokio::fs::read_to_string(locator).await?)
    }

    async fn exists(&self, locator: &Path) -> Result<bool, WikiGraphError> {
        Ok(tokio::fs::try_exists(locator).await?)
    }

    async fn write(&self, locator: &Path, text: String) -> Result<(), WikiGraphError> {
        if let Some(parent) = locator.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(tokio::fs::write(locator, text).await?)
    }
}
