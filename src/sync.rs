//! Incremental maintenance of a [`WikiGraph`] from document events.
//!
//! A [`GraphSynchronizer`] is the single writer of its graph. Every mutating operation holds an
//! async mutation gate for its whole duration (I/O included), so two mutations never interleave,
//! and applies each state transition inside one write critical section of the graph lock, so
//! readers never observe a half-applied change. [`GraphEvent`]s describing each transition are
//! emitted to subscribers after the lock is released.
//!
//! ```no_run
//! # async fn run() -> Result<(), wikigraph::WikiGraphError> {
//! use wikigraph::{config::WikiConfig, sync::GraphSynchronizer};
//!
//! let sync = GraphSynchronizer::with_fs("/path/to/wiki".into(), WikiConfig::default());
//! let report = sync.init().await?;
//! println!("indexed {} pages", report.pages);
//! if let Some(about) = sync.resolve_link("About") {
//!     println!("{} has {} backlinks", about.path, about.back_links.len());
//! }
//! # Ok(())
//! # }
//! ```

use futures::{future::join_all, stream, StreamExt};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    backlinks::{compute_links_for, LinkContribution},
    config::WikiConfig,
    error::WikiGraphError,
    event::{EventBus, FileEvent, GraphEvent},
    graph::{GraphState, WikiGraph},
    page::{new_page_contents, BackLink, Page},
    paths::{page_file_path, relative_page_path, sanitize_name, string_to_os_path},
    source::{DocumentSource, FsDocumentSource},
    tree::TreeItem,
};

/// Upper bound on document reads in flight during a scan.
const LOAD_CONCURRENCY: usize = 32;

/// Outcome of an initial scan or refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub pages: usize,
    pub back_links: usize,
    /// Pages whose contents could not be read, with the read error. They stay in the tree
    /// without contents.
    pub failed: Vec<(String, WikiGraphError)>,
}

pub struct GraphSynchronizer {
    root: PathBuf,
    config: WikiConfig,
    source: Arc<dyn DocumentSource>,
    graph: Arc<RwLock<WikiGraph>>,
    events: Mutex<EventBus>,
    gate: tokio::sync::Mutex<()>,
}

impl GraphSynchronizer {
    pub fn new(
        root: PathBuf,
        config: WikiConfig,
        source: Arc<dyn DocumentSource>,
    ) -> GraphSynchronizer {
        GraphSynchronizer {
            root,
            config,
            source,
            graph: Arc::new(RwLock::new(WikiGraph::new())),
            events: Mutex::new(EventBus::default()),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// A synchronizer reading documents from the local file system.
    pub fn with_fs(root: PathBuf, config: WikiConfig) -> GraphSynchronizer {
        GraphSynchronizer::new(root, config, Arc::new(FsDocumentSource))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    /// Shared handle to the graph, for readers that outlive a borrow of the synchronizer.
    pub fn graph(&self) -> Arc<RwLock<WikiGraph>> {
        self.graph.clone()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, WikiGraph> {
        self.graph.read()
    }

    pub fn subscribe(&self) -> UnboundedReceiver<GraphEvent> {
        self.events.lock().subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.graph.read().is_ready()
    }

    /// Snapshot of the tree in display order.
    pub fn tree(&self) -> Vec<TreeItem> {
        self.graph.read().sorted_tree()
    }

    /// Snapshot of the page list in path order.
    pub fn pages(&self) -> Vec<Page> {
        self.graph.read().pages().cloned().collect()
    }

    pub fn resolve_link(&self, title: &str) -> Option<Page> {
        self.graph.read().resolve_link(title).cloned()
    }

    pub fn back_links(&self, path: &str) -> Vec<BackLink> {
        self.graph.read().back_links(path).to_vec()
    }

    fn apply<F>(&self, transition: F)
    where
        F: FnOnce(&mut WikiGraph) -> Vec<GraphEvent>,
    {
        let events = {
            let mut graph = self.graph.write();
            transition(&mut graph)
        };
        if !events.is_empty() {
            self.events.lock().emit_all(events);
        }
    }

    /// Build the graph from scratch: enumerate, populate the tree and page list (entering
    /// `Ready`), load every document, then compute and merge all backlinks.
    #[tracing::instrument(skip_all)]
    pub async fn init(&self) -> Result<ScanReport, WikiGraphError> {
        let _gate = self.gate.lock().await;
        self.scan().await
    }

    /// Discard the graph and rescan the root.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self) -> Result<ScanReport, WikiGraphError> {
        let _gate = self.gate.lock().await;
        tracing::info!("Refreshing wiki graph for {:?}", self.root);
        self.scan().await
    }

    async fn scan(&self) -> Result<ScanReport, WikiGraphError> {
        let was_ready = self.graph.read().is_ready();
        self.apply(|graph| graph.set_state(GraphState::Loading));

        if !self.config.enabled {
            tracing::info!("Wiki indexing is disabled for {:?}", self.root);
            self.apply(|graph| {
                let mut events = graph.reset(Vec::new());
                events.extend(graph.set_state(GraphState::Ready));
                events
            });
            return Ok(ScanReport::default());
        }

        let locators = match self.source.enumerate(&self.root, &self.config).await {
            Ok(locators) => locators,
            Err(err) => {
                tracing::error!("Failed to enumerate documents under {:?}: {err}", self.root);
                if was_ready {
                    self.apply(|graph| graph.set_state(GraphState::Ready));
                }
                return Err(err);
            }
        };

        let mut pages = Vec::with_capacity(locators.len());
        for locator in locators {
            match relative_page_path(&self.root, &locator) {
                Ok(path) => pages.push(Page::new(locator, path)),
                Err(err) => tracing::warn!("Skipping {locator:?}: {err}"),
            }
        }
        let targets: Vec<(String, PathBuf)> = pages
            .iter()
            .map(|page| (page.path.clone(), page.locator.clone()))
            .collect();
        let page_count = pages.len();
        self.apply(|graph| {
            let mut events = graph.reset(pages);
            events.extend(graph.set_state(GraphState::Ready));
            events
        });
        tracing::info!("Indexed {page_count} pages under {:?}", self.root);

        let loads: Vec<(String, Result<String, WikiGraphError>)> = stream::iter(targets)
            .map(|(path, locator)| {
                let source = self.source.clone();
                async move {
                    let contents = source.read(&locator).await;
                    (path, contents)
                }
            })
            .buffer_unordered(LOAD_CONCURRENCY)
            .collect()
            .await;
        let mut loaded = Vec::with_capacity(loads.len());
        let mut failed = Vec::new();
        for (path, result) in loads {
            match result {
                Ok(contents) => loaded.push((path, contents)),
                Err(err) => {
                    tracing::warn!("Failed to load {path}: {err}");
                    failed.push((path, err));
                }
            }
        }
        failed.sort_by(|a, b| a.0.cmp(&b.0));
        self.apply(|graph| {
            loaded
                .into_iter()
                .flat_map(|(path, contents)| graph.set_contents(&path, contents))
                .collect()
        });

        let contributions = self.compute_all_links().await?;
        let back_links = contributions.len();
        self.apply(|graph| graph.merge_links(contributions));
        tracing::info!("Resolved {back_links} backlinks");

        Ok(ScanReport {
            pages: page_count,
            back_links,
            failed,
        })
    }

    /// Every page's link contributions, computed concurrently against one snapshot of the page
    /// list. Results keep page order.
    async fn compute_all_links(&self) -> Result<Vec<LinkContribution>, WikiGraphError> {
        let snapshot: Arc<Vec<Page>> = Arc::new(self.graph.read().pages().cloned().collect());
        if snapshot.is_empty() {
            return Ok(Vec::new());
        }
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let chunk = snapshot.len().div_ceil(workers).max(1);
        let tasks = (0..snapshot.len()).step_by(chunk).map(|start| {
            let snapshot = snapshot.clone();
            tokio::task::spawn_blocking(move || {
                let end = (start + chunk).min(snapshot.len());
                snapshot[start..end]
                    .iter()
                    .flat_map(|page| compute_links_for(page, snapshot.iter()))
                    .collect::<Vec<_>>()
            })
        });
        let mut contributions = Vec::new();
        for result in join_all(tasks).await {
            contributions.extend(result?);
        }
        Ok(contributions)
    }

    /// Dispatch a watcher notification to the matching handler.
    pub async fn handle(&self, event: &FileEvent) -> Result<(), WikiGraphError> {
        match event {
            FileEvent::Created(locator) => self.on_create(locator).await,
            FileEvent::Changed(locator) => self.on_change(locator).await,
            FileEvent::Deleted(locator) => self.on_delete(locator).await,
        }
    }

    /// Start tracking a new document. Creates for tracked or non-document locators are no-ops.
    ///
    /// If the document cannot be read it is still tracked, without contents, and the read error
    /// is returned.
    pub async fn on_create(&self, locator: &Path) -> Result<(), WikiGraphError> {
        let _gate = self.gate.lock().await;
        self.create_locked(locator).await
    }

    async fn create_locked(&self, locator: &Path) -> Result<(), WikiGraphError> {
        let path = match relative_page_path(&self.root, locator) {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!("Ignoring create outside of the wiki: {err}");
                return Ok(());
            }
        };
        if !self.config.is_document(&path) {
            tracing::debug!("Ignoring create of non-document {path}");
            return Ok(());
        }
        if self.graph.read().contains_locator(locator) {
            tracing::debug!("Ignoring duplicate create of {path}");
            return Ok(());
        }

        let mut page = Page::new(locator.to_path_buf(), path.clone());
        let loaded = self.source.read(locator).await;
        match &loaded {
            Ok(contents) => page.set_contents(contents.clone()),
            Err(err) => tracing::warn!("Failed to load new page {path}: {err}"),
        }
        self.apply(|graph| {
            let mut events = graph.insert_page(page);
            events.extend(graph.reconcile(&path));
            events
        });
        tracing::debug!("Created {path}");
        loaded.map(|_| ())
    }

    /// Reload a tracked document and reconcile its backlinks. Changes to untracked locators are
    /// no-ops.
    ///
    /// On a failed read the page keeps its last-known contents, title and backlinks, and the
    /// error is returned.
    pub async fn on_change(&self, locator: &Path) -> Result<(), WikiGraphError> {
        let _gate = self.gate.lock().await;
        let Some(path) = self
            .graph
            .read()
            .page_by_locator(locator)
            .map(|page| page.path.clone())
        else {
            tracing::debug!("Ignoring change of untracked {locator:?}");
            return Ok(());
        };

        let contents = match self.source.read(locator).await {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!("Failed to reload {path}: {err}");
                return Err(err);
            }
        };
        self.apply(|graph| {
            let mut events = graph.set_contents(&path, contents);
            events.extend(graph.reconcile(&path));
            events
        });
        tracing::debug!("Reconciled {path}");
        Ok(())
    }

    /// Stop tracking a document, dropping the backlinks it contributed. A locator naming a
    /// directory removes every tracked page below it. Deletes of untracked locators are no-ops.
    pub async fn on_delete(&self, locator: &Path) -> Result<(), WikiGraphError> {
        let _gate = self.gate.lock().await;
        let removed = {
            let graph = self.graph.read();
            if graph.contains_locator(locator) {
                vec![locator.to_path_buf()]
            } else {
                graph.locators_under(locator)
            }
        };
        if removed.is_empty() {
            tracing::debug!("Ignoring delete of untracked {locator:?}");
            return Ok(());
        }
        self.apply(|graph| {
            removed
                .iter()
                .flat_map(|locator| graph.remove_page(locator))
                .collect()
        });
        tracing::debug!("Deleted {} page(s) at {locator:?}", removed.len());
        Ok(())
    }

    /// Create a page named `name`, optionally inside `directory` (relative to the root), and
    /// start tracking it. Returns the page's locator. A page that is already tracked, or whose
    /// file already exists, is never overwritten.
    #[tracing::instrument(skip_all)]
    pub async fn create_page(
        &self,
        name: &str,
        directory: Option<&str>,
    ) -> Result<PathBuf, WikiGraphError> {
        if sanitize_name(name).is_empty() {
            return Err(WikiGraphError::Custom(format!(
                "cannot create a page from the name {name:?}"
            )));
        }
        let _gate = self.gate.lock().await;

        let mut relative = page_file_path(name, &self.config);
        if let Some(dir) = directory.map(|d| d.trim_matches('/')).filter(|d| !d.is_empty()) {
            if !relative.contains('/') {
                relative = format!("{dir}/{relative}");
            }
        }
        let locator = self.root.join(string_to_os_path(&relative));
        if self.graph.read().contains_locator(&locator) {
            tracing::debug!("Page {relative} already exists");
            return Ok(locator);
        }

        if self.source.exists(&locator).await? {
            // Present on disk but untracked, e.g. beyond `max_files`: adopt it unchanged.
            tracing::info!("Tracking existing page {relative}");
        } else {
            tracing::info!("Creating page {relative}");
            let contents = new_page_contents(name, &self.config)?;
            self.source.write(&locator, contents).await?;
        }
        self.create_locked(&locator).await?;
        Ok(locator)
    }
}
