//! # Watch Service - Keeping a Wiki Graph Live
//!
//! The `watch` module provides [`WatchService`], a long-running service that monitors a wiki
//! folder for changes and feeds them to a [`GraphSynchronizer`], keeping the page tree and
//! backlink index consistent with the file system.
//!
//! ## Overview
//!
//! - **File watching**: filesystem notifications via `notify-debouncer-full`
//! - **Debouncing**: rapid saves of one file collapse into one notification
//! - **Ordered delivery**: notifications travel through a single FIFO channel to a single worker
//!   task, so events for the same document are applied in arrival order
//! - **Graph events**: subscribe through [`GraphSynchronizer::subscribe`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wikigraph::watch::WatchService;
//! use std::path::PathBuf;
//!
//! let service = WatchService::new(PathBuf::from("/path/to/wiki"))?;
//! let report = service.init()?;
//! println!("indexed {} pages", report.pages);
//! service.start()?;
//!
//! // ... the graph now follows the folder ...
//! let sync = service.synchronizer();
//! println!("{} pages", sync.pages().len());
//!
//! service.shutdown()?;
//! # Ok::<(), wikigraph::WikiGraphError>(())
//! ```
//!
//! ## Event Mapping
//!
//! | notify event | [`FileEvent`] |
//! |---|---|
//! | `Create(_)` | `Created` |
//! | `Remove(_)` | `Deleted` |
//! | `Modify(Name(_))`, path exists | `Created` then `Changed` |
//! | `Modify(Name(_))`, path gone | `Deleted` |
//! | `Modify(_)` | `Changed` |
//!
//! Paths outside the document glob, matching an ignore glob, or under a hidden directory are
//! dropped before they reach the synchronizer. A rename therefore arrives as a delete followed by
//! a create; between the two the renamed page's backlinks are briefly absent.
//!
//! Directories are expanded: a directory created or renamed into place yields the events above
//! for every document inside it, and a vanished directory yields one `Deleted` for the directory
//! itself, which the synchronizer applies to every page tracked below it.
//!
//! ## Threading Model
//!
//! The service owns a multi-threaded tokio runtime. The debouncer's callback runs on the
//! debouncer thread and only enqueues [`FileEvent`]s; the worker task on the runtime applies them.
//! Do not create or drop a `WatchService` from inside another async runtime.

use notify_debouncer_full::{
    new_debouncer,
    notify::{
        event::ModifyKind, Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode,
        Watcher,
    },
    DebounceEventResult, Debouncer, FileIdMap,
};
use parking_lot::Mutex;
use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::{
    runtime::Runtime,
    sync::mpsc::{unbounded_channel, UnboundedReceiver},
    task::JoinHandle,
};

use crate::{
    config::{is_hidden_path, ConfigProvider, TomlConfigProvider, WikiConfig},
    error::WikiGraphError,
    event::FileEvent,
    paths::relative_page_path,
    source::documents_under,
    sync::{GraphSynchronizer, ScanReport},
};

const DEBOUNCE_TIMEOUT: Duration = Duration::from_millis(500);

/// A file system watcher with debouncing for a wiki folder
type WikiWatcher = Debouncer<RecommendedWatcher, FileIdMap>;

struct ActiveWatch {
    debouncer: WikiWatcher,
    worker: JoinHandle<()>,
}

pub struct WatchService {
    root: PathBuf,
    synchronizer: Arc<GraphSynchronizer>,
    active: Mutex<Option<ActiveWatch>>,
    runtime: Runtime,
}

impl WatchService {
    /// Watch `root`, configured by its `wikigraph.toml` (defaults when absent).
    pub fn new(root: PathBuf) -> Result<Self, WikiGraphError> {
        let config = TomlConfigProvider::for_root(&root).get_config()?;
        Self::with_config(root, config)
    }

    pub fn with_config(root: PathBuf, config: WikiConfig) -> Result<Self, WikiGraphError> {
        let root = root.canonicalize()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        tracing::debug!("Initializing WatchService for {:?}", root);
        let synchronizer = Arc::new(GraphSynchronizer::with_fs(root.clone(), config));
        Ok(WatchService {
            root,
            synchronizer,
            active: Mutex::new(None),
            runtime,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn synchronizer(&self) -> Arc<GraphSynchronizer> {
        self.synchronizer.clone()
    }

    /// Run a future on the service's runtime, e.g. a query or [`GraphSynchronizer::refresh`].
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Perform the initial scan.
    pub fn init(&self) -> Result<ScanReport, WikiGraphError> {
        self.runtime.block_on(self.synchronizer.init())
    }

    /// Begin watching the root. Errors if the service is already watching.
    pub fn start(&self) -> Result<(), WikiGraphError> {
        let mut active = self.active.lock();
        if active.is_some() {
            return Err(WikiGraphError::Custom(format!(
                "WatchService already watching {:?}",
                self.root
            )));
        }

        let (tx, rx) = unbounded_channel::<FileEvent>();
        let worker = self
            .runtime
            .spawn(run_worker(self.synchronizer.clone(), rx));

        let root = self.root.clone();
        let config = self.synchronizer.config().clone();
        let mut debouncer = new_debouncer(
            DEBOUNCE_TIMEOUT,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events.iter() {
                        for file_event in file_events(&event.event, &root, &config) {
                            tracing::debug!("[Debouncer] enqueuing {file_event}");
                            if let Err(err) = tx.send(file_event) {
                                tracing::warn!("[Debouncer] worker is gone: {err}");
                                return;
                            }
                        }
                    }
                }
                Err(errors) => {
                    tracing::error!("Notify debouncer returned errors: {:?}", errors);
                }
            },
        )?;
        if let Err(err) = debouncer
            .watcher()
            .watch(&self.root, RecursiveMode::Recursive)
        {
            worker.abort();
            return Err(err.into());
        }
        tracing::info!("Watching {:?}", self.root);
        *active = Some(ActiveWatch { debouncer, worker });
        Ok(())
    }

    pub fn is_watching(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Stop watching: release the watcher and stop the worker task. Idempotent.
    pub fn shutdown(&self) -> Result<(), WikiGraphError> {
        if let Some(ActiveWatch {
            mut debouncer,
            worker,
        }) = self.active.lock().take()
        {
            let unwatch_res = debouncer.watcher().unwatch(&self.root);
            worker.abort();
            tracing::debug!("Unwatch_res(path: {:?}) = {:?}", self.root, unwatch_res);
            unwatch_res?;
        }
        Ok(())
    }
}

impl Drop for WatchService {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::warn!("Error shutting down watch service: {err}");
        }
    }
}

async fn run_worker(
    synchronizer: Arc<GraphSynchronizer>,
    mut rx: UnboundedReceiver<FileEvent>,
) {
    tracing::info!("[WatchService] worker started");
    while let Some(event) = rx.recv().await {
        if let Err(err) = synchronizer.handle(&event).await {
            tracing::warn!("[WatchService] failed to apply {event}: {err}");
        }
    }
    tracing::info!("[WatchService] worker stopped");
}

/// Translate one notification into the document events it implies for the wiki at `root`.
pub(crate) fn file_events(
    event: &NotifyEvent,
    root: &Path,
    config: &WikiConfig,
) -> Vec<FileEvent> {
    let mut file_events = Vec::new();
    let renamed = matches!(event.kind, EventKind::Modify(ModifyKind::Name(_)));
    for path in event.paths.iter() {
        let Ok(page_path) = relative_page_path(root, path) else {
            continue;
        };
        if page_path.is_empty() || is_hidden_path(&page_path) {
            continue;
        }
        if path.is_dir() {
            if renamed || matches!(event.kind, EventKind::Create(_)) {
                for locator in documents_under(root, path, config) {
                    file_events.push(FileEvent::Created(locator.clone()));
                    if renamed {
                        file_events.push(FileEvent::Changed(locator));
                    }
                }
            }
            continue;
        }
        if !config.is_document(&page_path) {
            // A vanished non-document may have been a directory of pages.
            let removed = renamed || matches!(event.kind, EventKind::Remove(_));
            if removed && !path.exists() && !config.is_ignored(&page_path) {
                file_events.push(FileEvent::Deleted(path.clone()));
            }
            continue;
        }
        match event.kind {
            EventKind::Create(_) => file_events.push(FileEvent::Created(path.clone())),
            EventKind::Remove(_) => file_events.push(FileEvent::Deleted(path.clone())),
            EventKind::Modify(ModifyKind::Name(_)) => {
                if path.exists() {
                    file_events.push(FileEvent::Created(path.clone()));
                    file_events.push(FileEvent::Changed(path.clone()));
                } else {
                    file_events.push(FileEvent::Deleted(path.clone()));
                }
            }
            EventKind::Modify(_) => file_events.push(FileEvent::Changed(path.clone())),
            _ => {}
        }
    }
    file_events
}
