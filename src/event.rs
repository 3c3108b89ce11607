use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// A file system notification for one document locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileEvent {
    Created(PathBuf),
    Changed(PathBuf),
    Deleted(PathBuf),
}

impl FileEvent {
    pub fn locator(&self) -> &Path {
        match self {
            FileEvent::Created(p) | FileEvent::Changed(p) | FileEvent::Deleted(p) => p,
        }
    }
}

impl Display for FileEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            FileEvent::Created(p) => write!(f, "Created({p:?})"),
            FileEvent::Changed(p) => write!(f, "Changed({p:?})"),
            FileEvent::Deleted(p) => write!(f, "Deleted({p:?})"),
        }
    }
}

/// Notification that part of the graph changed. Consumers recompute whatever views they derive
/// from the graph; events are not debounced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphEvent {
    /// The graph left the `Loading` state.
    Ready,
    /// A (re)scan started; the graph is `Loading`.
    Loading,
    /// Pages were inserted into or removed from the tree.
    TreeChanged,
    /// A page's contents or title changed. Carries the page path.
    PageUpdated(String),
    /// The backlinks of a page changed. Carries the page path.
    BackLinksChanged(String),
}

impl Display for GraphEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            GraphEvent::Ready => write!(f, "Ready"),
            GraphEvent::Loading => write!(f, "Loading"),
            GraphEvent::TreeChanged => write!(f, "TreeChanged"),
            GraphEvent::PageUpdated(path) => write!(f, "PageUpdated({path})"),
            GraphEvent::BackLinksChanged(path) => write!(f, "BackLinksChanged({path})"),
        }
    }
}

/// Fan-out of [`GraphEvent`]s to any number of subscribers. Closed subscribers are dropped on the
/// next emission.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<UnboundedSender<GraphEvent>>,
}

impl EventBus {
    pub fn subscribe(&mut self) -> UnboundedReceiver<GraphEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: GraphEvent) {
        tracing::trace!("Emitting {event}");
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn emit_all<I: IntoIterator<Item = GraphEvent>>(&mut self, events: I) {
        for event in events {
            self.emit(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
