//! The in-memory wiki graph: page list, page tree and readiness state.
//!
//! [`WikiGraph`] is plain data plus consistency-preserving mutators. Each mutator performs one
//! whole state transition and returns the [`GraphEvent`]s describing it; the
//! [`crate::sync::GraphSynchronizer`] applies them under a write lock so readers never see a
//! half-applied change.

use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
};

use crate::{
    backlinks::{self, LinkContribution},
    event::GraphEvent,
    page::{BackLink, Page, PageMap},
    resolver::resolve,
    tree::{PageTree, TreeItem},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphState {
    #[default]
    Loading,
    Ready,
}

/// A completion candidate for a link being typed in some document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCandidate {
    pub label: String,
    pub path: String,
    /// The partial link typed so far already resolves to this page.
    pub resolved: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WikiGraph {
    state: GraphState,
    pages: PageMap,
    by_locator: HashMap<PathBuf, String>,
    tree: PageTree,
}

fn backlink_events(paths: BTreeSet<String>) -> impl Iterator<Item = GraphEvent> {
    paths.into_iter().map(GraphEvent::BackLinksChanged)
}

impl WikiGraph {
    pub fn new() -> WikiGraph {
        WikiGraph::default()
    }

    pub fn state(&self) -> GraphState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == GraphState::Ready
    }

    /// Root-level tree items in insertion order.
    pub fn tree(&self) -> &[TreeItem] {
        self.tree.root()
    }

    /// The tree with every level in display order.
    pub fn sorted_tree(&self) -> Vec<TreeItem> {
        self.tree.sorted()
    }

    pub fn page_tree(&self) -> &PageTree {
        &self.tree
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, path: &str) -> Option<&Page> {
        self.pages.get(path)
    }

    pub fn page_by_locator(&self, locator: &Path) -> Option<&Page> {
        self.by_locator
            .get(locator)
            .and_then(|path| self.pages.get(path))
    }

    pub fn contains_locator(&self, locator: &Path) -> bool {
        self.by_locator.contains_key(locator)
    }

    /// Locators of tracked pages strictly below the directory `dir`, in path order.
    pub fn locators_under(&self, dir: &Path) -> Vec<PathBuf> {
        self.pages
            .values()
            .filter(|page| page.locator != dir && page.locator.starts_with(dir))
            .map(|page| page.locator.clone())
            .collect()
    }

    pub fn resolve_link(&self, title: &str) -> Option<&Page> {
        resolve(self.pages.values(), title)
    }

    /// Backlinks of the page at `path`; empty when the page is unknown or unreferenced.
    pub fn back_links(&self, path: &str) -> &[BackLink] {
        self.pages
            .get(path)
            .map(|page| page.back_links.as_slice())
            .unwrap_or_default()
    }

    /// Pages a link typed in `exclude` may point to, labelled by title (else path), in label
    /// order.
    pub fn link_candidates(&self, exclude: Option<&Path>, typed: &str) -> Vec<LinkCandidate> {
        let resolved = self.resolve_link(typed).map(|page| page.path.as_str());
        let mut candidates: Vec<LinkCandidate> = self
            .pages
            .values()
            .filter(|page| Some(page.locator.as_path()) != exclude)
            .map(|page| LinkCandidate {
                label: page.source_label().to_string(),
                path: page.path.clone(),
                resolved: resolved == Some(page.path.as_str()),
            })
            .collect();
        candidates.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
        candidates
    }

    pub(crate) fn set_state(&mut self, state: GraphState) -> Vec<GraphEvent> {
        if self.state == state {
            return Vec::new();
        }
        self.state = state;
        vec![match state {
            GraphState::Loading => GraphEvent::Loading,
            GraphState::Ready => GraphEvent::Ready,
        }]
    }

    /// Replace the whole page list and tree, as at the start of a scan.
    pub(crate) fn reset(&mut self, pages: Vec<Page>) -> Vec<GraphEvent> {
        self.pages.clear();
        self.by_locator.clear();
        self.tree = PageTree::new();
        for page in pages {
            self.tree.insert(&page.path);
            self.by_locator.insert(page.locator.clone(), page.path.clone());
            self.pages.insert(page.path.clone(), page);
        }
        vec![GraphEvent::TreeChanged]
    }

    /// Add a page to the page list and tree. A page already tracked (by locator or path) is left
    /// untouched.
    pub(crate) fn insert_page(&mut self, page: Page) -> Vec<GraphEvent> {
        if self.by_locator.contains_key(&page.locator) || self.pages.contains_key(&page.path) {
            tracing::debug!("Ignoring duplicate insert of {}", page.path);
            return Vec::new();
        }
        self.tree.insert(&page.path);
        self.by_locator.insert(page.locator.clone(), page.path.clone());
        let path = page.path.clone();
        self.pages.insert(path.clone(), page);
        vec![GraphEvent::TreeChanged, GraphEvent::PageUpdated(path)]
    }

    /// Store freshly loaded contents for the page at `path`.
    pub(crate) fn set_contents(&mut self, path: &str, contents: String) -> Vec<GraphEvent> {
        match self.pages.get_mut(path) {
            Some(page) => {
                if page.contents.as_deref() == Some(contents.as_str()) {
                    return Vec::new();
                }
                page.set_contents(contents);
                vec![GraphEvent::PageUpdated(path.to_string())]
            }
            None => Vec::new(),
        }
    }

    /// Recompute the backlinks contributed by the page at `path`.
    pub(crate) fn reconcile(&mut self, path: &str) -> Vec<GraphEvent> {
        backlink_events(backlinks::reconcile(&mut self.pages, path)).collect()
    }

    pub(crate) fn merge_links(&mut self, contributions: Vec<LinkContribution>) -> Vec<GraphEvent> {
        backlink_events(backlinks::merge(&mut self.pages, contributions)).collect()
    }

    /// Remove the page at `locator`: its outgoing backlinks, its tree entry, and its list entry.
    pub(crate) fn remove_page(&mut self, locator: &Path) -> Vec<GraphEvent> {
        let Some(path) = self.by_locator.remove(locator) else {
            tracing::debug!("Ignoring removal of untracked locator {locator:?}");
            return Vec::new();
        };
        let mut touched = backlinks::remove_links_from(&mut self.pages, locator);
        touched.remove(&path);
        self.tree.remove(&path);
        self.pages.remove(&path);
        let mut events = vec![GraphEvent::TreeChanged];
        events.extend(backlink_events(touched));
        events
    }
}
