//! # Path/Tree Model
//!
//! [`PageTree`] arranges a flat set of page paths into nested [`Directory`] nodes mirroring the
//! folder structure. Pages are inserted and removed one at a time; directories appear when the
//! first page beneath them is inserted and are pruned, up the ancestor chain, when the last one
//! is removed.
//!
//! Children are kept in insertion order. [`PageTree::sorted`] produces the display order:
//! directories before pages, then case-insensitive name order, with a case-sensitive final
//! tie-break so the order is total.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::paths::page_name;

/// Leaf entry of the tree. Refers to a [`crate::page::Page`] by its path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub name: String,
    pub path: String,
}

impl PageEntry {
    pub fn new(path: &str) -> PageEntry {
        PageEntry {
            name: page_name(path).to_string(),
            path: path.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    pub name: String,
    /// Slash-delimited ancestor chain, e.g. `dir/sub`.
    pub path: String,
    pub children: Vec<TreeItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TreeItem {
    Directory(Directory),
    Page(PageEntry),
}

impl TreeItem {
    pub fn name(&self) -> &str {
        match self {
            TreeItem::Directory(dir) => &dir.name,
            TreeItem::Page(page) => &page.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            TreeItem::Directory(dir) => &dir.path,
            TreeItem::Page(page) => &page.path,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, TreeItem::Directory(_))
    }

    fn is_page_at(&self, path: &str) -> bool {
        matches!(self, TreeItem::Page(page) if page.path == path)
    }
}

/// Display ordering of siblings.
pub fn sibling_order(a: &TreeItem, b: &TreeItem) -> Ordering {
    b.is_directory()
        .cmp(&a.is_directory())
        .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
        .then_with(|| a.name().cmp(b.name()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTree {
    root: Vec<TreeItem>,
}

impl PageTree {
    pub fn new() -> PageTree {
        PageTree::default()
    }

    /// Build a tree from a sequence of page paths.
    pub fn from_paths<'a, I: IntoIterator<Item = &'a str>>(paths: I) -> PageTree {
        let mut tree = PageTree::new();
        for path in paths {
            tree.insert(path);
        }
        tree
    }

    /// Root-level items in insertion order.
    pub fn root(&self) -> &[TreeItem] {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Insert the page at `path`, creating intermediate directories as needed.
    ///
    /// Returns false (and leaves the tree untouched) when the page is already present.
    pub fn insert(&mut self, path: &str) -> bool {
        let segments: Vec<&str> = path.split('/').collect();
        let dirs = &segments[..segments.len() - 1];

        let mut items = &mut self.root;
        let mut dir_path = String::new();
        for segment in dirs {
            if !dir_path.is_empty() {
                dir_path.push('/');
            }
            dir_path.push_str(segment);

            let idx = match items
                .iter()
                .position(|item| matches!(item, TreeItem::Directory(d) if d.name == *segment))
            {
                Some(idx) => idx,
                None => {
                    tracing::trace!("Creating directory node {dir_path}");
                    items.push(TreeItem::Directory(Directory {
                        name: segment.to_string(),
                        path: dir_path.clone(),
                        children: Vec::new(),
                    }));
                    items.len() - 1
                }
            };
            items = match &mut items[idx] {
                TreeItem::Directory(dir) => &mut dir.children,
                TreeItem::Page(_) => unreachable!("index was selected as a directory"),
            };
        }

        if items.iter().any(|item| item.is_page_at(path)) {
            tracing::debug!("Page {path} is already in the tree");
            return false;
        }
        items.push(TreeItem::Page(PageEntry::new(path)));
        true
    }

    /// Remove the page at `path`, pruning directories left empty.
    ///
    /// Returns false when the page was not in the tree.
    pub fn remove(&mut self, path: &str) -> bool {
        let segments: Vec<&str> = path.split('/').collect();
        remove_from(&mut self.root, &segments[..segments.len() - 1], path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Locate the item (page or directory) at `path`.
    pub fn find(&self, path: &str) -> Option<&TreeItem> {
        let mut items = &self.root;
        let segments: Vec<&str> = path.split('/').collect();
        for (idx, segment) in segments.iter().enumerate() {
            let is_last = idx + 1 == segments.len();
            let found = items.iter().find(|item| match item {
                TreeItem::Directory(dir) => dir.name == *segment,
                TreeItem::Page(page) => is_last && page.path == path,
            })?;
            if is_last {
                return Some(found);
            }
            items = match found {
                TreeItem::Directory(dir) => &dir.children,
                TreeItem::Page(_) => return None,
            };
        }
        None
    }

    /// Deep copy of the tree with every level in display order.
    pub fn sorted(&self) -> Vec<TreeItem> {
        sorted_items(&self.root)
    }

    /// Every page path in the tree, depth first in insertion order.
    pub fn page_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        collect_paths(&self.root, &mut paths);
        paths
    }
}

fn remove_from(items: &mut Vec<TreeItem>, dirs: &[&str], path: &str) -> bool {
    match dirs.split_first() {
        None => {
            let before = items.len();
            items.retain(|item| !item.is_page_at(path));
            before != items.len()
        }
        Some((segment, rest)) => {
            let Some(idx) = items
                .iter()
                .position(|item| matches!(item, TreeItem::Directory(d) if d.name == *segment))
            else {
                return false;
            };
            let (removed, now_empty) = match &mut items[idx] {
                TreeItem::Directory(dir) => {
                    let removed = remove_from(&mut dir.children, rest, path);
                    (removed, dir.children.is_empty())
                }
                TreeItem::Page(_) => (false, false),
            };
            if now_empty {
                tracing::trace!("Pruning empty directory {}", items[idx].path());
                items.remove(idx);
            }
            removed
        }
    }
}

fn sorted_items(items: &[TreeItem]) -> Vec<TreeItem> {
    let mut sorted: Vec<TreeItem> = items
        .iter()
        .map(|item| match item {
            TreeItem::Directory(dir) => TreeItem::Directory(Directory {
                name: dir.name.clone(),
                path: dir.path.clone(),
                children: sorted_items(&dir.children),
            }),
            TreeItem::Page(page) => TreeItem::Page(page.clone()),
        })
        .collect();
    sorted.sort_by(sibling_order);
    sorted
}

fn collect_paths<'a>(items: &'a [TreeItem], paths: &mut Vec<&'a str>) {
    for item in items {
        match item {
            TreeItem::Directory(dir) => collect_paths(&dir.children, paths),
            TreeItem::Page(page) => paths.push(&page.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_names(tree: &PageTree) -> Vec<&str> {
        tree.root().iter().map(|item| item.name()).collect()
    }

    #[test]
    fn insert_builds_nested_directories() {
        let tree = PageTree::from_paths(["a.md", "dir/b.md", "dir/sub/c.md"]);
        assert_eq!(root_names(&tree), vec!["a", "dir"]);

        let Some(TreeItem::Directory(dir)) = tree.find("dir") else {
            panic!("dir should be a directory");
        };
        assert_eq!(dir.path, "dir");
        assert_eq!(dir.children.len(), 2);

        let Some(TreeItem::Directory(sub)) = tree.find("dir/sub") else {
            panic!("dir/sub should be a directory");
        };
        assert_eq!(sub.path, "dir/sub");
        assert!(tree.contains("dir/sub/c.md"));
    }

    #[test]
    fn removal_prunes_only_emptied_directories() {
        let mut tree = PageTree::from_paths(["a.md", "dir/b.md", "dir/sub/c.md"]);

        assert!(tree.remove("dir/sub/c.md"));
        assert!(tree.find("dir/sub").is_none());
        assert!(tree.find("dir").is_some());
        assert!(tree.contains("dir/b.md"));

        assert!(tree.remove("dir/b.md"));
        assert!(tree.find("dir").is_none());
        assert_eq!(tree.root().len(), 1);
        assert_eq!(tree.page_paths(), vec!["a.md"]);
    }

    #[test]
    fn pruning_walks_up_multiple_levels() {
        let mut tree = PageTree::from_paths(["x/y/z/deep.md", "top.md"]);
        assert!(tree.remove("x/y/z/deep.md"));
        assert_eq!(root_names(&tree), vec!["top"]);
    }

    #[test]
    fn duplicate_insert_is_noop() {
        let mut tree = PageTree::from_paths(["dir/b.md"]);
        assert!(!tree.insert("dir/b.md"));
        assert_eq!(tree.page_paths(), vec!["dir/b.md"]);
    }

    #[test]
    fn removing_unknown_page_is_noop() {
        let mut tree = PageTree::from_paths(["dir/b.md"]);
        assert!(!tree.remove("dir/missing.md"));
        assert!(!tree.remove("other/missing.md"));
        assert!(!tree.remove("missing.md"));
        assert_eq!(tree.page_paths(), vec!["dir/b.md"]);
    }

    #[test]
    fn page_and_directory_with_same_name_coexist() {
        let mut tree = PageTree::from_paths(["notes.md", "notes/first.md"]);
        assert_eq!(tree.root().len(), 2);
        assert!(tree.contains("notes.md"));
        assert!(tree.find("notes").is_some_and(|item| item.is_directory()));

        assert!(tree.remove("notes/first.md"));
        assert_eq!(tree.page_paths(), vec!["notes.md"]);
    }

    #[test]
    fn sorted_puts_directories_first_then_case_insensitive_names() {
        let tree = PageTree::from_paths([
            "beta.md",
            "Zeta/z.md",
            "Alpha.md",
            "alpha/x.md",
            "b/B.md",
            "b/a.md",
        ]);
        let sorted = tree.sorted();
        let names: Vec<&str> = sorted.iter().map(|item| item.name()).collect();
        assert_eq!(names, vec!["alpha", "b", "Zeta", "Alpha", "beta"]);

        let TreeItem::Directory(b) = &sorted[1] else {
            panic!("expected directory");
        };
        let child_names: Vec<&str> = b.children.iter().map(|item| item.name()).collect();
        assert_eq!(child_names, vec!["a", "B"]);
        // the stored tree keeps insertion order
        assert_eq!(tree.root()[0].name(), "beta");
    }
}
