//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; later calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Write `contents` to `relative` under `root`, creating parent directories.
#[allow(dead_code)]
pub fn write_page(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

/// Create a small wiki directory.
///
/// Returns the canonical path to the wiki directory (`<temp_dir>/wiki/`), which holds:
/// - `index.md`: titled "Home", links to About and Journal Ideas and carries a `#project` tag
/// - `about.md`: titled "About"
/// - `notes/project.md`: titled "Project", links back to Home
/// - `notes/journal/ideas.md`: titled "Journal Ideas", embeds About
/// - `assets/diagram.png`, `node_modules/pkg/readme.md` and `.obsidian/cache.md`, which are not
///   pages
#[allow(dead_code)]
pub fn create_test_wiki(temp_dir: &TempDir) -> PathBuf {
    let root = temp_dir.path().join("wiki");
    std::fs::create_dir(&root).unwrap();
    let root = root.canonicalize().unwrap();

    write_page(
        &root,
        "index.md",
        "# Home\n[[About]]\nSee [[Journal Ideas]] for more. #project\n",
    );
    write_page(&root, "about.md", "# About\n\nWho we are.\n");
    write_page(&root, "notes/project.md", "# Project\nBack to [[home]].\n");
    write_page(
        &root,
        "notes/journal/ideas.md",
        "# Journal Ideas\n![[About]]\n",
    );
    write_page(&root, "assets/diagram.png", "not a page");
    write_page(&root, "node_modules/pkg/readme.md", "[[About]]");
    write_page(&root, ".obsidian/cache.md", "[[About]]");
    root
}
