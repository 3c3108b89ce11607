//! # wikigraph
//!
//! An incremental index over a folder of interlinked markdown documents ("pages").
//!
//! ## Overview
//!
//! wikigraph turns a wiki folder into a navigable graph: a page tree mirroring the directory
//! structure, and a backlink index mapping every page to the places that reference it. The graph
//! is built once by an initial scan and afterwards kept consistent one document at a time as files
//! are created, edited or deleted. There is no full rebuild per change.
//!
//! ### Key Features
//!
//! - **Link grammar**: `[[Wiki Links]]`, `#[[tag links]]`, `#tags` and `![[embeds]]`
//! - **Resolution**: a link names a page by title (case-insensitive), path, or path without
//!   extension, in that priority
//! - **Incremental sync**: create/change/delete events reconcile only the affected backlinks
//! - **Consistent reads**: every state transition is applied in one write critical section
//! - **Event streaming**: subscribers are told when the tree, a page, or a page's backlinks change
//! - **File watching**: the `service` feature keeps a graph live with `notify`
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **[`links`]**: the link tokenizer and offset/position helpers
//! - **[`tree`]**: the page tree (`PageTree`, `TreeItem`)
//! - **[`resolver`]**: link title to page resolution
//! - **[`backlinks`]**: computing, reconciling and removing backlink entries
//! - **[`graph`]**: the graph state and its read API
//! - **[`sync`]**: [`sync::GraphSynchronizer`], the single writer applying document events
//! - **[`watch`]**: the file watching service (feature `service`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wikigraph::{config::WikiConfig, sync::GraphSynchronizer};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sync = GraphSynchronizer::with_fs("./wiki".into(), WikiConfig::default());
//!     sync.init().await?;
//!
//!     for page in sync.pages() {
//!         println!("{} <- {} backlinks", page.display_name(), page.back_links.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - **`service`**: [`watch::WatchService`] built on `notify-debouncer-full`
//! - **`bin`**: the `wikigraph` command line tool

pub mod backlinks;
pub mod config;
pub mod error;
pub mod event;
pub mod graph;
pub mod links;
pub mod page;
pub mod paths;
pub mod resolver;
pub mod source;
pub mod sync;
#[cfg(test)]
mod tests;
pub mod tree;
#[cfg(feature = "service")]
pub mod watch;

pub use error::*;
