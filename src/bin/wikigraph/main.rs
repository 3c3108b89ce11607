//! wikigraph CLI tool
//!
//! Command-line interface for indexing a wiki folder and inspecting its graph.
//!
//! ## Commands
//!
//! - `scan <path>`: Index once and print the page tree with titles and backlink counts
//! - `backlinks <path> <page>`: List the backlinks of one page
//! - `new <path> <name>`: Create a page
//! - `watch <path>`: Keep the graph live and print graph events (feature `service`)

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use wikigraph::{
    config::{ConfigProvider, TomlConfigProvider},
    graph::WikiGraph,
    page::Page,
    sync::{GraphSynchronizer, ScanReport},
    tree::TreeItem,
    WikiGraphError,
};

#[derive(Parser)]
#[command(name = "wikigraph")]
#[command(
    author,
    version,
    about = "Index a folder of markdown pages into a page tree and backlink graph",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a wiki folder once and print its page tree
    Scan {
        /// Path to the wiki folder
        path: PathBuf,

        /// Print the tree and pages as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the backlinks of a page
    Backlinks {
        /// Path to the wiki folder
        path: PathBuf,

        /// Page title or path, resolved like a wiki link
        page: String,
    },

    /// Create a new page
    New {
        /// Path to the wiki folder
        path: PathBuf,

        /// Name of the page
        name: String,

        /// Directory, relative to the wiki folder, to create the page in
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// Watch a wiki folder and print graph events until Ctrl-C
    #[cfg(feature = "service")]
    Watch {
        /// Path to the wiki folder
        path: PathBuf,
    },
}

#[derive(Serialize)]
struct ScanOutput<'a> {
    tree: Vec<TreeItem>,
    pages: Vec<&'a Page>,
}

fn synchronizer(path: PathBuf) -> Result<GraphSynchronizer, WikiGraphError> {
    let config = TomlConfigProvider::for_root(&path).get_config()?;
    Ok(GraphSynchronizer::with_fs(path, config))
}

fn scan(
    runtime: &tokio::runtime::Runtime,
    sync: &GraphSynchronizer,
) -> Result<ScanReport, WikiGraphError> {
    let report = runtime.block_on(sync.init())?;
    for (path, err) in report.failed.iter() {
        eprintln!("warning: could not read {path}: {err}");
    }
    Ok(report)
}

fn print_tree(graph: &WikiGraph, items: &[TreeItem], depth: usize) {
    let indent = "  ".repeat(depth);
    for item in items {
        match item {
            TreeItem::Directory(dir) => {
                println!("{indent}{}/", dir.name);
                print_tree(graph, &dir.children, depth + 1);
            }
            TreeItem::Page(entry) => match graph.page(&entry.path) {
                Some(page) => println!(
                    "{indent}{} ({}) <- {}",
                    page.display_name(),
                    page.path,
                    page.back_links.len()
                ),
                None => println!("{indent}{}", entry.name),
            },
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Scan { path, json } => {
            let sync = synchronizer(path)?;
            let report = scan(&runtime, &sync)?;
            let graph = sync.read();
            if json {
                let output = ScanOutput {
                    tree: graph.sorted_tree(),
                    pages: graph.pages().collect(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_tree(&graph, &graph.sorted_tree(), 0);
                println!(
                    "\n{} pages, {} backlinks",
                    report.pages, report.back_links
                );
            }
            Ok(())
        }

        Commands::Backlinks { path, page } => {
            let sync = synchronizer(path)?;
            scan(&runtime, &sync)?;
            let graph = sync.read();
            let Some(target) = graph.resolve_link(&page) else {
                return Err(WikiGraphError::NotFound(format!("no page matches {page:?}")).into());
            };
            println!("{} ({})", target.display_name(), target.path);
            for link in target.back_links.iter() {
                let source = graph
                    .page_by_locator(&link.location.locator)
                    .map(|page| page.source_label().to_string())
                    .unwrap_or_else(|| link.location.locator.display().to_string());
                println!(
                    "  {}:{}  {}",
                    source,
                    link.location.range.start.line + 1,
                    link.line_preview.trim()
                );
            }
            Ok(())
        }

        Commands::New { path, name, dir } => {
            let sync = synchronizer(path)?;
            scan(&runtime, &sync)?;
            let locator = runtime.block_on(sync.create_page(&name, dir.as_deref()))?;
            println!("{}", locator.display());
            Ok(())
        }

        #[cfg(feature = "service")]
        Commands::Watch { path } => {
            // The service owns its runtime.
            drop(runtime);
            let service = wikigraph::watch::WatchService::new(path)?;
            let mut events = service.synchronizer().subscribe();
            let event_handle = std::thread::spawn(move || {
                while let Some(event) = events.blocking_recv() {
                    println!("[Event] {event}");
                }
            });

            let report = service.init()?;
            println!("Indexed {} pages, {} backlinks", report.pages, report.back_links);
            service.start()?;
            println!(
                "Watching {} for changes. Press Ctrl-C to stop.",
                service.root().display()
            );

            let running = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
            let r = running.clone();
            ctrlc::set_handler(move || {
                println!("\nShutting down...");
                r.store(false, std::sync::atomic::Ordering::SeqCst);
            })?;
            while running.load(std::sync::atomic::Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(100));
            }

            service.shutdown()?;
            drop(service);
            drop(event_handle);
            println!("Shutdown complete");
            Ok(())
        }
    }
}
