//! # libris-seed
//!
//! Populate a library with sample authors, books and users.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use libris_infra::{InMemoryLibraryStore, Library, LibraryConfig};
use libris_seed::{SeedOptions, populate};

#[derive(Debug, Parser)]
#[command(name = "libris-seed")]
#[command(version, about = "Populate the library with sample data", long_about = None)]
struct Cli {
    /// Number of users to create
    #[arg(long, default_value_t = 3)]
    users: usize,

    /// Number of books to create
    #[arg(long, default_value_t = 8)]
    books: usize,

    /// How many recent activity entries to print afterwards
    #[arg(long, default_value_t = 5)]
    recent: usize,

    /// Start from a JSON snapshot instead of an empty library
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write the resulting library to this JSON file
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    libris_observability::init();
    let cli = Cli::parse();

    let config = LibraryConfig::from_env().context("invalid library configuration")?;
    let store = match &cli.load {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            InMemoryLibraryStore::from_json(&json)
                .with_context(|| format!("failed to load snapshot {}", path.display()))?
        }
        None => InMemoryLibraryStore::new(),
    };
    let library = Library::new(store, config);

    let summary = populate(
        &library,
        &SeedOptions {
            users: cli.users,
            books: cli.books,
        },
    )
    .context("seeding failed")?;

    println!("Library populated.");
    println!("  - Authors: {} ({} new)", summary.authors_total, summary.authors_created);
    println!("  - Books:   {} ({} new)", summary.books_total, summary.books_created);
    println!("  - Users:   {} ({} new)", summary.users_total, summary.users_created);

    let recent = library.recent_activity(cli.recent)?;
    if !recent.is_empty() {
        println!("Recent activity:");
        for entry in recent {
            println!(
                "  {} [{}] {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.action.label(),
                entry.description
            );
        }
    }

    if let Some(path) = &cli.dump {
        let json = library.store().to_json()?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "snapshot written");
    }

    Ok(())
}
