//! `delta` — discover a changeset configuration and build the database.
//!
//! Usage:
//!   delta [search-root]
//!
//! The search root defaults to the current directory. The first
//! `delta.json` or `*.delta.json` file found wins.

use std::path::PathBuf;
use std::process;

use tracing_subscriber::EnvFilter;

use delta::{discover, run};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let (path, config) = match discover(&root) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    tracing::info!(config = %path.display(), "configuration loaded");

    if let Err(e) = run(&config) {
        eprintln!("{e}");
        process::exit(1);
    }
}
