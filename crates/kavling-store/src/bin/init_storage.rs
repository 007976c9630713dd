//! # Storage Layout Initialiser
//!
//! Creates the storage directory and every missing collection file as an
//! empty collection. Existing files are never touched.
//!
//! ## Usage
//! ```bash
//! # Directory from STORAGE_DIR
//! STORAGE_DIR=./data cargo run -p kavling-store --bin init-storage
//!
//! # Explicit directory
//! cargo run -p kavling-store --bin init-storage -- --dir ./data
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use kavling_store::layout::ensure_layout;
use kavling_store::CollectionName;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut dir = env::var("STORAGE_DIR").ok().map(PathBuf::from);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dir" | "-d" => {
                if i + 1 < args.len() {
                    dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kavling storage initialiser");
                println!();
                println!("Usage: init-storage [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --dir <PATH>   Storage directory (default: $STORAGE_DIR)");
                println!("  -h, --help         Show this help message");
                return ExitCode::SUCCESS;
            }
            _ => {}
        }
        i += 1;
    }

    let Some(dir) = dir.filter(|d| !d.as_os_str().is_empty()) else {
        error!("No storage directory: pass --dir or set STORAGE_DIR");
        return ExitCode::FAILURE;
    };

    match ensure_layout(&dir) {
        Ok(created) => {
            info!(
                dir = %dir.display(),
                created = created.len(),
                existing = CollectionName::ALL.len() - created.len(),
                "Storage ready"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(dir = %dir.display(), error = %err, "Storage initialisation failed");
            ExitCode::FAILURE
        }
    }
}
