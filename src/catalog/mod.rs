//! COG reference catalog storage and indexing.
//!
//! The catalog joins the three tables of an NCBI COG release:
//!
//! - `fun-20.tab`: functional category code -> name (optional; a built-in
//!   table of the 25 standard categories is used when absent)
//! - `cog-20.def.tab`: COG id -> name, category codes, gene, pathway
//! - `cog-20.cog.csv`: protein accession -> COG id
//!
//! Every cross-reference is checked when the catalog is built, so lookups
//! on a loaded catalog never encounter a dangling COG id or category code.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cog_classifier::CogCatalog;
//! use std::path::Path;
//!
//! let catalog = CogCatalog::load_from_dir(Path::new("data/cog")).unwrap();
//! let record = catalog.lookup("WP_000001.1").unwrap();
//! println!("{} {}", record.id, record.name);
//! ```
//!
//! ## Snapshots
//!
//! A validated catalog can be written to a binary snapshot and reloaded
//! without re-parsing the text tables:
//!
//! ```rust,no_run
//! use cog_classifier::catalog::snapshot::{load_snapshot, save_snapshot};
//! use cog_classifier::CogCatalog;
//! use std::path::Path;
//!
//! let catalog = CogCatalog::load_from_dir(Path::new("data/cog")).unwrap();
//! save_snapshot(&catalog, Path::new("cog.bin")).unwrap();
//! let (reloaded, _info) = load_snapshot(Path::new("cog.bin")).unwrap();
//! ```

pub mod builder;
pub mod categories;
pub mod index;
pub mod snapshot;
pub mod store;
