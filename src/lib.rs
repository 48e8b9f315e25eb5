//! # cog-classifier
//!
//! A library for assigning protein sequences to NCBI COG (Clusters of
//! Orthologous Groups) functional categories.
//!
//! Proteins are aligned against the COG reference proteins (with `blastp`,
//! or from a precomputed BLAST tabular file). Each hit's subject accession is
//! resolved to its COG and functional categories through the COG reference
//! tables, hits are filtered and ranked, and every query gets a best hit and
//! a status.
//!
//! ## Features
//!
//! - **Strict reference loading**: the COG tables are cross-checked on load;
//!   dangling COG ids and unknown category codes are errors
//! - **Deterministic ranking**: bit score, then e-value, then identity, then
//!   accession; the best hit never depends on input order
//! - **Optional ambiguity detection**: flag queries whose two best hits are
//!   within a bit-score tolerance
//! - **Bounded concurrency**: a worker pool with per-query timeouts and
//!   cancellation that keeps finished results
//! - **Export**: JSON, CSV and TSV
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use cog_classifier::export::{export, ExportFormat};
//! use cog_classifier::matching::classify_hits;
//! use cog_classifier::parsing::blast::{group_by_query, parse_tabular_file};
//! use cog_classifier::parsing::fasta::read_queries;
//! use cog_classifier::{ClassifierConfig, CogCatalog, QuerySequence};
//!
//! // Load the COG 2020 reference tables
//! let catalog = CogCatalog::load_from_dir(Path::new("data/cog")).unwrap();
//!
//! // Queries and their precomputed BLAST hits
//! let queries = read_queries(Path::new("proteins.faa")).unwrap();
//! let records: Vec<_> = queries.iter().map(QuerySequence::record).collect();
//! let hits = group_by_query(parse_tabular_file(Path::new("hits.tsv")).unwrap());
//!
//! let batch = classify_hits(&catalog, &records, hits, &ClassifierConfig::default()).unwrap();
//! print!("{}", export(&batch, ExportFormat::Tsv).unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: COG reference catalog loading, lookup, search and snapshots
//! - [`core`]: Core data types for hits, queries and results
//! - [`matching`]: Hit normalization, ranking and aggregation
//! - [`pipeline`]: Concurrent batch runner and aligners
//! - [`export`]: JSON, CSV and TSV output
//! - [`parsing`]: Parsers for COG tables, BLAST tabular output and FASTA
//! - [`config`]: Classifier configuration
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod export;
pub mod matching;
pub mod parsing;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::store::{CogCatalog, CogRecord};
pub use config::ClassifierConfig;
pub use core::hit::{NormalizedHit, RawHit};
pub use core::query::{QueryRecord, QuerySequence};
pub use core::result::{BatchResult, BatchSummary, ClassificationResult};
pub use core::types::*;
pub use pipeline::runner::{BatchRunner, CancelHandle};
