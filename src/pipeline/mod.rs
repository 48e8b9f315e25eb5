//! Concurrent batch classification.
//!
//! The [`runner::BatchRunner`] feeds query sequences to an
//! [`aligner::Aligner`] on a tokio runtime, normalizes the hits of each query
//! as soon as they arrive, and assembles the batch in input order.
//!
//! Two aligners are provided:
//!
//! - [`blastp::BlastpAligner`]: runs NCBI BLAST+ `blastp` per query
//! - [`aligner::PrecomputedHits`]: replays hits from an existing tabular file
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use cog_classifier::parsing::fasta::read_queries;
//! use cog_classifier::pipeline::blastp::{BlastOptions, BlastpAligner};
//! use cog_classifier::pipeline::runner::{BatchRunner, CancelHandle};
//! use cog_classifier::{ClassifierConfig, CogCatalog};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let catalog = Arc::new(CogCatalog::load_from_dir(Path::new("data/cog"))?);
//! let aligner = Arc::new(BlastpAligner::new(BlastOptions::new("data/cog/cog-20")));
//! let runner = BatchRunner::new(catalog, aligner, ClassifierConfig::default());
//!
//! let queries = read_queries(Path::new("proteins.faa"))?;
//! let batch = runner.run(queries, &CancelHandle::new()).await?;
//! println!("{} classified", batch.summary.classified);
//! # Ok(())
//! # }
//! ```

pub mod aligner;
pub mod blastp;
pub mod runner;

pub use aligner::{AlignFuture, Aligner, AlignerError, PrecomputedHits};
pub use runner::{BatchRunner, CancelHandle, PipelineError};
