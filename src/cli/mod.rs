//! Command-line interface for cog-classifier.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **classify**: Classify the proteins of a FASTA file
//! - **catalog**: Inspect, search or snapshot the COG reference catalog
//! - **export**: Convert saved JSON results to CSV or TSV
//! - **validate**: Report problems in a protein FASTA file
//! - **info**: Show aligner availability and catalog statistics
//!
//! ## Usage
//!
//! ```text
//! # Classify with a local BLAST database
//! cog-classifier classify proteins.faa --catalog-dir data/cog --blast-db data/cog/cog-20
//!
//! # Classify from hits computed elsewhere, writing TSV
//! cog-classifier classify proteins.faa --catalog-dir data/cog --hits hits.tsv \
//!     --output-format tsv -o results.tsv
//!
//! # Look up the COG of a protein
//! cog-classifier catalog lookup WP_000001.1 --catalog-dir data/cog
//!
//! # Convert saved results
//! cog-classifier export results.json --output-format csv -o results.csv
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::catalog::snapshot::load_snapshot;
use crate::catalog::store::{CatalogFiles, CogCatalog};
use crate::parsing::cog::AssignmentColumns;

pub mod catalog;
pub mod classify;
pub mod export;
pub mod info;
pub mod validate;

#[derive(Parser)]
#[command(name = "cog-classifier")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Classify protein sequences into NCBI COG functional categories")]
#[command(
    long_about = "cog-classifier assigns protein sequences to Clusters of Orthologous Groups (COGs).\n\nProteins are aligned against the COG reference proteins with blastp (or hits are read from a BLAST tabular file), hits are resolved through the COG 2020 reference tables, and each protein receives:\n- Its best-scoring COG and functional categories\n- A ranked list of supporting hits\n- A status: CLASSIFIED, AMBIGUOUS or NO_HIT"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for summaries and informational commands
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify the proteins of a FASTA file
    Classify(classify::ClassifyArgs),

    /// Inspect the COG reference catalog
    Catalog(catalog::CatalogArgs),

    /// Convert saved JSON results to another format
    Export(export::ExportArgs),

    /// Check a protein FASTA file for problems
    Validate(validate::ValidateArgs),

    /// Show aligner availability and catalog statistics
    Info(info::InfoArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Where to load the COG catalog from
#[derive(Args, Debug, Clone)]
pub struct CatalogSource {
    /// Directory with cog-20.cog.csv, cog-20.def.tab and optionally fun-20.tab (.gz accepted)
    #[arg(long, value_name = "DIR")]
    pub catalog_dir: Option<PathBuf>,

    /// Catalog snapshot written by `catalog snapshot`
    #[arg(long, value_name = "FILE", conflicts_with = "catalog_dir")]
    pub snapshot: Option<PathBuf>,

    /// 1-based column of the protein accession in the assignment table
    #[arg(long, default_value_t = 3)]
    pub accession_column: usize,

    /// 1-based column of the COG id in the assignment table
    #[arg(long, default_value_t = 7)]
    pub cog_column: usize,
}

impl CatalogSource {
    #[must_use]
    pub fn is_given(&self) -> bool {
        self.catalog_dir.is_some() || self.snapshot.is_some()
    }

    /// Load the catalog from whichever source was given
    ///
    /// # Errors
    ///
    /// Returns an error if no source was given or loading fails.
    pub fn load(&self) -> anyhow::Result<CogCatalog> {
        if let Some(path) = &self.snapshot {
            let (catalog, _info) = load_snapshot(path)
                .with_context(|| format!("Failed to load catalog snapshot {}", path.display()))?;
            return Ok(catalog);
        }

        let Some(dir) = &self.catalog_dir else {
            anyhow::bail!("A COG catalog is required: pass --catalog-dir or --snapshot");
        };
        if self.accession_column == 0 || self.cog_column == 0 {
            anyhow::bail!("Column numbers are 1-based");
        }

        let mut files = CatalogFiles::in_dir(dir);
        files.columns = AssignmentColumns {
            accession: self.accession_column - 1,
            cog_id: self.cog_column - 1,
        };
        CogCatalog::load(&files)
            .with_context(|| format!("Failed to load COG catalog from {}", dir.display()))
    }
}
