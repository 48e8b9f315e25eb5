//! Parsers for the files the classifier consumes.
//!
//! This module provides parsers for:
//!
//! - **COG reference tables**: `fun-20.tab`, `cog-20.def.tab` and `cog-20.cog.csv`
//!   from the NCBI COG 2020 release
//! - **BLAST tabular output**: `-outfmt 6` rows with the column set the blastp
//!   aligner requests
//! - **FASTA query files**: sequence identifiers, residues and lengths
//!
//! Any file whose name ends in `.gz` or `.bgz` is transparently decompressed.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cog_classifier::parsing::blast::parse_tabular_text;
//!
//! let line = "q1\tref|WP_000001.1|\t87.5\t420\t50\t2\t1\t420\t1\t420\t1e-50\t185.2\t99\n";
//! let hits = parse_tabular_text(line).unwrap();
//! assert_eq!(hits[0].bit_score, 185.2);
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use thiserror::Error;

pub mod blast;
pub mod cog;
pub mod fasta;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: expected at least {expected} columns, found {found}")]
    TooFewColumns {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: unknown COG category code '{code}'")]
    UnknownCategory { line: usize, code: char },

    #[error("Line {line}: invalid {field} '{value}'")]
    InvalidValue {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Line {line}: empty {field}")]
    EmptyField { line: usize, field: &'static str },

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Check if the path names a gzip or bgzip compressed file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Open a text file, decompressing it when the name says so
///
/// # Errors
///
/// Returns the underlying IO error if the file cannot be opened.
pub fn open_text(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Iterate the lines of a reader, replacing invalid UTF-8.
///
/// The COG definition table ships in Latin-1, so strict UTF-8 decoding
/// would fail on a handful of gene descriptions.
pub fn lossy_lines<R: BufRead>(reader: R) -> impl Iterator<Item = std::io::Result<String>> {
    reader.split(b'\n').map(|line| {
        line.map(|mut bytes| {
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            String::from_utf8_lossy(&bytes).into_owned()
        })
    })
}

/// True for lines that carry no data
fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}
