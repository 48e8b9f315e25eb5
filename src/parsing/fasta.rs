//! Reader for query FASTA files using noodles.
//!
//! Extracts sequence identifiers and residues from protein FASTA files.
//! Supports both uncompressed and gzip/bgzip compressed files.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.faa` (uncompressed)
//! - `.fa.gz`, `.fasta.gz`, `.faa.gz` (gzip compressed)
//! - `.fa.bgz`, `.fasta.bgz`, `.faa.bgz` (bgzip compressed)

use std::collections::HashSet;
use std::ffi::OsStr;
use std::io::BufRead;
use std::path::Path;

use noodles::fasta;

use crate::core::query::QuerySequence;
use crate::utils::validation::check_query_limit;

use super::{open_text, ParseError};

/// Check if the path has a FASTA extension
pub fn is_fasta_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();

    // Check for gzipped FASTA
    for ext in ["fa", "fasta", "faa"] {
        if path_str.ends_with(&format!(".{ext}.gz")) || path_str.ends_with(&format!(".{ext}.bgz")) {
            return true;
        }
    }

    // Check for uncompressed FASTA
    matches!(
        path.extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
            .as_deref(),
        Some("fa" | "fasta" | "faa")
    )
}

/// Read all query sequences from a FASTA file.
///
/// Identifiers are the first word of each header line. Residues are
/// upper-cased; they are not otherwise validated here (see
/// [`crate::utils::validation::validate_sequences`]).
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, or `ParseError::InvalidFormat` if no sequences are found, an
/// identifier repeats, or the query limit is exceeded.
pub fn read_queries(path: &Path) -> Result<Vec<QuerySequence>, ParseError> {
    let mut reader = fasta::io::Reader::new(open_text(path)?);
    read_queries_from(&mut reader)
}

/// Read query sequences from in-memory FASTA text
///
/// # Errors
///
/// See [`read_queries`].
pub fn read_queries_text(text: &str) -> Result<Vec<QuerySequence>, ParseError> {
    let mut reader = fasta::io::Reader::new(text.as_bytes());
    read_queries_from(&mut reader)
}

/// Parse from a noodles FASTA reader
fn read_queries_from<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
) -> Result<Vec<QuerySequence>, ParseError> {
    let mut queries = Vec::new();
    let mut seen = HashSet::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        if let Some(message) = check_query_limit(queries.len()) {
            return Err(ParseError::InvalidFormat(message));
        }

        let id = String::from_utf8_lossy(record.name()).to_string();
        if !seen.insert(id.clone()) {
            return Err(ParseError::InvalidFormat(format!(
                "Duplicate sequence id '{id}'"
            )));
        }

        let residues: String = record
            .sequence()
            .as_ref()
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .map(|b| char::from(b.to_ascii_uppercase()))
            .collect();

        queries.push(QuerySequence::new(id, residues));
    }

    if queries.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(queries)
}
