//! Parser for BLAST tabular output.
//!
//! The blastp aligner is run with
//! `-outfmt "6 qseqid sseqid pident length mismatch gapopen qstart qend sstart send evalue bitscore qcovs"`,
//! so each data line carries 13 tab-separated columns. Only the columns the
//! classifier needs are kept.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::core::hit::RawHit;

use super::{is_skippable, lossy_lines, open_text, ParseError};

/// The output columns requested from blastp
pub const OUTFMT_COLUMNS: &str =
    "qseqid sseqid pident length mismatch gapopen qstart qend sstart send evalue bitscore qcovs";

const NUM_COLUMNS: usize = 13;
const COL_QUERY: usize = 0;
const COL_SUBJECT: usize = 1;
const COL_IDENTITY: usize = 2;
const COL_LENGTH: usize = 3;
const COL_EVALUE: usize = 10;
const COL_BITSCORE: usize = 11;
const COL_COVERAGE: usize = 12;

fn parse_f64(fields: &[&str], index: usize, field: &'static str, line: usize) -> Result<f64, ParseError> {
    let raw = fields[index].trim();
    raw.parse().map_err(|_| ParseError::InvalidValue {
        line,
        field,
        value: raw.to_string(),
    })
}

/// Parse one data line. `line` is 1-based and only used for errors.
///
/// # Errors
///
/// Returns `ParseError::TooFewColumns` or `ParseError::InvalidValue`.
pub fn parse_tabular_line(text: &str, line: usize) -> Result<RawHit, ParseError> {
    let fields: Vec<&str> = text.split('\t').collect();
    if fields.len() < NUM_COLUMNS {
        return Err(ParseError::TooFewColumns {
            line,
            expected: NUM_COLUMNS,
            found: fields.len(),
        });
    }

    let alignment_length_raw = fields[COL_LENGTH].trim();
    let alignment_length: u32 =
        alignment_length_raw
            .parse()
            .map_err(|_| ParseError::InvalidValue {
                line,
                field: "alignment length",
                value: alignment_length_raw.to_string(),
            })?;

    Ok(RawHit {
        query_id: fields[COL_QUERY].trim().to_string(),
        subject_accession: fields[COL_SUBJECT].trim().to_string(),
        evalue: parse_f64(&fields, COL_EVALUE, "e-value", line)?,
        bit_score: parse_f64(&fields, COL_BITSCORE, "bit score", line)?,
        percent_identity: parse_f64(&fields, COL_IDENTITY, "percent identity", line)?,
        percent_coverage: parse_f64(&fields, COL_COVERAGE, "query coverage", line)?,
        alignment_length,
    })
}

/// Parse BLAST tabular output from a reader, skipping comment lines
///
/// # Errors
///
/// Returns the first malformed line's error, or `ParseError::Io`.
pub fn parse_tabular<R: BufRead>(reader: R) -> Result<Vec<RawHit>, ParseError> {
    let mut hits = Vec::new();
    for (i, line) in lossy_lines(reader).enumerate() {
        let line = line?;
        if is_skippable(&line) {
            continue;
        }
        hits.push(parse_tabular_line(&line, i + 1)?);
    }
    Ok(hits)
}

/// Parse BLAST tabular output held in memory
///
/// # Errors
///
/// See [`parse_tabular`].
pub fn parse_tabular_text(text: &str) -> Result<Vec<RawHit>, ParseError> {
    parse_tabular(text.as_bytes())
}

/// Parse a BLAST tabular file (optionally gzipped)
///
/// # Errors
///
/// See [`parse_tabular`].
pub fn parse_tabular_file(path: &Path) -> Result<Vec<RawHit>, ParseError> {
    parse_tabular(open_text(path)?)
}

/// Group hits by query id, preserving the aligner's order within each query
#[must_use]
pub fn group_by_query(hits: Vec<RawHit>) -> HashMap<String, Vec<RawHit>> {
    let mut grouped: HashMap<String, Vec<RawHit>> = HashMap::new();
    for hit in hits {
        grouped.entry(hit.query_id.clone()).or_default().push(hit);
    }
    grouped
}
