//! Serialization of a [`BatchResult`] to JSON, CSV or TSV.
//!
//! ## Formats
//!
//! - **json**: the full batch, `{"results", "summary", "diagnostics", "complete"}`
//! - **csv** / **tsv**: one row per query built from its best hit, with header
//!   `sequence_id,length,cog_id,cog_name,category,category_name,evalue,bit_score,identity,coverage,status`.
//!   A query without a best hit has empty hit columns and its status filled in.
//!
//! Format names are case-insensitive. Output is deterministic: the same batch
//! always serializes to the same bytes.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::core::result::BatchResult;

pub mod tabular;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format '{0}' (expected json, csv or tsv)")]
    UnsupportedFormat(String),

    #[error("Failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write results: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Tsv,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::Tsv => write!(f, "tsv"),
        }
    }
}

impl ExportFormat {
    /// Guess the format from a file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

/// Serialize a batch
///
/// # Errors
///
/// Returns `ExportError::Json` if JSON serialization fails.
pub fn export(batch: &BatchResult, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => {
            let mut text = serde_json::to_string_pretty(batch)?;
            text.push('\n');
            Ok(text)
        }
        ExportFormat::Csv => Ok(tabular::render(batch, ',')),
        ExportFormat::Tsv => Ok(tabular::render(batch, '\t')),
    }
}

/// Serialize a batch and write it to `path`.
///
/// The format is checked and the output fully rendered before the
/// filesystem is touched; the file is written to a temporary sibling and
/// renamed into place, so `path` never holds partial output.
///
/// # Errors
///
/// Returns `ExportError::UnsupportedFormat` for an unknown format name (no
/// file is created), or `ExportError::Io` if writing fails.
pub fn export_to_file(batch: &BatchResult, format: &str, path: &Path) -> Result<(), ExportError> {
    let format: ExportFormat = format.parse()?;
    let text = export(batch, format)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(text.as_bytes())?;
    temp.flush()?;
    temp.persist(path).map_err(|e| e.error)?;

    info!(
        "Wrote {} results as {} to {}",
        batch.len(),
        format,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::config::ClassifierConfig;
    use crate::core::hit::RawHit;
    use crate::core::query::QueryRecord;
    use crate::matching::aggregate::classify_hits;
    use crate::matching::test_support::sample_catalog;
    use tempfile::TempDir;

    fn sample_batch() -> BatchResult {
        let catalog = sample_catalog();
        let queries = vec![
            QueryRecord::new("prot1", 312),
            QueryRecord::new("prot2", 88),
            QueryRecord::new("prot3", 150),
        ];
        let mut hits = HashMap::new();
        hits.insert(
            "prot1".to_string(),
            vec![
                RawHit::new("prot1", "WP_000002.1", 1e-50, 185.2)
                    .with_identity(87.5)
                    .with_coverage(99.0)
                    .with_alignment_length(300),
                RawHit::new("prot1", "WP_000003.1", 2.5e-30, 120.0).with_identity(45.0),
            ],
        );
        hits.insert(
            "prot3".to_string(),
            vec![RawHit::new("prot3", "WP_000001.1", 0.0, 450.0)],
        );
        classify_hits(&catalog, &queries, hits, &ClassifierConfig::default()).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("Tsv".parse::<ExportFormat>().unwrap(), ExportFormat::Tsv);
        assert!(matches!(
            "xml".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(f)) if f == "xml"
        ));
        assert_eq!(
            ExportFormat::from_path(Path::new("out/results.tsv")),
            Some(ExportFormat::Tsv)
        );
    }

    #[test]
    fn test_json_shape() {
        let text = export(&sample_batch(), ExportFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["complete"], true);
        let first = &json["results"][0];
        assert_eq!(first["sequence_id"], "prot1");
        assert_eq!(first["length"], 312);
        assert_eq!(first["status"], "CLASSIFIED");
        assert_eq!(first["best_hit"]["cog_id"], "COG0745");
        assert_eq!(first["best_hit"]["category"], "TK");
        assert_eq!(first["all_hits"].as_array().unwrap().len(), 2);
        assert!(json["results"][1]["best_hit"].is_null());
        assert_eq!(json["summary"]["category_counts"]["K"], 1);
        assert_eq!(json["summary"]["no_hit"], 1);
    }

    #[test]
    fn test_json_round_trip_is_idempotent() {
        let batch = sample_batch();
        let first = export(&batch, ExportFormat::Json).unwrap();
        let parsed: BatchResult = serde_json::from_str(&first).unwrap();
        let second = export(&parsed, ExportFormat::Json).unwrap();
        assert_eq!(first, second);
        assert_eq!(parsed, batch);
    }

    #[test]
    fn test_csv_rows() {
        let text = export(&sample_batch(), ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "sequence_id,length,cog_id,cog_name,category,category_name,evalue,bit_score,identity,coverage,status"
        );
        assert_eq!(
            lines[1],
            "prot1,312,COG0745,\"DNA-binding response regulator, OmpR family\",TK,\
             Signal transduction mechanisms; Transcription,1e-50,185.2,87.5,99,CLASSIFIED"
        );
        assert_eq!(lines[2], "prot2,88,,,,,,,,,NO_HIT");
        assert!(lines[3].starts_with("prot3,150,COG0001,"));
        assert!(lines[3].contains(",0,450,"));
    }

    #[test]
    fn test_tsv_quotes_free_text_commas() {
        let text = export(&sample_batch(), ExportFormat::Tsv).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0].split('\t').count(), 11);
        let fields: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(fields[3], "\"DNA-binding response regulator, OmpR family\"");
        assert_eq!(fields[5], "Signal transduction mechanisms; Transcription");
        assert_eq!(lines[2], "prot2\t88\t\t\t\t\t\t\t\t\tNO_HIT");
    }

    #[test]
    fn test_export_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        export_to_file(&sample_batch(), "csv", &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("sequence_id,"));
    }

    #[test]
    fn test_unsupported_format_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.xml");
        let err = export_to_file(&sample_batch(), "xml", &path).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(_)));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
