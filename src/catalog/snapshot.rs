//! Binary snapshots of a loaded catalog.
//!
//! Parsing the full COG 2020 tables takes a few seconds; a snapshot stores the
//! validated indexes with `bincode` so later runs can skip the text parsers.
//! Loading a snapshot re-runs the same consistency checks as loading text.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bincode::Options;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::core::types::CogId;
use crate::parsing::cog::{CogAssignment, CogDefinition};

use super::builder::CatalogBuilder;
use super::categories::CategoryTable;
use super::store::{CatalogError, CogCatalog, CogRecord};

/// Written ahead of the payload; bumped whenever the layout changes
pub const SNAPSHOT_VERSION: &str = "cog-catalog-snapshot/1";

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotData {
    created_at: DateTime<Utc>,
    categories: CategoryTable,
    cogs: Vec<CogRecord>,
    assignments: Vec<(String, CogId)>,
}

/// Metadata of a snapshot on disk
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub created_at: DateTime<Utc>,
    pub num_cogs: usize,
    pub num_accessions: usize,
}

/// Write a catalog snapshot. The file appears only once fully written.
///
/// # Errors
///
/// Returns `CatalogError::ReadError` on IO failure or
/// `CatalogError::SnapshotError` if encoding fails.
pub fn save_snapshot(catalog: &CogCatalog, path: &Path) -> Result<SnapshotInfo, CatalogError> {
    let mut cogs: Vec<CogRecord> = catalog.cogs().cloned().collect();
    cogs.sort_by(|a, b| a.id.cmp(&b.id));
    let mut assignments: Vec<(String, CogId)> = catalog
        .assignments()
        .map(|(acc, cog)| (acc.to_string(), cog.clone()))
        .collect();
    assignments.sort();

    let data = SnapshotData {
        created_at: Utc::now(),
        categories: catalog.categories().clone(),
        cogs,
        assignments,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        bincode::serialize_into(&mut writer, SNAPSHOT_VERSION)?;
        bincode::serialize_into(&mut writer, &data)?;
        writer.flush()?;
    }
    temp.persist(path).map_err(|e| e.error)?;

    info!(
        "Wrote catalog snapshot with {} COGs to {}",
        data.cogs.len(),
        path.display()
    );
    Ok(SnapshotInfo {
        created_at: data.created_at,
        num_cogs: data.cogs.len(),
        num_accessions: data.assignments.len(),
    })
}

/// Load a catalog snapshot written by [`save_snapshot`]
///
/// # Errors
///
/// Returns `CatalogError::SnapshotVersion` for snapshots from another layout,
/// `CatalogError::SnapshotError` for corrupt data, or the builder's
/// consistency errors.
pub fn load_snapshot(path: &Path) -> Result<(CogCatalog, SnapshotInfo), CatalogError> {
    let file = File::open(path)?;
    // No length prefix in the file may claim more bytes than the file holds
    let options = bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(file.metadata()?.len());
    let mut reader = BufReader::new(file);

    let version: String = options.deserialize_from(&mut reader)?;
    if version != SNAPSHOT_VERSION {
        return Err(CatalogError::SnapshotVersion {
            expected: SNAPSHOT_VERSION.to_string(),
            found: version,
        });
    }
    let data: SnapshotData = options.deserialize_from(&mut reader)?;

    let info = SnapshotInfo {
        created_at: data.created_at,
        num_cogs: data.cogs.len(),
        num_accessions: data.assignments.len(),
    };

    let definitions = data
        .cogs
        .into_iter()
        .enumerate()
        .map(|(i, record)| CogDefinition {
            id: record.id,
            categories: record.categories,
            name: record.name,
            gene: record.gene,
            pathway: record.pathway,
            line: i + 1,
        })
        .collect();
    let assignments = data
        .assignments
        .into_iter()
        .enumerate()
        .map(|(i, (accession, cog_id))| CogAssignment {
            accession,
            cog_id,
            line: i + 1,
        })
        .collect();

    let catalog = CatalogBuilder::new()
        .with_categories(data.categories)
        .with_definitions(definitions)
        .with_assignments(assignments)
        .build()?;

    info!(
        "Loaded catalog snapshot from {} (created {})",
        path.display(),
        info.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok((catalog, info))
}
