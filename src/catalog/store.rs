use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::core::types::{CategoryCode, CogId};
use crate::parsing::cog::{parse_assignments, parse_categories, parse_definitions, AssignmentColumns};
use crate::parsing::{open_text, ParseError};

use super::builder::CatalogBuilder;
use super::categories::CategoryTable;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Missing {kind} file: {}", path.display())]
    MissingFile { kind: &'static str, path: PathBuf },

    #[error("Failed to parse {}: {source}", path.display())]
    ParseError {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("COG {cog_id} uses category '{code}' which is not in the category table")]
    MissingCategory { cog_id: CogId, code: CategoryCode },

    #[error("COG {cog_id} is defined more than once with different contents (line {line})")]
    ConflictingDefinition { cog_id: CogId, line: usize },

    #[error("Accession {accession} is assigned to undefined COG {cog_id} (line {line})")]
    UnknownCogId {
        accession: String,
        cog_id: CogId,
        line: usize,
    },

    #[error("Accession {accession} is assigned to both {first} and {second} (line {line})")]
    ConflictingAssignment {
        accession: String,
        first: CogId,
        second: CogId,
        line: usize,
    },

    #[error("Failed to read catalog snapshot: {0}")]
    SnapshotError(#[from] bincode::Error),

    #[error("Catalog snapshot version mismatch (expected {expected}, found {found})")]
    SnapshotVersion { expected: String, found: String },
}

/// An accession that is not in the catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Accession not found in COG catalog: {0}")]
    NotFound(String),
}

/// Default file names of the NCBI COG 2020 release
pub const ASSIGNMENTS_FILE: &str = "cog-20.cog.csv";
pub const DEFINITIONS_FILE: &str = "cog-20.def.tab";
pub const CATEGORIES_FILE: &str = "fun-20.tab";

/// Locations of the reference tables a catalog is built from
#[derive(Debug, Clone)]
pub struct CatalogFiles {
    pub assignments: PathBuf,
    pub definitions: PathBuf,
    /// Optional; the built-in category names are used when absent
    pub categories: Option<PathBuf>,
    pub columns: AssignmentColumns,
}

/// Prefer the plain file, fall back to a gzipped copy
fn resolve(dir: &Path, name: &str) -> PathBuf {
    let plain = dir.join(name);
    if plain.exists() {
        return plain;
    }
    let gz = dir.join(format!("{name}.gz"));
    if gz.exists() {
        gz
    } else {
        plain
    }
}

impl CatalogFiles {
    /// Locate the standard COG 2020 file names in a data directory
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        let categories = resolve(dir, CATEGORIES_FILE);
        Self {
            assignments: resolve(dir, ASSIGNMENTS_FILE),
            definitions: resolve(dir, DEFINITIONS_FILE),
            categories: categories.exists().then_some(categories),
            columns: AssignmentColumns::default(),
        }
    }
}

/// Definition of one COG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CogRecord {
    pub id: CogId,
    pub name: String,
    /// Functional categories, in the order the definition table lists them
    pub categories: Vec<CategoryCode>,
    pub gene: Option<String>,
    pub pathway: Option<String>,
}

/// Summary counts for a loaded catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStatistics {
    pub total_cogs: usize,
    pub total_proteins: usize,
    pub functional_categories: usize,
    /// Number of COGs per category code
    pub category_distribution: BTreeMap<CategoryCode, usize>,
}

/// The COG reference catalog with indexes.
///
/// Immutable once built; share it across threads with `Arc`.
#[derive(Debug)]
pub struct CogCatalog {
    /// Index: protein accession -> COG id
    accession_to_cog: HashMap<String, CogId>,

    /// Index: COG id -> definition
    cogs: HashMap<CogId, CogRecord>,

    /// Category code -> name
    categories: CategoryTable,
}

/// Candidate spellings of an accession, most specific first.
///
/// BLAST may report `ref|WP_000001.1|` where the assignment table has
/// `WP_000001.1`, and some tables drop the version suffix.
fn accession_candidates(accession: &str) -> Vec<&str> {
    let mut candidates = vec![accession];
    let last_segment = accession
        .rsplit('|')
        .find(|s| !s.is_empty())
        .unwrap_or(accession);
    if last_segment != accession {
        candidates.push(last_segment);
    }
    if let Some((base, version)) = last_segment.rsplit_once('.') {
        if !base.is_empty() && !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()) {
            candidates.push(base);
        }
    }
    candidates
}

impl CogCatalog {
    pub(crate) fn from_indexes(
        accession_to_cog: HashMap<String, CogId>,
        cogs: HashMap<CogId, CogRecord>,
        categories: CategoryTable,
    ) -> Self {
        Self {
            accession_to_cog,
            cogs,
            categories,
        }
    }

    /// Load and cross-check the COG reference tables.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::MissingFile` if a required file does not exist,
    /// `CatalogError::ParseError` for malformed rows, or any of the consistency
    /// errors described on [`CatalogBuilder::build`].
    pub fn load(files: &CatalogFiles) -> Result<Self, CatalogError> {
        let mut builder = CatalogBuilder::new();

        if let Some(path) = &files.categories {
            let reader = open_required(path, "functional categories")?;
            let categories = parse_categories(reader).map_err(|source| CatalogError::ParseError {
                path: path.clone(),
                source,
            })?;
            builder = builder.with_categories(CategoryTable::from_definitions(categories));
        }

        let reader = open_required(&files.definitions, "COG definitions")?;
        let definitions = parse_definitions(reader).map_err(|source| CatalogError::ParseError {
            path: files.definitions.clone(),
            source,
        })?;

        let reader = open_required(&files.assignments, "COG assignments")?;
        let assignments =
            parse_assignments(reader, files.columns).map_err(|source| CatalogError::ParseError {
                path: files.assignments.clone(),
                source,
            })?;

        let catalog = builder
            .with_definitions(definitions)
            .with_assignments(assignments)
            .build()?;

        info!(
            "Loaded COG catalog: {} COGs, {} protein assignments",
            catalog.num_cogs(),
            catalog.num_accessions()
        );
        Ok(catalog)
    }

    /// Load from the standard file names in a directory
    ///
    /// # Errors
    ///
    /// See [`CogCatalog::load`].
    pub fn load_from_dir(dir: &Path) -> Result<Self, CatalogError> {
        Self::load(&CatalogFiles::in_dir(dir))
    }

    /// Resolve a subject accession to its COG definition
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotFound` if no spelling of the accession is assigned.
    pub fn lookup(&self, accession: &str) -> Result<&CogRecord, LookupError> {
        accession_candidates(accession)
            .into_iter()
            .find_map(|candidate| self.accession_to_cog.get(candidate))
            .and_then(|cog_id| self.cogs.get(cog_id))
            .ok_or_else(|| LookupError::NotFound(accession.to_string()))
    }

    /// Get a COG definition by id
    pub fn get(&self, cog_id: &CogId) -> Option<&CogRecord> {
        self.cogs.get(cog_id)
    }

    #[must_use]
    pub fn category_name(&self, code: CategoryCode) -> Option<&str> {
        self.categories.name(code)
    }

    /// Names of a COG's categories, in the same order as its codes
    #[must_use]
    pub fn category_names(&self, record: &CogRecord) -> Vec<String> {
        record
            .categories
            .iter()
            .filter_map(|code| self.categories.name(*code))
            .map(str::to_string)
            .collect()
    }

    #[must_use]
    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    /// All COG definitions, in arbitrary order
    pub fn cogs(&self) -> impl Iterator<Item = &CogRecord> {
        self.cogs.values()
    }

    /// All accession assignments, in arbitrary order
    pub fn assignments(&self) -> impl Iterator<Item = (&str, &CogId)> {
        self.accession_to_cog.iter().map(|(acc, cog)| (acc.as_str(), cog))
    }

    #[must_use]
    pub fn num_cogs(&self) -> usize {
        self.cogs.len()
    }

    #[must_use]
    pub fn num_accessions(&self) -> usize {
        self.accession_to_cog.len()
    }

    #[must_use]
    pub fn statistics(&self) -> CatalogStatistics {
        let mut category_distribution = BTreeMap::new();
        for record in self.cogs.values() {
            for code in &record.categories {
                *category_distribution.entry(*code).or_default() += 1;
            }
        }
        CatalogStatistics {
            total_cogs: self.cogs.len(),
            total_proteins: self.accession_to_cog.len(),
            functional_categories: self.categories.len(),
            category_distribution,
        }
    }
}

fn open_required(
    path: &Path,
    kind: &'static str,
) -> Result<Box<dyn std::io::BufRead>, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::MissingFile {
            kind,
            path: path.to_path_buf(),
        });
    }
    Ok(open_text(path)?)
}
