//! Catalog builder that cross-checks the three COG reference tables.
//!
//! The `CatalogBuilder` collects category names, COG definitions and
//! protein-to-COG assignments (from files, snapshots or test fixtures) and
//! produces a `CogCatalog` only when every cross-reference resolves.

use std::collections::HashMap;

use tracing::debug;

use crate::core::types::CogId;
use crate::parsing::cog::{CogAssignment, CogDefinition};

use super::categories::CategoryTable;
use super::store::{CatalogError, CogCatalog, CogRecord};

/// Collects reference tables and validates them into a [`CogCatalog`]
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    categories: Option<CategoryTable>,
    definitions: Vec<CogDefinition>,
    assignments: Vec<CogAssignment>,
}

impl CatalogBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit category table instead of the built-in one
    #[must_use]
    pub fn with_categories(mut self, categories: CategoryTable) -> Self {
        self.categories = Some(categories);
        self
    }

    #[must_use]
    pub fn with_definitions(mut self, definitions: Vec<CogDefinition>) -> Self {
        self.definitions.extend(definitions);
        self
    }

    #[must_use]
    pub fn with_assignments(mut self, assignments: Vec<CogAssignment>) -> Self {
        self.assignments.extend(assignments);
        self
    }

    /// Validate and index the collected tables.
    ///
    /// # Errors
    ///
    /// - `CatalogError::ConflictingDefinition` if a COG id is defined twice differently
    /// - `CatalogError::MissingCategory` if a COG uses a code absent from the category table
    /// - `CatalogError::UnknownCogId` if an accession maps to an undefined COG
    /// - `CatalogError::ConflictingAssignment` if an accession maps to two different COGs
    pub fn build(self) -> Result<CogCatalog, CatalogError> {
        let categories = self.categories.unwrap_or_default();

        let mut cogs: HashMap<CogId, CogRecord> = HashMap::with_capacity(self.definitions.len());
        for def in self.definitions {
            if let Some(code) = def.categories.iter().find(|c| !categories.contains(**c)) {
                return Err(CatalogError::MissingCategory {
                    cog_id: def.id,
                    code: *code,
                });
            }

            let record = CogRecord {
                id: def.id.clone(),
                name: def.name,
                categories: def.categories,
                gene: def.gene,
                pathway: def.pathway,
            };

            match cogs.get(&def.id) {
                Some(existing) if *existing == record => {}
                Some(_) => {
                    return Err(CatalogError::ConflictingDefinition {
                        cog_id: def.id,
                        line: def.line,
                    })
                }
                None => {
                    cogs.insert(def.id, record);
                }
            }
        }

        let mut accession_to_cog: HashMap<String, CogId> =
            HashMap::with_capacity(self.assignments.len());
        for assignment in self.assignments {
            if !cogs.contains_key(&assignment.cog_id) {
                return Err(CatalogError::UnknownCogId {
                    accession: assignment.accession,
                    cog_id: assignment.cog_id,
                    line: assignment.line,
                });
            }

            match accession_to_cog.get(&assignment.accession) {
                Some(existing) if *existing == assignment.cog_id => {}
                Some(existing) => {
                    return Err(CatalogError::ConflictingAssignment {
                        accession: assignment.accession,
                        first: existing.clone(),
                        second: assignment.cog_id,
                        line: assignment.line,
                    })
                }
                None => {
                    accession_to_cog.insert(assignment.accession, assignment.cog_id);
                }
            }
        }

        debug!(
            cogs = cogs.len(),
            accessions = accession_to_cog.len(),
            categories = categories.len(),
            "Built COG catalog"
        );

        Ok(CogCatalog::from_indexes(accession_to_cog, cogs, categories))
    }
}
