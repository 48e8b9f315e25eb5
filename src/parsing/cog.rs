//! Parsers for the NCBI COG 2020 reference tables.
//!
//! | File | Columns used |
//! |------|--------------|
//! | `fun-20.tab` | category code, [color,] category name (last column) |
//! | `cog-20.def.tab` | COG id, category codes, name, [gene, pathway, ...] |
//! | `cog-20.cog.csv` | protein id (column 3), COG id (column 7) |

use std::io::BufRead;

use crate::core::types::{CategoryCode, CogId};

use super::{is_skippable, lossy_lines, ParseError};

/// A row of the functional category table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDefinition {
    pub code: CategoryCode,
    pub name: String,
}

/// A row of the COG definition table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CogDefinition {
    pub id: CogId,
    pub categories: Vec<CategoryCode>,
    pub name: String,
    pub gene: Option<String>,
    pub pathway: Option<String>,
    pub line: usize,
}

/// A row of the protein-to-COG assignment table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CogAssignment {
    pub accession: String,
    pub cog_id: CogId,
    pub line: usize,
}

/// Zero-based column positions in the assignment CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentColumns {
    pub accession: usize,
    pub cog_id: usize,
}

impl Default for AssignmentColumns {
    /// COG 2020 layout: `gene_id,assembly_id,protein_id,protein_length,footprint,footprint_length,cog_id,...`
    fn default() -> Self {
        Self {
            accession: 2,
            cog_id: 6,
        }
    }
}

impl AssignmentColumns {
    #[must_use]
    pub fn min_columns(&self) -> usize {
        self.accession.max(self.cog_id) + 1
    }
}

fn optional_field(fields: &[&str], index: usize) -> Option<String> {
    fields
        .get(index)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != "-")
        .map(str::to_string)
}

/// Parse the functional category table (`fun-20.tab`).
///
/// # Errors
///
/// Returns `ParseError::TooFewColumns` for rows with fewer than two columns,
/// `ParseError::UnknownCategory` for codes outside the fixed set, or
/// `ParseError::Io` on read failure.
pub fn parse_categories<R: BufRead>(reader: R) -> Result<Vec<CategoryDefinition>, ParseError> {
    let mut categories = Vec::new();

    for (i, line) in lossy_lines(reader).enumerate() {
        let line = line?;
        if is_skippable(&line) {
            continue;
        }
        let line_num = i + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return Err(ParseError::TooFewColumns {
                line: line_num,
                expected: 2,
                found: fields.len(),
            });
        }

        let code_field = fields[0].trim();
        let mut chars = code_field.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(c), None) => CategoryCode::new(c)
                .ok_or(ParseError::UnknownCategory { line: line_num, code: c })?,
            _ => {
                return Err(ParseError::InvalidValue {
                    line: line_num,
                    field: "category code",
                    value: code_field.to_string(),
                })
            }
        };

        // 2020 release inserts a color column between code and name
        let name = fields[fields.len() - 1].trim();
        if name.is_empty() {
            return Err(ParseError::EmptyField {
                line: line_num,
                field: "category name",
            });
        }

        categories.push(CategoryDefinition {
            code,
            name: name.to_string(),
        });
    }

    Ok(categories)
}

/// Parse the COG definition table (`cog-20.def.tab`).
///
/// # Errors
///
/// Returns `ParseError::TooFewColumns` for rows with fewer than three columns,
/// `ParseError::EmptyField` for a missing COG id,
/// `ParseError::UnknownCategory` for category letters outside the fixed set, or
/// `ParseError::Io` on read failure.
pub fn parse_definitions<R: BufRead>(reader: R) -> Result<Vec<CogDefinition>, ParseError> {
    let mut definitions = Vec::new();

    for (i, line) in lossy_lines(reader).enumerate() {
        let line = line?;
        if is_skippable(&line) {
            continue;
        }
        let line_num = i + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(ParseError::TooFewColumns {
                line: line_num,
                expected: 3,
                found: fields.len(),
            });
        }

        let id = fields[0].trim();
        if id.is_empty() {
            return Err(ParseError::EmptyField {
                line: line_num,
                field: "COG id",
            });
        }

        let categories = CategoryCode::parse_run(fields[1])
            .map_err(|code| ParseError::UnknownCategory { line: line_num, code })?;

        definitions.push(CogDefinition {
            id: CogId::new(id),
            categories,
            name: fields[2].trim().to_string(),
            gene: optional_field(&fields, 3),
            pathway: optional_field(&fields, 4),
            line: line_num,
        });
    }

    Ok(definitions)
}

/// Parse the protein-to-COG assignment table (`cog-20.cog.csv`).
///
/// Rows whose COG column is empty or `-` are skipped, as is a leading header
/// row naming a `protein_id` column.
///
/// # Errors
///
/// Returns `ParseError::TooFewColumns` for short rows,
/// `ParseError::EmptyField` for a missing protein id, or `ParseError::Io`.
pub fn parse_assignments<R: BufRead>(
    reader: R,
    columns: AssignmentColumns,
) -> Result<Vec<CogAssignment>, ParseError> {
    let mut assignments = Vec::new();
    let mut first_data_line = true;
    let min_columns = columns.min_columns();

    for (i, line) in lossy_lines(reader).enumerate() {
        let line = line?;
        if is_skippable(&line) {
            continue;
        }

        // Check if first non-empty/non-comment line is a header
        if first_data_line {
            first_data_line = false;
            if line.to_lowercase().contains("protein_id") {
                continue;
            }
        }

        let line_num = i + 1;
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < min_columns {
            return Err(ParseError::TooFewColumns {
                line: line_num,
                expected: min_columns,
                found: fields.len(),
            });
        }

        let cog_id = fields[columns.cog_id].trim();
        if cog_id.is_empty() || cog_id == "-" {
            continue;
        }

        let accession = fields[columns.accession].trim();
        if accession.is_empty() {
            return Err(ParseError::EmptyField {
                line: line_num,
                field: "protein id",
            });
        }

        assignments.push(CogAssignment {
            accession: accession.to_string(),
            cog_id: CogId::new(cog_id),
            line: line_num,
        });
    }

    Ok(assignments)
}
