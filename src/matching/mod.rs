//! Hit normalization, ranking and result aggregation.
//!
//! This module provides the core classification pipeline:
//!
//! - [`normalizer`]: filters raw hits and resolves them through the catalog
//! - [`scoring`]: the total order used to rank hits
//! - [`engine`]: best-hit selection and status for one query
//! - [`aggregate`]: per-query results and batch summary in input order
//!
//! ## Ranking
//!
//! Hits are ordered by bit score (descending), then e-value (ascending), then
//! percent identity (descending), then subject accession (ascending). The
//! order is total, so the best hit never depends on the order the aligner
//! reported hits in.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::path::Path;
//!
//! use cog_classifier::matching::aggregate::classify_hits;
//! use cog_classifier::parsing::blast::{group_by_query, parse_tabular_file};
//! use cog_classifier::{ClassifierConfig, CogCatalog, QueryRecord};
//!
//! let catalog = CogCatalog::load_from_dir(Path::new("data/cog")).unwrap();
//! let hits = group_by_query(parse_tabular_file(Path::new("hits.tsv")).unwrap());
//! let queries = vec![QueryRecord::new("prot1", 312)];
//!
//! let batch = classify_hits(&catalog, &queries, hits, &ClassifierConfig::default()).unwrap();
//! for result in &batch.results {
//!     println!("{}: {}", result.sequence_id, result.status);
//! }
//! ```

pub mod aggregate;
pub mod engine;
pub mod normalizer;
pub mod scoring;

pub use aggregate::{aggregate, classify_hits, AggregationError, BatchAccumulator};
pub use engine::{select_best_and_ranked, Selection};
pub use normalizer::{normalize, Normalized};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::catalog::builder::CatalogBuilder;
    use crate::catalog::store::CogCatalog;
    use crate::core::hit::NormalizedHit;
    use crate::core::types::{CategoryCode, CogId};
    use crate::parsing::cog::{CogAssignment, CogDefinition};

    /// Three COGs with one protein each:
    /// `WP_000001.1` -> COG0001 (H), `WP_000002.1` -> COG0745 (TK),
    /// `WP_000003.1` -> COG0583 (K)
    pub fn sample_catalog() -> CogCatalog {
        let def = |id: &str, codes: &str, name: &str| CogDefinition {
            id: CogId::new(id),
            categories: CategoryCode::parse_run(codes).unwrap(),
            name: name.to_string(),
            gene: None,
            pathway: None,
            line: 1,
        };
        let assign = |acc: &str, cog: &str| CogAssignment {
            accession: acc.to_string(),
            cog_id: CogId::new(cog),
            line: 1,
        };
        CatalogBuilder::new()
            .with_definitions(vec![
                def("COG0001", "H", "Glutamate-1-semialdehyde aminotransferase"),
                def("COG0745", "TK", "DNA-binding response regulator, OmpR family"),
                def("COG0583", "K", "DNA-binding transcriptional regulator, LysR family"),
            ])
            .with_assignments(vec![
                assign("WP_000001.1", "COG0001"),
                assign("WP_000002.1", "COG0745"),
                assign("WP_000003.1", "COG0583"),
            ])
            .build()
            .unwrap()
    }

    /// A resolved hit to COG0001 with the given ranking keys
    pub fn hit(accession: &str, bit_score: f64, evalue: f64, identity: f64) -> NormalizedHit {
        NormalizedHit {
            subject_accession: accession.to_string(),
            cog_id: CogId::new("COG0001"),
            cog_name: "Glutamate-1-semialdehyde aminotransferase".to_string(),
            category_codes: vec![CategoryCode::new('H').unwrap()],
            category_names: vec!["Coenzyme transport and metabolism".to_string()],
            evalue,
            bit_score,
            percent_identity: identity,
            percent_coverage: 95.0,
            alignment_length: 300,
        }
    }
}
