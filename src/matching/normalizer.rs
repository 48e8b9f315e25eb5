use tracing::debug;

use crate::catalog::store::CogCatalog;
use crate::config::HitFilters;
use crate::core::hit::{NormalizedHit, RawHit};
use crate::core::result::{Diagnostic, DiagnosticKind};

/// At most this many accessions are named in a diagnostic message
const MAX_LISTED: usize = 5;

/// Output of [`normalize`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Hits that passed every threshold and resolved to a COG, in input order
    pub hits: Vec<NormalizedHit>,
    /// Passing hits whose accession is absent from the catalog
    pub unresolved: usize,
    /// Hits with unusable numeric fields
    pub rejected: usize,
    unresolved_accessions: Vec<String>,
    rejection_reasons: Vec<String>,
}

impl Normalized {
    /// Warnings for one query describing dropped hits
    #[must_use]
    pub fn diagnostics(&self, query_id: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if self.unresolved > 0 {
            diagnostics.push(Diagnostic::for_query(
                query_id,
                DiagnosticKind::UnresolvedAccession,
                format!(
                    "{} hit(s) reference accessions not in the COG catalog: {}",
                    self.unresolved,
                    summarize(&self.unresolved_accessions, self.unresolved)
                ),
            ));
        }
        if self.rejected > 0 {
            diagnostics.push(Diagnostic::for_query(
                query_id,
                DiagnosticKind::RejectedHit,
                format!(
                    "{} hit(s) rejected: {}",
                    self.rejected,
                    summarize(&self.rejection_reasons, self.rejected)
                ),
            ));
        }
        diagnostics
    }
}

fn summarize(items: &[String], total: usize) -> String {
    let mut text = items.join(", ");
    if total > items.len() {
        text.push_str(&format!(" and {} more", total - items.len()));
    }
    text
}

/// Filter raw hits and resolve them through the catalog.
///
/// Hits are checked in this order:
///
/// 1. Numeric fields must be usable (see [`RawHit::field_problem`]); failures
///    are counted in `rejected`.
/// 2. Thresholds from `filters` are applied, all inclusive. Hits outside them
///    are dropped silently.
/// 3. The subject accession is looked up; misses are counted in `unresolved`.
#[must_use]
pub fn normalize(raw_hits: Vec<RawHit>, catalog: &CogCatalog, filters: &HitFilters) -> Normalized {
    let mut out = Normalized::default();

    for raw in raw_hits {
        if let Some(problem) = raw.field_problem() {
            out.rejected += 1;
            if out.rejection_reasons.len() < MAX_LISTED {
                out.rejection_reasons
                    .push(format!("{}: {problem}", raw.subject_accession));
            }
            continue;
        }

        if !filters.accepts(raw.evalue, raw.percent_identity, raw.percent_coverage) {
            continue;
        }

        let Ok(record) = catalog.lookup(&raw.subject_accession) else {
            out.unresolved += 1;
            if out.unresolved_accessions.len() < MAX_LISTED {
                out.unresolved_accessions.push(raw.subject_accession);
            }
            continue;
        };

        out.hits.push(NormalizedHit {
            cog_id: record.id.clone(),
            cog_name: record.name.clone(),
            category_codes: record.categories.clone(),
            category_names: catalog.category_names(record),
            subject_accession: raw.subject_accession,
            evalue: raw.evalue,
            bit_score: raw.bit_score,
            percent_identity: raw.percent_identity,
            percent_coverage: raw.percent_coverage,
            alignment_length: raw.alignment_length,
        });
    }

    if out.unresolved > 0 || out.rejected > 0 {
        debug!(
            kept = out.hits.len(),
            unresolved = out.unresolved,
            rejected = out.rejected,
            "Normalized hits"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::test_support::sample_catalog;

    #[test]
    fn test_evalue_threshold_is_inclusive() {
        let catalog = sample_catalog();
        let filters = HitFilters::default();
        let hits = vec![
            RawHit::new("q1", "WP_000001.1", 1e-5, 50.0),
            RawHit::new("q1", "WP_000002.1", 1.0001e-5, 60.0),
        ];
        let out = normalize(hits, &catalog, &filters);
        assert_eq!(out.hits.len(), 1);
        assert_eq!(out.hits[0].subject_accession, "WP_000001.1");
        assert_eq!(out.unresolved, 0);
    }

    #[test]
    fn test_identity_and_coverage_thresholds() {
        let catalog = sample_catalog();
        let filters = HitFilters {
            max_evalue: 1e-5,
            min_identity: Some(40.0),
            min_coverage: Some(50.0),
        };
        let hits = vec![
            RawHit::new("q1", "WP_000001.1", 1e-20, 80.0)
                .with_identity(40.0)
                .with_coverage(50.0),
            RawHit::new("q1", "WP_000002.1", 1e-20, 90.0).with_identity(39.9),
            RawHit::new("q1", "WP_000003.1", 1e-20, 95.0).with_coverage(10.0),
        ];
        let out = normalize(hits, &catalog, &filters);
        assert_eq!(out.hits.len(), 1);
        assert_eq!(out.hits[0].subject_accession, "WP_000001.1");
    }

    #[test]
    fn test_unresolved_accessions_are_counted() {
        let catalog = sample_catalog();
        let hits = vec![
            RawHit::new("q1", "WP_999999.1", 1e-30, 100.0),
            RawHit::new("q1", "ref|WP_000002.1|", 1e-30, 90.0),
        ];
        let out = normalize(hits, &catalog, &HitFilters::default());
        assert_eq!(out.hits.len(), 1);
        assert_eq!(out.unresolved, 1);

        let diagnostics = out.diagnostics("q1");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedAccession);
        assert!(diagnostics[0].message.contains("WP_999999.1"));
    }

    #[test]
    fn test_invalid_fields_are_rejected_not_ranked() {
        let catalog = sample_catalog();
        let hits = vec![
            RawHit::new("q1", "WP_000001.1", f64::NAN, 100.0),
            RawHit::new("q1", "WP_000002.1", 1e-30, -5.0),
            RawHit::new("q1", "WP_000003.1", 1e-30, 50.0),
        ];
        let out = normalize(hits, &catalog, &HitFilters::default());
        assert_eq!(out.rejected, 2);
        assert_eq!(out.hits.len(), 1);
        assert_eq!(out.diagnostics("q1")[0].kind, DiagnosticKind::RejectedHit);
    }

    #[test]
    fn test_infinite_evalue_is_rejected_even_without_cutoff() {
        let catalog = sample_catalog();
        let filters = HitFilters {
            max_evalue: f64::MAX,
            min_identity: None,
            min_coverage: None,
        };
        let out = normalize(
            vec![RawHit::new("q1", "WP_000001.1", f64::INFINITY, 100.0)],
            &catalog,
            &filters,
        );
        assert!(out.hits.is_empty());
        assert_eq!(out.rejected, 1);
    }

    #[test]
    fn test_resolved_hit_carries_catalog_fields() {
        let catalog = sample_catalog();
        let out = normalize(
            vec![RawHit::new("q1", "WP_000002.1", 1e-30, 90.0)],
            &catalog,
            &HitFilters::default(),
        );
        let hit = &out.hits[0];
        assert_eq!(hit.cog_id.as_str(), "COG0745");
        assert_eq!(hit.category_string(), "TK");
        assert_eq!(
            hit.category_names,
            vec!["Signal transduction mechanisms", "Transcription"]
        );
    }

    #[test]
    fn test_empty_input() {
        let catalog = sample_catalog();
        let out = normalize(Vec::new(), &catalog, &HitFilters::default());
        assert!(out.hits.is_empty());
        assert!(out.diagnostics("q1").is_empty());
    }
}
