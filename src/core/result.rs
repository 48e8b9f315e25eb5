use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::core::hit::NormalizedHit;
use crate::core::types::{CategoryCode, ClassificationStatus};

/// Number of COGs listed in [`BatchSummary::top_cogs`]
pub const TOP_COG_LIMIT: usize = 20;

/// Kind of a non-fatal condition recorded during a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A hit referenced an accession absent from the catalog
    UnresolvedAccession,
    /// A hit carried unusable numeric fields
    RejectedHit,
    /// The aligner exceeded the per-query time budget
    Timeout,
    /// The aligner failed for this query
    AlignerFailure,
    /// The batch was cancelled before this query finished
    Cancelled,
    /// The query sequence had no residues
    EmptySequence,
}

/// A non-fatal condition, optionally tied to one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn for_query(
        query_id: impl Into<String>,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            query_id: Some(query_id.into()),
            kind,
            message: message.into(),
        }
    }
}

/// Classification of a single query sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub sequence_id: String,
    #[serde(rename = "length")]
    pub sequence_length: u64,
    pub best_hit: Option<NormalizedHit>,
    pub all_hits: Vec<NormalizedHit>,
    pub status: ClassificationStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ClassificationResult {
    /// A result with no qualifying hit
    pub fn no_hit(sequence_id: impl Into<String>, sequence_length: u64) -> Self {
        Self {
            sequence_id: sequence_id.into(),
            sequence_length,
            best_hit: None,
            all_hits: Vec::new(),
            status: ClassificationStatus::NoHit,
            diagnostics: Vec::new(),
        }
    }

    #[must_use]
    pub fn has_diagnostic(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }
}

/// Occurrences of one COG among best hits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CogCount {
    pub cog_id: String,
    pub count: usize,
}

/// Best-hit e-values bucketed by significance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalueDistribution {
    #[serde(rename = "1e-10")]
    pub le_1e_10: usize,
    #[serde(rename = "1e-5")]
    pub le_1e_5: usize,
    #[serde(rename = "1e-3")]
    pub le_1e_3: usize,
    #[serde(rename = "0.01")]
    pub le_0_01: usize,
    pub other: usize,
}

impl EvalueDistribution {
    pub fn record(&mut self, evalue: f64) {
        if evalue <= 1e-10 {
            self.le_1e_10 += 1;
        } else if evalue <= 1e-5 {
            self.le_1e_5 += 1;
        } else if evalue <= 1e-3 {
            self.le_1e_3 += 1;
        } else if evalue <= 0.01 {
            self.le_0_01 += 1;
        } else {
            self.other += 1;
        }
    }
}

/// Batch-wide counters that do not belong to a single result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounters {
    pub unresolved_hits: usize,
    pub rejected_hits: usize,
}

/// Summary statistics over a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_queries: usize,
    pub classified: usize,
    pub no_hit: usize,
    pub ambiguous: usize,
    /// Queries whose best hit lists each category; multi-category hits count once per category
    pub category_counts: BTreeMap<CategoryCode, usize>,
    pub unresolved_hits: usize,
    pub rejected_hits: usize,
    pub timed_out: usize,
    pub aligner_failures: usize,
    pub cancelled: usize,
    pub empty_sequences: usize,
    /// Percentage of queries with a best hit
    pub classification_rate: f64,
    pub top_cogs: Vec<CogCount>,
    pub evalue_distribution: EvalueDistribution,
}

impl BatchSummary {
    /// Tally a finished set of results
    #[must_use]
    pub fn from_results(results: &[ClassificationResult], counters: BatchCounters) -> Self {
        let mut summary = Self {
            total_queries: results.len(),
            unresolved_hits: counters.unresolved_hits,
            rejected_hits: counters.rejected_hits,
            ..Self::default()
        };
        let mut cog_counts: HashMap<&str, usize> = HashMap::new();

        for result in results {
            match result.status {
                ClassificationStatus::Classified => summary.classified += 1,
                ClassificationStatus::NoHit => summary.no_hit += 1,
                ClassificationStatus::Ambiguous => summary.ambiguous += 1,
            }

            for diagnostic in &result.diagnostics {
                match diagnostic.kind {
                    DiagnosticKind::Timeout => summary.timed_out += 1,
                    DiagnosticKind::AlignerFailure => summary.aligner_failures += 1,
                    DiagnosticKind::Cancelled => summary.cancelled += 1,
                    DiagnosticKind::EmptySequence => summary.empty_sequences += 1,
                    DiagnosticKind::UnresolvedAccession | DiagnosticKind::RejectedHit => {}
                }
            }

            if let Some(hit) = &result.best_hit {
                for code in &hit.category_codes {
                    *summary.category_counts.entry(*code).or_default() += 1;
                }
                *cog_counts.entry(hit.cog_id.as_str()).or_default() += 1;
                summary.evalue_distribution.record(hit.evalue);
            }
        }

        let with_hit = summary.classified + summary.ambiguous;
        summary.classification_rate = if results.is_empty() {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                with_hit as f64 / results.len() as f64 * 100.0
            }
        };

        let mut top: Vec<CogCount> = cog_counts
            .into_iter()
            .map(|(cog_id, count)| CogCount {
                cog_id: cog_id.to_string(),
                count,
            })
            .collect();
        top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.cog_id.cmp(&b.cog_id)));
        top.truncate(TOP_COG_LIMIT);
        summary.top_cogs = top;

        summary
    }
}

/// Results of one classification run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// One entry per input query, in input order
    pub results: Vec<ClassificationResult>,
    pub summary: BatchSummary,
    /// Batch-level diagnostics, including copies of per-query ones
    pub diagnostics: Vec<Diagnostic>,
    /// False when the run was cancelled and unfinished queries were filled in as NO_HIT
    pub complete: bool,
}

impl BatchResult {
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Find the result for a query id
    #[must_use]
    pub fn get(&self, sequence_id: &str) -> Option<&ClassificationResult> {
        self.results.iter().find(|r| r.sequence_id == sequence_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CogId;

    fn hit(cog: &str, codes: &str, evalue: f64) -> NormalizedHit {
        NormalizedHit {
            subject_accession: format!("{cog}_protein"),
            cog_id: CogId::new(cog),
            cog_name: "test".to_string(),
            category_codes: CategoryCode::parse_run(codes).unwrap(),
            category_names: codes.chars().map(|c| c.to_string()).collect(),
            evalue,
            bit_score: 100.0,
            percent_identity: 90.0,
            percent_coverage: 90.0,
            alignment_length: 100,
        }
    }

    fn classified(id: &str, hit: NormalizedHit) -> ClassificationResult {
        ClassificationResult {
            sequence_id: id.to_string(),
            sequence_length: 100,
            best_hit: Some(hit.clone()),
            all_hits: vec![hit],
            status: ClassificationStatus::Classified,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_summary_counts_multi_category_hits_per_category() {
        let results = vec![
            classified("q1", hit("COG0001", "KT", 1e-20)),
            classified("q2", hit("COG0002", "K", 1e-7)),
            ClassificationResult::no_hit("q3", 50),
        ];

        let summary = BatchSummary::from_results(&results, BatchCounters::default());
        assert_eq!(summary.total_queries, 3);
        assert_eq!(summary.classified, 2);
        assert_eq!(summary.no_hit, 1);
        assert_eq!(summary.category_counts[&CategoryCode::new('K').unwrap()], 2);
        assert_eq!(summary.category_counts[&CategoryCode::new('T').unwrap()], 1);
        assert_eq!(summary.evalue_distribution.le_1e_10, 1);
        assert_eq!(summary.evalue_distribution.le_1e_5, 1);
        assert!((summary.classification_rate - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_cogs_ordered_by_count_then_id() {
        let results = vec![
            classified("q1", hit("COG0002", "K", 1e-20)),
            classified("q2", hit("COG0001", "K", 1e-20)),
            classified("q3", hit("COG0002", "K", 1e-20)),
        ];
        let summary = BatchSummary::from_results(&results, BatchCounters::default());
        assert_eq!(summary.top_cogs[0].cog_id, "COG0002");
        assert_eq!(summary.top_cogs[0].count, 2);
        assert_eq!(summary.top_cogs[1].cog_id, "COG0001");
    }

    #[test]
    fn test_summary_counts_diagnostics() {
        let mut timed_out = ClassificationResult::no_hit("q1", 10);
        timed_out.diagnostics.push(Diagnostic::for_query(
            "q1",
            DiagnosticKind::Timeout,
            "aligner exceeded 1s",
        ));
        let summary = BatchSummary::from_results(
            &[timed_out],
            BatchCounters {
                unresolved_hits: 3,
                rejected_hits: 1,
            },
        );
        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.no_hit, 1);
        assert_eq!(summary.unresolved_hits, 3);
        assert_eq!(summary.rejected_hits, 1);
    }
}
