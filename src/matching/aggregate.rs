//! Assembly of per-query results into a [`BatchResult`].

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::store::CogCatalog;
use crate::config::{ClassifierConfig, RankingConfig};
use crate::core::hit::{NormalizedHit, RawHit};
use crate::core::query::QueryRecord;
use crate::core::result::{
    BatchCounters, BatchResult, BatchSummary, ClassificationResult, Diagnostic, DiagnosticKind,
};

use super::engine::select_best_and_ranked;
use super::normalizer::{normalize, Normalized};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    #[error("Hits reference query '{0}' which is not among the input sequences")]
    UnknownQuery(String),

    #[error("Query id '{0}' appears more than once in the input")]
    DuplicateQuery(String),

    #[error("Result index {index} is out of range for {len} queries")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Collects per-query outcomes in any order and emits them in input order
#[derive(Debug)]
pub struct BatchAccumulator {
    queries: Vec<QueryRecord>,
    positions: HashMap<String, usize>,
    slots: Vec<Option<ClassificationResult>>,
    counters: BatchCounters,
    batch_diagnostics: Vec<Diagnostic>,
    ranking: RankingConfig,
    complete: bool,
}

impl BatchAccumulator {
    /// # Errors
    ///
    /// Returns `AggregationError::DuplicateQuery` if two queries share an id.
    pub fn new(queries: &[QueryRecord], ranking: RankingConfig) -> Result<Self, AggregationError> {
        let mut positions = HashMap::with_capacity(queries.len());
        for (i, query) in queries.iter().enumerate() {
            if positions.insert(query.id.clone(), i).is_some() {
                return Err(AggregationError::DuplicateQuery(query.id.clone()));
            }
        }
        Ok(Self {
            queries: queries.to_vec(),
            positions,
            slots: vec![None; queries.len()],
            counters: BatchCounters::default(),
            batch_diagnostics: Vec::new(),
            ranking,
            complete: true,
        })
    }

    /// Input index of a query id
    ///
    /// # Errors
    ///
    /// Returns `AggregationError::UnknownQuery` for ids not in the input.
    pub fn position(&self, query_id: &str) -> Result<usize, AggregationError> {
        self.positions
            .get(query_id)
            .copied()
            .ok_or_else(|| AggregationError::UnknownQuery(query_id.to_string()))
    }

    fn check_index(&self, index: usize) -> Result<(), AggregationError> {
        if index < self.queries.len() {
            Ok(())
        } else {
            Err(AggregationError::IndexOutOfRange {
                index,
                len: self.queries.len(),
            })
        }
    }

    /// Record already-normalized hits for the query at `index`
    ///
    /// # Errors
    ///
    /// Returns `AggregationError::IndexOutOfRange` for a bad index.
    pub fn add_hits(&mut self, index: usize, hits: Vec<NormalizedHit>) -> Result<(), AggregationError> {
        self.check_index(index)?;
        let selection = select_best_and_ranked(hits, &self.ranking);
        let query = &self.queries[index];
        self.slots[index] = Some(ClassificationResult {
            sequence_id: query.id.clone(),
            sequence_length: query.length,
            best_hit: selection.best_hit,
            all_hits: selection.ranked,
            status: selection.status,
            diagnostics: Vec::new(),
        });
        Ok(())
    }

    /// Record the normalizer's output for the query at `index`, keeping its
    /// counters and warnings
    ///
    /// # Errors
    ///
    /// Returns `AggregationError::IndexOutOfRange` for a bad index.
    pub fn add_normalized(&mut self, index: usize, normalized: Normalized) -> Result<(), AggregationError> {
        self.check_index(index)?;
        let diagnostics = normalized.diagnostics(&self.queries[index].id);
        self.counters.unresolved_hits += normalized.unresolved;
        self.counters.rejected_hits += normalized.rejected;
        self.add_hits(index, normalized.hits)?;
        if let Some(result) = self.slots[index].as_mut() {
            result.diagnostics.extend(diagnostics);
        }
        Ok(())
    }

    /// Record a NO_HIT outcome caused by a per-query failure
    ///
    /// # Errors
    ///
    /// Returns `AggregationError::IndexOutOfRange` for a bad index.
    pub fn add_failure(
        &mut self,
        index: usize,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Result<(), AggregationError> {
        self.check_index(index)?;
        let query = &self.queries[index];
        let mut result = ClassificationResult::no_hit(query.id.clone(), query.length);
        result
            .diagnostics
            .push(Diagnostic::for_query(query.id.clone(), kind, message));
        self.slots[index] = Some(result);
        Ok(())
    }

    /// True if an outcome was recorded for `index`
    #[must_use]
    pub fn is_recorded(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(Option::is_some)
    }

    /// Add a diagnostic that does not belong to a single query
    pub fn add_batch_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.batch_diagnostics.push(diagnostic);
    }

    /// Mark the batch as partial. Queries without an outcome become NO_HIT
    /// with a `Cancelled` diagnostic.
    pub fn mark_cancelled(&mut self) {
        self.complete = false;
        for index in 0..self.slots.len() {
            if self.slots[index].is_none() {
                let query = &self.queries[index];
                let mut result = ClassificationResult::no_hit(query.id.clone(), query.length);
                result.diagnostics.push(Diagnostic::for_query(
                    query.id.clone(),
                    DiagnosticKind::Cancelled,
                    "Batch cancelled before this query finished",
                ));
                self.slots[index] = Some(result);
            }
        }
    }

    /// Emit results in input order with their summary
    #[must_use]
    pub fn finish(self) -> BatchResult {
        let mut results = Vec::with_capacity(self.queries.len());
        for (query, slot) in self.queries.iter().zip(self.slots) {
            let mut result =
                slot.unwrap_or_else(|| ClassificationResult::no_hit(query.id.clone(), query.length));
            if query.length == 0 && !result.has_diagnostic(DiagnosticKind::EmptySequence) {
                result.diagnostics.push(Diagnostic::for_query(
                    query.id.clone(),
                    DiagnosticKind::EmptySequence,
                    "Sequence has no residues",
                ));
            }
            results.push(result);
        }

        let summary = BatchSummary::from_results(&results, self.counters);
        let mut diagnostics: Vec<Diagnostic> = results
            .iter()
            .flat_map(|r| r.diagnostics.iter().cloned())
            .collect();
        diagnostics.extend(self.batch_diagnostics);

        debug!(
            classified = summary.classified,
            ambiguous = summary.ambiguous,
            no_hit = summary.no_hit,
            "Aggregated batch"
        );

        BatchResult {
            results,
            summary,
            diagnostics,
            complete: self.complete,
        }
    }
}

/// Assemble normalized hits into a batch result.
///
/// Produces exactly one result per query, in the order of `queries`. Queries
/// without hits are NO_HIT.
///
/// # Errors
///
/// Returns `AggregationError::UnknownQuery` if `hits` has a key that is not
/// a query id, or `AggregationError::DuplicateQuery` for repeated ids.
pub fn aggregate(
    queries: &[QueryRecord],
    hits: HashMap<String, Vec<NormalizedHit>>,
    config: &ClassifierConfig,
) -> Result<BatchResult, AggregationError> {
    let mut accumulator = BatchAccumulator::new(queries, config.ranking())?;
    for (query_id, query_hits) in hits {
        let index = accumulator.position(&query_id)?;
        accumulator.add_hits(index, query_hits)?;
    }
    Ok(accumulator.finish())
}

/// Run the synchronous pipeline over hits that were already computed:
/// normalize each query's raw hits, rank them, and aggregate.
///
/// # Errors
///
/// See [`aggregate`].
pub fn classify_hits(
    catalog: &CogCatalog,
    queries: &[QueryRecord],
    hits: HashMap<String, Vec<RawHit>>,
    config: &ClassifierConfig,
) -> Result<BatchResult, AggregationError> {
    let filters = config.filters();
    let mut accumulator = BatchAccumulator::new(queries, config.ranking())?;
    for (query_id, raw_hits) in hits {
        let index = accumulator.position(&query_id)?;
        accumulator.add_normalized(index, normalize(raw_hits, catalog, &filters))?;
    }
    let batch = accumulator.finish();
    info!(
        "Classified {} of {} queries ({} ambiguous, {} unresolved hits)",
        batch.summary.classified + batch.summary.ambiguous,
        batch.summary.total_queries,
        batch.summary.ambiguous,
        batch.summary.unresolved_hits
    );
    Ok(batch)
}
