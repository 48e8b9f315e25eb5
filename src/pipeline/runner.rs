use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::catalog::store::CogCatalog;
use crate::config::{ClassifierConfig, ConfigError};
use crate::core::query::{QueryRecord, QuerySequence};
use crate::core::result::{BatchResult, DiagnosticKind};
use crate::matching::aggregate::{AggregationError, BatchAccumulator};
use crate::matching::normalizer::{normalize, Normalized};

use super::aligner::Aligner;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to assemble results: {0}")]
    Aggregation(#[from] AggregationError),
}

/// Signals a running batch to stop. Clones share the same signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// What happened to one query
enum QueryOutcome {
    Hits(Normalized),
    TimedOut,
    AlignerFailed(String),
}

/// Runs the aligner over a batch of queries with bounded concurrency and
/// assembles the results
pub struct BatchRunner {
    catalog: Arc<CogCatalog>,
    aligner: Arc<dyn Aligner>,
    config: ClassifierConfig,
}

impl BatchRunner {
    pub fn new(catalog: Arc<CogCatalog>, aligner: Arc<dyn Aligner>, config: ClassifierConfig) -> Self {
        Self {
            catalog,
            aligner,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify every query.
    ///
    /// At most `thread_count` alignments run at once and each is limited to
    /// `per_query_timeout_secs`. A query that times out or whose alignment
    /// fails becomes NO_HIT with a diagnostic; the rest of the batch carries
    /// on. Empty sequences never reach the aligner.
    ///
    /// When `cancel` fires, running alignments are aborted, finished results
    /// are kept, and the batch is returned with `complete == false`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` for an invalid configuration, or
    /// `PipelineError::Aggregation` if two queries share an id.
    pub async fn run(
        &self,
        queries: Vec<QuerySequence>,
        cancel: &CancelHandle,
    ) -> Result<BatchResult, PipelineError> {
        self.config.validate()?;

        let records: Vec<QueryRecord> = queries.iter().map(QuerySequence::record).collect();
        let mut accumulator = BatchAccumulator::new(&records, self.config.ranking())?;

        let mut cancel_rx = cancel.subscribe();
        if cancel.is_cancelled() {
            accumulator.mark_cancelled();
            return Ok(accumulator.finish());
        }

        info!(
            "Classifying {} queries with {} ({} concurrent, {:.0}s timeout)",
            records.len(),
            self.aligner.name(),
            self.config.thread_count,
            self.config.per_query_timeout_secs
        );

        let semaphore = Arc::new(Semaphore::new(self.config.thread_count));
        let timeout = self.config.per_query_timeout();
        let filters = self.config.filters();
        let mut tasks: JoinSet<(usize, QueryOutcome)> = JoinSet::new();

        for (index, query) in queries.into_iter().enumerate() {
            if query.is_empty() {
                debug!("Skipping empty sequence {}", query.id);
                continue;
            }
            let semaphore = Arc::clone(&semaphore);
            let aligner = Arc::clone(&self.aligner);
            let catalog = Arc::clone(&self.catalog);

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, QueryOutcome::AlignerFailed("worker pool closed".to_string()));
                };
                let outcome = match tokio::time::timeout(timeout, aligner.align(&query)).await {
                    Ok(Ok(raw_hits)) => QueryOutcome::Hits(normalize(raw_hits, &catalog, &filters)),
                    Ok(Err(e)) => QueryOutcome::AlignerFailed(e.to_string()),
                    Err(_) => QueryOutcome::TimedOut,
                };
                (index, outcome)
            });
        }

        let mut watching = true;
        let mut cancelled = false;
        loop {
            tokio::select! {
                changed = cancel_rx.changed(), if watching => {
                    if changed.is_err() {
                        watching = false;
                    } else if *cancel_rx.borrow() {
                        cancelled = true;
                        break;
                    }
                }
                joined = tasks.join_next() => {
                    match joined {
                        Some(Ok((index, outcome))) => self.record(&mut accumulator, &records, index, outcome)?,
                        Some(Err(e)) => warn!("Alignment task failed: {e}"),
                        None => break,
                    }
                }
            }
        }

        if cancelled {
            warn!("Cancellation requested; aborting {} running alignments", tasks.len());
            tasks.abort_all();
            // Tasks that finished before the abort still deliver their result
            while let Some(joined) = tasks.join_next().await {
                if let Ok((index, outcome)) = joined {
                    self.record(&mut accumulator, &records, index, outcome)?;
                }
            }
            accumulator.mark_cancelled();
        } else {
            // A task that panicked left its slot empty
            for (index, record) in records.iter().enumerate() {
                if record.length > 0 && !accumulator.is_recorded(index) {
                    accumulator.add_failure(
                        index,
                        DiagnosticKind::AlignerFailure,
                        "Alignment task terminated unexpectedly",
                    )?;
                }
            }
        }

        let batch = accumulator.finish();
        info!(
            "Finished batch: {} classified, {} ambiguous, {} no hit, {} timed out{}",
            batch.summary.classified,
            batch.summary.ambiguous,
            batch.summary.no_hit,
            batch.summary.timed_out,
            if batch.complete { "" } else { " (cancelled)" }
        );
        Ok(batch)
    }

    fn record(
        &self,
        accumulator: &mut BatchAccumulator,
        records: &[QueryRecord],
        index: usize,
        outcome: QueryOutcome,
    ) -> Result<(), AggregationError> {
        let id = &records[index].id;
        match outcome {
            QueryOutcome::Hits(normalized) => accumulator.add_normalized(index, normalized),
            QueryOutcome::TimedOut => {
                warn!(
                    "Alignment of {id} exceeded {}s; recording NO_HIT",
                    self.config.per_query_timeout_secs
                );
                accumulator.add_failure(
                    index,
                    DiagnosticKind::Timeout,
                    format!(
                        "Aligner exceeded the per-query timeout of {}s",
                        self.config.per_query_timeout_secs
                    ),
                )
            }
            QueryOutcome::AlignerFailed(message) => {
                warn!("Alignment of {id} failed: {message}");
                accumulator.add_failure(index, DiagnosticKind::AlignerFailure, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::core::hit::RawHit;
    use crate::core::types::ClassificationStatus;
    use crate::matching::test_support::sample_catalog;
    use crate::pipeline::aligner::{AlignFuture, AlignerError, PrecomputedHits};

    /// Sleeps per query id, then returns one hit to `WP_000001.1`
    struct ScriptedAligner {
        delays: HashMap<String, Duration>,
        failing: Vec<String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedAligner {
        fn new(delays: &[(&str, u64)]) -> Self {
            Self {
                delays: delays
                    .iter()
                    .map(|(id, ms)| ((*id).to_string(), Duration::from_millis(*ms)))
                    .collect(),
                failing: Vec::new(),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    impl Aligner for ScriptedAligner {
        fn align<'a>(&'a self, query: &'a QuerySequence) -> AlignFuture<'a> {
            Box::pin(async move {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                let delay = self.delays.get(&query.id).copied().unwrap_or_default();
                tokio::time::sleep(delay).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                if self.failing.contains(&query.id) {
                    return Err(AlignerError::Failed {
                        status: "exit status: 2".to_string(),
                        stderr: "BLAST Database error".to_string(),
                    });
                }
                Ok(vec![RawHit::new(query.id.clone(), "WP_000001.1", 1e-30, 150.0)])
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn queries(ids: &[&str]) -> Vec<QuerySequence> {
        ids.iter()
            .map(|id| QuerySequence::new(*id, "MKTAYIAKQRQISFVKSHFSRQ"))
            .collect()
    }

    fn runner(aligner: Arc<dyn Aligner>, config: ClassifierConfig) -> BatchRunner {
        BatchRunner::new(Arc::new(sample_catalog()), aligner, config)
    }

    #[tokio::test]
    async fn test_results_in_input_order_despite_completion_order() {
        let aligner = Arc::new(ScriptedAligner::new(&[("q1", 60), ("q2", 30), ("q3", 0)]));
        let runner = runner(aligner, ClassifierConfig::default());

        let batch = runner
            .run(queries(&["q1", "q2", "q3"]), &CancelHandle::new())
            .await
            .unwrap();
        let ids: Vec<&str> = batch.results.iter().map(|r| r.sequence_id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3"]);
        assert!(batch
            .results
            .iter()
            .all(|r| r.status == ClassificationStatus::Classified));
        assert!(batch.complete);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let ids: Vec<String> = (0..8).map(|i| format!("q{i}")).collect();
        let delays: Vec<(&str, u64)> = ids.iter().map(|id| (id.as_str(), 20)).collect();
        let aligner = Arc::new(ScriptedAligner::new(&delays));
        let config = ClassifierConfig {
            thread_count: 2,
            ..ClassifierConfig::default()
        };
        let runner = runner(aligner.clone(), config);

        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let batch = runner.run(queries(&id_refs), &CancelHandle::new()).await.unwrap();
        assert_eq!(batch.len(), 8);
        assert!(aligner.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_timeout_becomes_no_hit_with_diagnostic() {
        let aligner = Arc::new(ScriptedAligner::new(&[("slow", 10_000)]));
        let config = ClassifierConfig {
            per_query_timeout_secs: 0.05,
            ..ClassifierConfig::default()
        };
        let runner = runner(aligner, config);

        let batch = runner
            .run(queries(&["fast", "slow"]), &CancelHandle::new())
            .await
            .unwrap();
        assert_eq!(batch.results[0].status, ClassificationStatus::Classified);
        assert_eq!(batch.results[1].status, ClassificationStatus::NoHit);
        assert!(batch.results[1].has_diagnostic(DiagnosticKind::Timeout));
        assert_eq!(batch.summary.timed_out, 1);
        assert!(batch.complete);
    }

    #[tokio::test]
    async fn test_aligner_failure_does_not_abort_batch() {
        let mut aligner = ScriptedAligner::new(&[]);
        aligner.failing.push("bad".to_string());
        let runner = runner(Arc::new(aligner), ClassifierConfig::default());

        let batch = runner
            .run(queries(&["good", "bad"]), &CancelHandle::new())
            .await
            .unwrap();
        assert_eq!(batch.results[0].status, ClassificationStatus::Classified);
        assert!(batch.results[1].has_diagnostic(DiagnosticKind::AlignerFailure));
        assert_eq!(batch.summary.aligner_failures, 1);
    }

    #[tokio::test]
    async fn test_cancel_keeps_finished_results() {
        let aligner = Arc::new(ScriptedAligner::new(&[("slow", 10_000)]));
        let runner = runner(aligner, ClassifierConfig::default());
        let cancel = CancelHandle::new();

        let canceller = {
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                cancel.cancel();
            }
        };
        let (batch, ()) = tokio::join!(runner.run(queries(&["fast", "slow"]), &cancel), canceller);
        let batch = batch.unwrap();

        assert!(!batch.complete);
        assert_eq!(batch.results[0].status, ClassificationStatus::Classified);
        assert_eq!(batch.results[1].status, ClassificationStatus::NoHit);
        assert!(batch.results[1].has_diagnostic(DiagnosticKind::Cancelled));
        assert_eq!(batch.summary.cancelled, 1);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let runner = runner(Arc::new(ScriptedAligner::new(&[])), ClassifierConfig::default());
        let cancel = CancelHandle::new();
        cancel.cancel();

        let batch = runner.run(queries(&["q1"]), &cancel).await.unwrap();
        assert!(!batch.complete);
        assert!(batch.results[0].has_diagnostic(DiagnosticKind::Cancelled));
    }

    #[tokio::test]
    async fn test_empty_sequence_skips_aligner() {
        let aligner = Arc::new(ScriptedAligner::new(&[]));
        let runner = runner(aligner.clone(), ClassifierConfig::default());
        let input = vec![QuerySequence::new("empty", "")];

        let batch = runner.run(input, &CancelHandle::new()).await.unwrap();
        assert_eq!(batch.results[0].status, ClassificationStatus::NoHit);
        assert!(batch.results[0].has_diagnostic(DiagnosticKind::EmptySequence));
        assert_eq!(aligner.max_in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_precomputed_hits_through_runner() {
        let mut hits = HashMap::new();
        hits.insert(
            "q1".to_string(),
            vec![
                RawHit::new("q1", "WP_000003.1", 1e-20, 90.0),
                RawHit::new("q1", "WP_000002.1", 1e-40, 185.2),
                RawHit::new("q1", "WP_missing", 1e-50, 400.0),
            ],
        );
        let runner = runner(
            Arc::new(PrecomputedHits::new(hits)),
            ClassifierConfig::default(),
        );

        let batch = runner
            .run(queries(&["q1", "q2"]), &CancelHandle::new())
            .await
            .unwrap();
        let best = batch.results[0].best_hit.as_ref().unwrap();
        assert_eq!(best.cog_id.as_str(), "COG0745");
        assert_eq!(batch.results[0].all_hits.len(), 2);
        assert_eq!(batch.summary.unresolved_hits, 1);
        assert_eq!(batch.results[1].status, ClassificationStatus::NoHit);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = ClassifierConfig {
            thread_count: 0,
            ..ClassifierConfig::default()
        };
        let runner = runner(Arc::new(ScriptedAligner::new(&[])), config);
        let err = runner
            .run(queries(&["q1"]), &CancelHandle::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
