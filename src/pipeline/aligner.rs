use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::core::hit::RawHit;
use crate::core::query::QuerySequence;
use crate::parsing::ParseError;

#[derive(Error, Debug)]
pub enum AlignerError {
    #[error("Failed to launch aligner '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Aligner exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Failed to parse aligner output: {0}")]
    Output(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Future returned by [`Aligner::align`]
pub type AlignFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<RawHit>, AlignerError>> + Send + 'a>>;

/// Produces raw alignment hits for one query sequence.
///
/// Implementations must be cancel-safe: dropping the future must stop the
/// work (the batch runner drops it on timeout and on cancellation).
pub trait Aligner: Send + Sync + 'static {
    fn align<'a>(&'a self, query: &'a QuerySequence) -> AlignFuture<'a>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Serves hits computed ahead of time, e.g. parsed from a BLAST tabular file
#[derive(Debug, Clone, Default)]
pub struct PrecomputedHits {
    hits: HashMap<String, Vec<RawHit>>,
}

impl PrecomputedHits {
    #[must_use]
    pub fn new(hits: HashMap<String, Vec<RawHit>>) -> Self {
        Self { hits }
    }

    /// Query ids that have hits but are absent from `known`
    pub fn unknown_queries<'a>(
        &'a self,
        known: impl Fn(&str) -> bool + 'a,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.hits.keys().map(String::as_str).filter(move |id| !known(id))
    }

    #[must_use]
    pub fn num_queries(&self) -> usize {
        self.hits.len()
    }
}

impl Aligner for PrecomputedHits {
    fn align<'a>(&'a self, query: &'a QuerySequence) -> AlignFuture<'a> {
        let hits = self.hits.get(&query.id).cloned().unwrap_or_default();
        Box::pin(async move { Ok(hits) })
    }

    fn name(&self) -> &str {
        "precomputed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_precomputed_hits() {
        let mut hits = HashMap::new();
        hits.insert(
            "q1".to_string(),
            vec![RawHit::new("q1", "WP_000001.1", 1e-30, 120.0)],
        );
        let aligner = PrecomputedHits::new(hits);

        let found = aligner.align(&QuerySequence::new("q1", "MKV")).await.unwrap();
        assert_eq!(found.len(), 1);
        let missing = aligner.align(&QuerySequence::new("q2", "MKV")).await.unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_unknown_queries() {
        let mut hits = HashMap::new();
        hits.insert("q1".to_string(), Vec::new());
        hits.insert("ghost".to_string(), Vec::new());
        let aligner = PrecomputedHits::new(hits);
        let unknown: Vec<&str> = aligner.unknown_queries(|id| id == "q1").collect();
        assert_eq!(unknown, vec!["ghost"]);
    }
}
