use crate::config::RankingConfig;
use crate::core::hit::NormalizedHit;
use crate::core::types::ClassificationStatus;

use super::scoring::{sort_ranked, top_margin};

/// Best hit, ranked list and status for one query
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub best_hit: Option<NormalizedHit>,
    /// Best first, at most `max_hits_per_query` long
    pub ranked: Vec<NormalizedHit>,
    pub status: ClassificationStatus,
}

/// Rank a query's normalized hits and pick the best one.
///
/// The ranking follows [`rank_order`](super::scoring::rank_order) and is
/// truncated to `config.max_hits_per_query` (never below one hit). The status is
///
/// - `NoHit` when there are no hits,
/// - `Ambiguous` when `config.ambiguity_delta` is set and the top two bit
///   scores differ by no more than it,
/// - `Classified` otherwise.
#[must_use]
pub fn select_best_and_ranked(mut hits: Vec<NormalizedHit>, config: &RankingConfig) -> Selection {
    if hits.is_empty() {
        return Selection {
            best_hit: None,
            ranked: hits,
            status: ClassificationStatus::NoHit,
        };
    }

    sort_ranked(&mut hits);
    hits.truncate(config.max_hits_per_query.max(1));

    let ambiguous = match (config.ambiguity_delta, top_margin(&hits)) {
        (Some(delta), Some(margin)) => margin <= delta,
        _ => false,
    };

    Selection {
        best_hit: hits.first().cloned(),
        ranked: hits,
        status: if ambiguous {
            ClassificationStatus::Ambiguous
        } else {
            ClassificationStatus::Classified
        },
    }
}
