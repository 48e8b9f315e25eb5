use std::cmp::Ordering;

use crate::core::hit::NormalizedHit;

/// Total order used to rank hits, best first.
///
/// Keys, in priority order:
///
/// 1. bit score, descending
/// 2. e-value, ascending
/// 3. percent identity, descending
/// 4. subject accession, ascending
///
/// Floats are compared with [`f64::total_cmp`], so the order is total and the
/// ranking does not depend on the order hits arrive in.
#[must_use]
pub fn rank_order(a: &NormalizedHit, b: &NormalizedHit) -> Ordering {
    b.bit_score
        .total_cmp(&a.bit_score)
        .then_with(|| a.evalue.total_cmp(&b.evalue))
        .then_with(|| b.percent_identity.total_cmp(&a.percent_identity))
        .then_with(|| a.subject_accession.cmp(&b.subject_accession))
}

/// Sort hits best first
pub fn sort_ranked(hits: &mut [NormalizedHit]) {
    hits.sort_by(rank_order);
}

/// Bit-score gap between the two best hits of a ranked list
#[must_use]
pub fn top_margin(ranked: &[NormalizedHit]) -> Option<f64> {
    match ranked {
        [first, second, ..] => Some(first.bit_score - second.bit_score),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::test_support::hit;

    #[test]
    fn test_bit_score_dominates() {
        let a = hit("A", 100.0, 1e-3, 50.0);
        let b = hit("B", 90.0, 1e-50, 99.0);
        assert_eq!(rank_order(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_tie_breaks() {
        // equal bit score: lower e-value wins
        let a = hit("B", 100.0, 1e-10, 50.0);
        let b = hit("A", 100.0, 1e-20, 50.0);
        assert_eq!(rank_order(&a, &b), Ordering::Greater);

        // equal bit score and e-value: higher identity wins
        let a = hit("B", 100.0, 1e-10, 80.0);
        let b = hit("A", 100.0, 1e-10, 70.0);
        assert_eq!(rank_order(&a, &b), Ordering::Less);

        // everything equal: accession decides
        let a = hit("WP_2", 100.0, 1e-10, 80.0);
        let b = hit("WP_1", 100.0, 1e-10, 80.0);
        assert_eq!(rank_order(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_top_margin() {
        let ranked = vec![hit("A", 185.2, 1e-50, 90.0), hit("B", 180.0, 1e-48, 90.0)];
        let margin = top_margin(&ranked).unwrap();
        assert!((margin - 5.2).abs() < 1e-9);
        assert_eq!(top_margin(&ranked[..1]), None);
    }
}
