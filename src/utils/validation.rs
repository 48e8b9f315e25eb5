//! Centralized validation and helper functions.

use crate::core::query::QuerySequence;

/// Maximum number of query sequences allowed in a single batch
pub const MAX_QUERIES: usize = 1_000_000;

/// Sequences shorter than this are flagged
pub const MIN_SEQUENCE_LENGTH: usize = 10;

/// Sequences longer than this are flagged
pub const MAX_SEQUENCE_LENGTH: usize = 10_000;

/// Residue characters accepted in protein sequences
pub const VALID_RESIDUES: &str = "ACDEFGHIKLMNPQRSTVWYXBZJU*-";

/// Check if adding another query would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new query.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_query_limit(count: usize) -> Option<String> {
    if count >= MAX_QUERIES {
        Some(format!(
            "Too many sequences: adding another would exceed maximum of {MAX_QUERIES}"
        ))
    } else {
        None
    }
}

/// A problem found in a query sequence. None of these stop classification.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceIssue {
    Empty,
    TooShort(usize),
    TooLong(usize),
    MultipleStops(usize),
    HighGapContent(f64),
    HighUnknownContent(f64),
    InvalidCharacters(Vec<char>),
}

impl std::fmt::Display for SequenceIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty sequence"),
            Self::TooShort(len) => write!(
                f,
                "Sequence too short ({len} < {MIN_SEQUENCE_LENGTH} amino acids)"
            ),
            Self::TooLong(len) => write!(
                f,
                "Sequence very long ({len} > {MAX_SEQUENCE_LENGTH} amino acids)"
            ),
            Self::MultipleStops(n) => write!(f, "Multiple stop codons ({n})"),
            Self::HighGapContent(pct) => write!(f, "High gap content ({pct:.1}%)"),
            Self::HighUnknownContent(pct) => {
                write!(f, "High unknown residue content ({pct:.1}%)")
            }
            Self::InvalidCharacters(chars) => {
                let list: String = chars.iter().collect();
                write!(f, "Invalid characters in sequence: {list}")
            }
        }
    }
}

#[inline]
fn percent(part: usize, whole: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        part as f64 / whole as f64 * 100.0
    }
}

/// Inspect one protein sequence
#[must_use]
pub fn sequence_issues(residues: &str) -> Vec<SequenceIssue> {
    let len = residues.len();
    if len == 0 {
        return vec![SequenceIssue::Empty];
    }

    let mut issues = Vec::new();
    if len < MIN_SEQUENCE_LENGTH {
        issues.push(SequenceIssue::TooShort(len));
    } else if len > MAX_SEQUENCE_LENGTH {
        issues.push(SequenceIssue::TooLong(len));
    }

    let stops = residues.matches('*').count();
    if stops > 1 {
        issues.push(SequenceIssue::MultipleStops(stops));
    }

    // 10% thresholds
    let gaps = residues.matches('-').count();
    if gaps * 10 > len {
        issues.push(SequenceIssue::HighGapContent(percent(gaps, len)));
    }
    let unknowns = residues.matches('X').count();
    if unknowns * 10 > len {
        issues.push(SequenceIssue::HighUnknownContent(percent(unknowns, len)));
    }

    let mut invalid: Vec<char> = residues
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| !VALID_RESIDUES.contains(*c))
        .collect();
    if !invalid.is_empty() {
        invalid.sort_unstable();
        invalid.dedup();
        issues.push(SequenceIssue::InvalidCharacters(invalid));
    }

    issues
}

/// Inspect a batch of sequences, returning only those with issues
#[must_use]
pub fn validate_sequences(queries: &[QuerySequence]) -> Vec<(String, Vec<SequenceIssue>)> {
    queries
        .iter()
        .filter_map(|q| {
            let issues = sequence_issues(&q.residues);
            if issues.is_empty() {
                None
            } else {
                Some((q.id.clone(), issues))
            }
        })
        .collect()
}

/// Format an e-value for human-readable output
///
/// # Examples
///
/// ```
/// use cog_classifier::utils::validation::format_evalue;
///
/// assert_eq!(format_evalue(0.0), "0");
/// assert_eq!(format_evalue(1e-150), "< 1e-100");
/// assert_eq!(format_evalue(3e-20), "3e-20");
/// assert_eq!(format_evalue(0.5), "0.500");
/// ```
#[must_use]
pub fn format_evalue(evalue: f64) -> String {
    if evalue == 0.0 {
        "0".to_string()
    } else if evalue < 1e-100 {
        "< 1e-100".to_string()
    } else if evalue < 1e-10 {
        format!("{evalue:.0e}")
    } else if evalue < 0.01 {
        format!("{evalue:.1e}")
    } else {
        format!("{evalue:.3}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_query_limit() {
        assert!(check_query_limit(0).is_none());
        assert!(check_query_limit(MAX_QUERIES - 1).is_none());
        assert!(check_query_limit(MAX_QUERIES).is_some());
    }

    #[test]
    fn test_clean_sequence_has_no_issues() {
        assert!(sequence_issues("MKTAYIAKQRQISFVKSHFSRQ").is_empty());
    }

    #[test]
    fn test_sequence_issues() {
        assert_eq!(sequence_issues(""), vec![SequenceIssue::Empty]);
        assert_eq!(sequence_issues("MKV"), vec![SequenceIssue::TooShort(3)]);

        let issues = sequence_issues("MK*TAY*IAKQR");
        assert!(issues.contains(&SequenceIssue::MultipleStops(2)));

        let issues = sequence_issues("MKXXXTAYIAKQR");
        assert!(issues
            .iter()
            .any(|i| matches!(i, SequenceIssue::HighUnknownContent(_))));

        let issues = sequence_issues("MKTAYIAKQR0O");
        assert!(issues.contains(&SequenceIssue::InvalidCharacters(vec!['0', 'O'])));
    }

    #[test]
    fn test_validate_sequences_only_reports_problems() {
        let queries = vec![
            QuerySequence::new("good", "MKTAYIAKQRQISFVKSHFSRQ"),
            QuerySequence::new("short", "MK"),
        ];
        let reports = validate_sequences(&queries);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, "short");
    }

    #[test]
    fn test_format_evalue() {
        assert_eq!(format_evalue(2.5e-3), "2.5e-3");
        assert_eq!(format_evalue(0.05), "0.050");
    }
}
