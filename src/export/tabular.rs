//! Delimited (CSV/TSV) rendering of a batch: one row per query, built from
//! its best hit.

use crate::core::result::{BatchResult, ClassificationResult};

/// Column names, in output order
pub const COLUMNS: [&str; 11] = [
    "sequence_id",
    "length",
    "cog_id",
    "cog_name",
    "category",
    "category_name",
    "evalue",
    "bit_score",
    "identity",
    "coverage",
    "status",
];

/// Shortest round-trip decimal, switching to exponent notation for very
/// small or very large magnitudes
#[must_use]
pub fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if value != 0.0 && (magnitude < 1e-4 || magnitude >= 1e15) {
        format!("{value:e}")
    } else {
        format!("{value}")
    }
}

/// Quote a field if it contains the delimiter, a quote or a line break.
/// Free-text fields are also quoted when they contain a comma.
fn quote(field: &str, delimiter: char, free_text: bool) -> String {
    let needs_quotes = field.contains(delimiter)
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r')
        || (free_text && field.contains(','));
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn row(result: &ClassificationResult) -> [(String, bool); 11] {
    let status = result.status.to_string();
    let id = result.sequence_id.clone();
    let length = result.sequence_length.to_string();
    match &result.best_hit {
        Some(hit) => [
            (id, false),
            (length, false),
            (hit.cog_id.to_string(), false),
            (hit.cog_name.clone(), true),
            (hit.category_string(), false),
            (hit.category_name_string(), true),
            (format_float(hit.evalue), false),
            (format_float(hit.bit_score), false),
            (format_float(hit.percent_identity), false),
            (format_float(hit.percent_coverage), false),
            (status, false),
        ],
        None => [
            (id, false),
            (length, false),
            (String::new(), false),
            (String::new(), true),
            (String::new(), false),
            (String::new(), true),
            (String::new(), false),
            (String::new(), false),
            (String::new(), false),
            (String::new(), false),
            (status, false),
        ],
    }
}

/// Render a header line and one line per result
#[must_use]
pub fn render(batch: &BatchResult, delimiter: char) -> String {
    let sep = delimiter.to_string();
    let mut out = COLUMNS.join(&sep);
    out.push('\n');

    for result in &batch.results {
        let fields: Vec<String> = row(result)
            .iter()
            .map(|(value, free_text)| quote(value, delimiter, *free_text))
            .collect();
        out.push_str(&fields.join(&sep));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(185.2), "185.2");
        assert_eq!(format_float(87.5), "87.5");
        assert_eq!(format_float(100.0), "100");
        assert_eq!(format_float(0.001), "0.001");
        assert_eq!(format_float(1e-50), "1e-50");
        assert_eq!(format_float(2.5e-30), "2.5e-30");
    }

    #[test]
    fn test_render_one_line_per_result() {
        let batch = BatchResult {
            results: vec![
                ClassificationResult::no_hit("q1", 120),
                ClassificationResult::no_hit("q2", 0),
            ],
            summary: Default::default(),
            diagnostics: Vec::new(),
            complete: true,
        };
        let text = render(&batch, '\t');
        let lines: Vec<&str> = text.split_terminator('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], COLUMNS.join("\t"));
        assert_eq!(lines[1], "q1\t120\t\t\t\t\t\t\t\t\tNO_HIT");
        assert!(text.ends_with("NO_HIT\n"));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain", ',', false), "plain");
        assert_eq!(quote("a,b", ',', false), "\"a,b\"");
        assert_eq!(quote("say \"hi\"", '\t', false), "\"say \"\"hi\"\"\"");
        assert_eq!(quote("a\tb", '\t', false), "\"a\tb\"");
        assert_eq!(quote("line\nbreak", ',', false), "\"line\nbreak\"");
        // free text keeps commas quoted in TSV
        assert_eq!(quote("OmpR family, regulator", '\t', true), "\"OmpR family, regulator\"");
        assert_eq!(quote("a,b", '\t', false), "a,b");
    }
}
