use serde::{Deserialize, Serialize};

use crate::core::types::{CategoryCode, CogId};

/// One alignment line as reported by the aligner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    pub query_id: String,
    pub subject_accession: String,
    pub evalue: f64,
    pub bit_score: f64,
    pub percent_identity: f64,
    pub percent_coverage: f64,
    pub alignment_length: u32,
}

impl RawHit {
    pub fn new(
        query_id: impl Into<String>,
        subject_accession: impl Into<String>,
        evalue: f64,
        bit_score: f64,
    ) -> Self {
        Self {
            query_id: query_id.into(),
            subject_accession: subject_accession.into(),
            evalue,
            bit_score,
            percent_identity: 100.0,
            percent_coverage: 100.0,
            alignment_length: 1,
        }
    }

    #[must_use]
    pub fn with_identity(mut self, identity: f64) -> Self {
        self.percent_identity = identity;
        self
    }

    #[must_use]
    pub fn with_coverage(mut self, coverage: f64) -> Self {
        self.percent_coverage = coverage;
        self
    }

    #[must_use]
    pub fn with_alignment_length(mut self, length: u32) -> Self {
        self.alignment_length = length;
        self
    }

    /// Describe why the numeric fields are unusable, if they are.
    ///
    /// Aligners occasionally emit `nan`, `inf` or negative values on corrupt
    /// output; such hits must never reach ranking or export.
    #[must_use]
    pub fn field_problem(&self) -> Option<String> {
        if !self.evalue.is_finite() || self.evalue < 0.0 {
            return Some(format!("invalid e-value {}", self.evalue));
        }
        if !self.bit_score.is_finite() || self.bit_score <= 0.0 {
            return Some(format!("invalid bit score {}", self.bit_score));
        }
        if !(0.0..=100.0).contains(&self.percent_identity) {
            return Some(format!("identity {} outside [0, 100]", self.percent_identity));
        }
        if !(0.0..=100.0).contains(&self.percent_coverage) {
            return Some(format!("coverage {} outside [0, 100]", self.percent_coverage));
        }
        if self.alignment_length == 0 {
            return Some("zero alignment length".to_string());
        }
        if self.subject_accession.is_empty() {
            return Some("empty subject accession".to_string());
        }
        None
    }
}

/// A hit that passed filtering and was resolved through the COG catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "HitRecord", try_from = "HitRecord")]
pub struct NormalizedHit {
    pub subject_accession: String,
    pub cog_id: CogId,
    pub cog_name: String,
    pub category_codes: Vec<CategoryCode>,
    pub category_names: Vec<String>,
    pub evalue: f64,
    pub bit_score: f64,
    pub percent_identity: f64,
    pub percent_coverage: f64,
    pub alignment_length: u32,
}

/// Separator between category names when a COG has several categories
pub const CATEGORY_NAME_SEPARATOR: &str = "; ";

impl NormalizedHit {
    /// Category codes concatenated, e.g. `"KT"`
    #[must_use]
    pub fn category_string(&self) -> String {
        self.category_codes.iter().map(|c| c.as_char()).collect()
    }

    #[must_use]
    pub fn category_name_string(&self) -> String {
        self.category_names.join(CATEGORY_NAME_SEPARATOR)
    }
}

/// Flat wire shape of a hit in exported results
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HitRecord {
    subject_id: String,
    cog_id: String,
    cog_name: String,
    category: String,
    category_name: String,
    evalue: f64,
    bit_score: f64,
    identity: f64,
    coverage: f64,
    alignment_length: u32,
}

impl From<NormalizedHit> for HitRecord {
    fn from(hit: NormalizedHit) -> Self {
        Self {
            category: hit.category_string(),
            category_name: hit.category_name_string(),
            subject_id: hit.subject_accession,
            cog_id: hit.cog_id.0,
            cog_name: hit.cog_name,
            evalue: hit.evalue,
            bit_score: hit.bit_score,
            identity: hit.percent_identity,
            coverage: hit.percent_coverage,
            alignment_length: hit.alignment_length,
        }
    }
}

impl TryFrom<HitRecord> for NormalizedHit {
    type Error = String;

    fn try_from(record: HitRecord) -> Result<Self, Self::Error> {
        let category_codes = CategoryCode::parse_run(&record.category)
            .map_err(|c| format!("unknown COG category code '{c}'"))?;
        let category_names = if record.category_name.is_empty() {
            Vec::new()
        } else {
            record
                .category_name
                .split(CATEGORY_NAME_SEPARATOR)
                .map(str::to_string)
                .collect()
        };

        Ok(Self {
            subject_accession: record.subject_id,
            cog_id: CogId(record.cog_id),
            cog_name: record.cog_name,
            category_codes,
            category_names,
            evalue: record.evalue,
            bit_score: record.bit_score,
            percent_identity: record.identity,
            percent_coverage: record.coverage,
            alignment_length: record.alignment_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hit() -> NormalizedHit {
        NormalizedHit {
            subject_accession: "WP_000001.1".to_string(),
            cog_id: CogId::new("COG0001"),
            cog_name: "Glutamate-1-semialdehyde aminotransferase".to_string(),
            category_codes: vec![CategoryCode::new('H').unwrap(), CategoryCode::new('E').unwrap()],
            category_names: vec![
                "Coenzyme transport and metabolism".to_string(),
                "Amino acid transport and metabolism".to_string(),
            ],
            evalue: 1e-50,
            bit_score: 185.2,
            percent_identity: 87.5,
            percent_coverage: 99.0,
            alignment_length: 420,
        }
    }

    #[test]
    fn test_field_problem_detects_bad_numbers() {
        let good = RawHit::new("q1", "WP_1", 1e-10, 50.0);
        assert!(good.field_problem().is_none());

        assert!(RawHit::new("q1", "WP_1", f64::NAN, 50.0).field_problem().is_some());
        assert!(RawHit::new("q1", "WP_1", f64::INFINITY, 50.0).field_problem().is_some());
        assert!(RawHit::new("q1", "WP_1", 1e-10, f64::INFINITY).field_problem().is_some());
        assert!(RawHit::new("q1", "WP_1", 1e-10, 0.0).field_problem().is_some());
        assert!(RawHit::new("q1", "WP_1", 1e-10, 50.0)
            .with_identity(101.0)
            .field_problem()
            .is_some());
        assert!(RawHit::new("q1", "WP_1", 1e-10, 50.0)
            .with_alignment_length(0)
            .field_problem()
            .is_some());
    }

    #[test]
    fn test_hit_json_shape() {
        let json = serde_json::to_value(sample_hit()).unwrap();
        assert_eq!(json["cog_id"], "COG0001");
        assert_eq!(json["category"], "HE");
        assert_eq!(
            json["category_name"],
            "Coenzyme transport and metabolism; Amino acid transport and metabolism"
        );
        assert_eq!(json["bit_score"], 185.2);
        assert_eq!(json["subject_id"], "WP_000001.1");
        assert!(json.get("subject_accession").is_none());
    }

    #[test]
    fn test_hit_json_rejects_unknown_category() {
        let mut json = serde_json::to_value(sample_hit()).unwrap();
        json["category"] = serde_json::json!("X");
        let parsed: Result<NormalizedHit, _> = serde_json::from_value(json);
        assert!(parsed.is_err());
    }
}
