//! Classifier configuration.
//!
//! A [`ClassifierConfig`] can be built in code, loaded from a JSON file (any
//! field left out takes its default), and then overridden field by field.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hits with a larger e-value are discarded
pub const DEFAULT_MAX_EVALUE: f64 = 1e-5;

/// Length of the ranked hit list kept per query
pub const DEFAULT_MAX_HITS_PER_QUERY: usize = 10;

/// Concurrent alignments
pub const DEFAULT_THREAD_COUNT: usize = 4;

/// One hour per query
pub const DEFAULT_PER_QUERY_TIMEOUT_SECS: f64 = 3600.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

/// Options for one classification run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Inclusive upper bound on e-value
    pub max_evalue: f64,
    /// Cap on the ranked hit list per query
    pub max_hits_per_query: usize,
    /// Inclusive lower bound on percent identity, if set
    pub min_identity: Option<f64>,
    /// Inclusive lower bound on percent query coverage, if set
    pub min_coverage: Option<f64>,
    /// Mark a query AMBIGUOUS when the top two bit scores differ by at most
    /// this much. Disabled when unset.
    pub ambiguity_delta: Option<f64>,
    pub thread_count: usize,
    pub per_query_timeout_secs: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_evalue: DEFAULT_MAX_EVALUE,
            max_hits_per_query: DEFAULT_MAX_HITS_PER_QUERY,
            min_identity: None,
            min_coverage: None,
            ambiguity_delta: None,
            thread_count: DEFAULT_THREAD_COUNT,
            per_query_timeout_secs: DEFAULT_PER_QUERY_TIMEOUT_SECS,
        }
    }
}

/// Thresholds applied by the hit normalizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitFilters {
    pub max_evalue: f64,
    pub min_identity: Option<f64>,
    pub min_coverage: Option<f64>,
}

impl Default for HitFilters {
    fn default() -> Self {
        ClassifierConfig::default().filters()
    }
}

impl HitFilters {
    /// True iff the hit's numbers pass every configured threshold
    #[must_use]
    pub fn accepts(&self, evalue: f64, identity: f64, coverage: f64) -> bool {
        evalue <= self.max_evalue
            && self.min_identity.map_or(true, |min| identity >= min)
            && self.min_coverage.map_or(true, |min| coverage >= min)
    }
}

/// Policy used by the resolution engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingConfig {
    /// Length cap on the ranked list. The best hit is always kept, so 0
    /// behaves like 1.
    pub max_hits_per_query: usize,
    pub ambiguity_delta: Option<f64>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        ClassifierConfig::default().ranking()
    }
}

fn check_percent(field: &'static str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !(0.0..=100.0).contains(&v) => Err(ConfigError::InvalidValue {
            field,
            message: format!("{v} is outside [0, 100]"),
        }),
        _ => Ok(()),
    }
}

impl ClassifierConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read,
    /// `ConfigError::Json` if it is not valid JSON for this shape, or
    /// `ConfigError::InvalidValue` if a value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is usable
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_evalue.is_finite() || self.max_evalue < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "max_evalue",
                message: format!("{} must be a finite non-negative number", self.max_evalue),
            });
        }
        if self.max_hits_per_query == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_hits_per_query",
                message: "must be at least 1".to_string(),
            });
        }
        check_percent("min_identity", self.min_identity)?;
        check_percent("min_coverage", self.min_coverage)?;
        if let Some(delta) = self.ambiguity_delta {
            if !delta.is_finite() || delta < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: "ambiguity_delta",
                    message: format!("{delta} must be a finite non-negative number"),
                });
            }
        }
        if self.thread_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "thread_count",
                message: "must be at least 1".to_string(),
            });
        }
        if !self.per_query_timeout_secs.is_finite() || self.per_query_timeout_secs <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "per_query_timeout_secs",
                message: format!("{} must be a positive number", self.per_query_timeout_secs),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn filters(&self) -> HitFilters {
        HitFilters {
            max_evalue: self.max_evalue,
            min_identity: self.min_identity,
            min_coverage: self.min_coverage,
        }
    }

    #[must_use]
    pub fn ranking(&self) -> RankingConfig {
        RankingConfig {
            max_hits_per_query: self.max_hits_per_query,
            ambiguity_delta: self.ambiguity_delta,
        }
    }

    /// The per-query timeout; call [`validate`](Self::validate) first
    #[must_use]
    pub fn per_query_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.per_query_timeout_secs)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_PER_QUERY_TIMEOUT_SECS))
    }
}
