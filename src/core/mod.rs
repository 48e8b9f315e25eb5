//! Core data types for COG classification.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`RawHit`](hit::RawHit): One alignment line as reported by the aligner
//! - [`NormalizedHit`](hit::NormalizedHit): A filtered hit resolved to its COG and categories
//! - [`QueryRecord`](query::QueryRecord), [`QuerySequence`](query::QuerySequence): Input sequences
//! - [`ClassificationResult`](result::ClassificationResult), [`BatchResult`](result::BatchResult):
//!   Per-query and per-run results
//! - [`CogId`](types::CogId), [`CategoryCode`](types::CategoryCode),
//!   [`ClassificationStatus`](types::ClassificationStatus): Identifier and status types
//!
//! ## Functional Categories
//!
//! COG functional categories are single uppercase letters. The known set has 25
//! codes (`A` through `Z`, excluding `X`); a COG may carry several of them:
//!
//! | COG      | Categories | Meaning |
//! |----------|------------|---------|
//! | COG0001  | H          | Coenzyme transport and metabolism |
//! | COG0642  | T          | Signal transduction mechanisms |
//! | COG0745  | TK         | Signal transduction; Transcription |

pub mod hit;
pub mod query;
pub mod result;
pub mod types;
