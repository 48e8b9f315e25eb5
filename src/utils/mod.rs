//! Shared helpers: input limits, sequence sanity checks and display formatting.

pub mod validation;
