//! Scoring for lineage benchmark results.

pub mod aggregate;
pub mod extract;

pub use aggregate::{condensed, detailed, score_rows, Condensed, CondensedRow, Counts, Scored};
pub use extract::{AnswerExtractor, Outcome};
