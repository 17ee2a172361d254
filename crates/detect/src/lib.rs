//! Lexical scam heuristics.
//!
//! Two pure functions sit at the heart of the honeypot:
//! [`scorer::score`] decides whether a message looks like a scam, and
//! [`extractor::extract`] pulls bank accounts, VPAs, phone numbers, links and
//! tell-tale keywords out of it. Neither holds state, so both are safe to call
//! from any task without locking.

pub mod extractor;
pub mod repetition;
pub mod scorer;

pub use {
    extractor::{extract, scan, supplied_items},
    repetition::is_repetitive,
    scorer::{HistoryScore, ScamScore, SCAM_THRESHOLD, score, score_history},
};
