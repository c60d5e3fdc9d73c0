//! Team reference matching
//!
//! Maps free-text team references from upstream feeds onto canonical team codes:
//! - `vocabulary`: the immutable alias table, built-in or loaded from JSON
//! - `team`: exact-name lookup and free-text matchup extraction

pub mod team;
pub mod vocabulary;

pub use team::{Matchup, TeamResolver};
pub use vocabulary::TeamVocabulary;

/// Normalize a string for comparison: lower-case, drop non-alphanumerics,
/// collapse whitespace.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokenize into normalized words
pub fn tokenize(s: &str) -> Vec<String> {
    normalize(s)
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}
