//! Error types and utilities for butterfly-osm toolkit
//!
//! Provides the shared error type and fuzzy matching for user-supplied
//! identifiers (transport modes, families) that have a fixed vocabulary.

use std::fmt;
use strsim::{jaro_winkler, normalized_levenshtein};

/// Find the best fuzzy match using hybrid semantic + character-based scoring
///
/// Combines character-based similarity (Jaro-Winkler 70% + Normalized Levenshtein 30%)
/// with semantic bonuses:
/// - Prefix matching: 20% bonus for strong prefix similarity (≥4 chars)
/// - Component matching: 12% bonus for compound keys (`motor_vehicle`, `ski:nordic`)
/// - Length similarity: 10% bonus for appropriate length matches
///
/// Minimum threshold: 0.65 similarity to balance precision vs recall
fn find_best_fuzzy_match(input: &str, candidates: &[&str]) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }

    let input_lower = input.to_lowercase();
    let mut best_match = None;
    let mut best_score = 0.0f64;

    // Below this, "totally-invalid" inputs start matching short keys like "bus".
    let min_threshold = 0.65;

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();

        // Jaro-Winkler favours shared prefixes, which is how mode keys are misspelt
        // ("bicyle", "motorcr"); Levenshtein covers dropped letters.
        let jw_score = jaro_winkler(&input_lower, &candidate_lower);
        let lev_score = normalized_levenshtein(&input_lower, &candidate_lower);
        let combined_score = (jw_score * 0.7) + (lev_score * 0.3);

        let mut semantic_bonus = 0.0;

        let prefix_len = input_lower.chars().count().min(7);
        if prefix_len >= 4 {
            let input_prefix = input_lower.chars().take(prefix_len).collect::<String>();
            let candidate_prefix = candidate_lower.chars().take(prefix_len).collect::<String>();

            let prefix_similarity = normalized_levenshtein(&input_prefix, &candidate_prefix);
            if prefix_similarity > 0.7 {
                semantic_bonus += 0.2 * prefix_similarity;
            }
        }

        if input_lower.len() >= 8 && candidate_lower.len() >= 8 {
            let length_ratio = 1.0
                - ((input_lower.len() as f64 - candidate_lower.len() as f64).abs()
                    / input_lower.len().max(candidate_lower.len()) as f64);
            if length_ratio > 0.7 {
                semantic_bonus += 0.1 * length_ratio;
            }
        }

        // Compound keys: "vehicle" should find "motor_vehicle", "nordic" should find "ski:nordic".
        if candidate_lower.contains('_') || candidate_lower.contains(':') {
            for part in candidate_lower.split(&['_', ':'][..]) {
                if part.len() >= 4 {
                    let part_similarity = jaro_winkler(&input_lower, part);
                    if part_similarity > 0.85 {
                        semantic_bonus += 0.12 * part_similarity;
                    }
                }
            }
        }

        let final_score = combined_score + semantic_bonus;

        if final_score >= min_threshold && final_score > best_score {
            best_score = final_score;
            best_match = Some(candidate.to_string());
        }
    }

    best_match
}

/// Suggest a correction for a potentially misspelled identifier
///
/// Returns `None` when `input` already names a candidate (case-insensitively)
/// or when nothing is close enough to be a plausible typo.
pub fn suggest_correction(input: &str, candidates: &[&str]) -> Option<String> {
    if candidates.iter().any(|c| c.eq_ignore_ascii_case(input)) {
        return None;
    }
    find_best_fuzzy_match(input, candidates)
}

/// Main error type shared by butterfly-osm tools
#[derive(Debug)]
pub enum Error {
    /// A transport mode key that the access model does not know
    UnknownMode {
        mode: String,
        suggestion: Option<String>,
    },

    /// File I/O error
    IoError(std::io::Error),

    /// Invalid configuration or parameters
    InvalidInput(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownMode {
                mode,
                suggestion: Some(suggestion),
            } => {
                write!(f, "Unknown transport mode '{mode}', did you mean '{suggestion}'?")
            }
            Error::UnknownMode {
                mode,
                suggestion: None,
            } => {
                write!(f, "Unknown transport mode '{mode}'")
            }
            Error::IoError(err) => {
                write!(f, "I/O error: {err}")
            }
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {msg}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

/// Convenience result type for butterfly-osm operations
pub type Result<T> = std::result::Result<T, Error>;
