//! Normalization of untrusted scalar values
//!
//! Pure, total functions: malformed input maps to a safe default and
//! nothing here returns an error. Each function works on one scalar that
//! has already been lifted out of the raw backend mapping (see
//! [`crate::canonical`]).

use crate::metadata::GenreTag;
use crate::vocab::{Genre, SentinelVocabulary, Vocabulary, GENRE_ALIASES};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Minimum similarity for a misspelled genre to count as a match
const GENRE_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Bounds applied to numeric descriptor fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationSettings {
    /// Earliest plausible release year
    #[serde(default = "default_year_floor")]
    pub year_floor: i32,

    /// Maximum number of results a request may ask for
    #[serde(default = "default_limit_cap")]
    pub limit_cap: u32,

    /// Fixed "current year" (tests); the calendar year when unset
    #[serde(default)]
    pub reference_year: Option<i32>,
}

fn default_year_floor() -> i32 {
    1900
}

fn default_limit_cap() -> u32 {
    10
}

impl Default for NormalizationSettings {
    fn default() -> Self {
        Self {
            year_floor: default_year_floor(),
            limit_cap: default_limit_cap(),
            reference_year: None,
        }
    }
}

impl NormalizationSettings {
    pub fn current_year(&self) -> i32 {
        self.reference_year
            .unwrap_or_else(|| chrono::Utc::now().year())
    }
}

/// Trim free text; empty or whitespace-only text is absent
pub fn normalize_text(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Map a free-text genre onto the genre vocabulary
///
/// Steps, first hit wins:
/// 1. exact case-insensitive vocabulary match
/// 2. exact alias match
/// 3. substring match either way against vocabulary labels, in declared order
/// 4. whole-word alias phrase inside the raw value, in alias table order
/// 5. closest spelling above [`GENRE_SIMILARITY_THRESHOLD`]
///
/// With no match the raw value is returned unchanged as
/// [`GenreTag::Unmapped`].
pub fn normalize_genre(raw: Option<&str>) -> Option<GenreTag> {
    let raw = raw?;
    let needle = raw.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let matched = Genre::lookup(&needle)
        .or_else(|| alias_exact(&needle))
        .or_else(|| vocabulary_containment(&needle))
        .or_else(|| alias_phrase(&needle))
        .or_else(|| closest_spelling(&needle));

    match matched {
        Some(genre) => {
            debug!(raw = %raw, genre = %genre, "Normalized genre");
            Some(GenreTag::Canonical(genre))
        }
        None => {
            let raw = raw.trim();
            warn!(genre = %raw, "Could not normalize genre, keeping raw value");
            Some(GenreTag::Unmapped(raw.to_string()))
        }
    }
}

fn alias_exact(needle: &str) -> Option<Genre> {
    GENRE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == needle)
        .map(|(_, genre)| *genre)
}

fn vocabulary_containment(needle: &str) -> Option<Genre> {
    Genre::ALL.iter().copied().find(|genre| {
        let label = genre.label().to_lowercase();
        label.contains(needle) || needle.contains(&label)
    })
}

fn alias_phrase(needle: &str) -> Option<Genre> {
    let padded = word_padded(needle);
    GENRE_ALIASES
        .iter()
        .find(|(alias, _)| padded.contains(&format!(" {} ", alias)))
        .map(|(_, genre)| *genre)
}

fn closest_spelling(needle: &str) -> Option<Genre> {
    let candidates = Genre::ALL
        .iter()
        .map(|genre| (genre.label().to_lowercase(), *genre))
        .chain(
            GENRE_ALIASES
                .iter()
                .map(|(alias, genre)| (alias.to_string(), *genre)),
        );

    let mut best: Option<(f64, Genre)> = None;
    for (candidate, genre) in candidates {
        let similarity = strsim::normalized_levenshtein(needle, &candidate);
        if similarity > GENRE_SIMILARITY_THRESHOLD
            && best.map_or(true, |(score, _)| similarity > score)
        {
            best = Some((similarity, genre));
        }
    }

    best.map(|(score, genre)| {
        debug!(raw = %needle, genre = %genre, similarity = score, "Fuzzy matched genre");
        genre
    })
}

/// Lowercased words separated by single spaces, with a leading and trailing
/// space so phrase lookups can match on word boundaries
fn word_padded(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '&' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    format!(" {} ", words.join(" "))
}

/// Strict vocabulary match with `Unknown` fallback
///
/// No substring or fuzzy matching: an unrecognized non-empty value becomes
/// the vocabulary's sentinel. Absent or blank input stays absent.
pub fn normalize_enum<V: SentinelVocabulary>(raw: Option<&str>) -> Option<V> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(V::lookup(trimmed).unwrap_or_else(|| {
        debug!(raw = %trimmed, "Value outside vocabulary, using Unknown");
        V::UNKNOWN
    }))
}

/// Replace implausible years with the current year
///
/// A year outside `[floor, current_year]` is treated as an unreliable
/// extraction; it is replaced, not clamped to the nearest bound.
pub fn normalize_year(raw: Option<i64>, floor: i32, current_year: i32) -> Option<i32> {
    let year = raw?;
    if year < i64::from(floor) || year > i64::from(current_year) {
        debug!(raw = year, current_year, "Year out of range, using current year");
        return Some(current_year);
    }
    i32::try_from(year).ok()
}

/// Cap the result limit; non-positive limits are absent
pub fn normalize_limit(raw: Option<i64>, cap: u32) -> Option<u32> {
    let limit = raw?;
    if limit <= 0 {
        return None;
    }
    if limit > i64::from(cap) {
        debug!(raw = limit, cap, "Limit above cap");
        return Some(cap);
    }
    u32::try_from(limit).ok()
}
