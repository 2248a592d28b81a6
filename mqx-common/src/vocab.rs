//! Controlled vocabularies for genre, mood and language
//!
//! Every enum-bearing descriptor field is normalized onto one of these
//! fixed sets. Declaration order is significant: vocabulary scans walk
//! `ALL` front to back and the first hit wins.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed, ordered set of accepted values for a descriptor field
pub trait Vocabulary: Copy + Eq + Sized + 'static {
    /// Every entry, in declared order
    const ALL: &'static [Self];

    /// Canonical label (the exact string emitted downstream)
    fn label(self) -> &'static str;

    /// Extra spellings accepted by exact lookup (e.g. ISO codes)
    fn alternate_labels(self) -> &'static [&'static str] {
        &[]
    }

    /// Exact, case-insensitive lookup against labels and alternate labels
    fn lookup(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        Self::ALL.iter().copied().find(|entry| {
            entry.label().to_lowercase() == needle
                || entry
                    .alternate_labels()
                    .iter()
                    .any(|alt| alt.to_lowercase() == needle)
        })
    }
}

/// Vocabulary with an explicit `Unknown` fallback entry
pub trait SentinelVocabulary: Vocabulary {
    const UNKNOWN: Self;
}

// ============================================================================
// Genre
// ============================================================================

/// Music genre (12 entries, no sentinel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Ballad,
    Pop,
    Rock,
    Edm,
    #[serde(rename = "Hip-Hop")]
    HipHop,
    #[serde(rename = "R&B")]
    RnB,
    Jazz,
    Classical,
    Acoustic,
    #[serde(rename = "Lo-Fi")]
    LoFi,
    Indie,
    Metal,
}

impl Vocabulary for Genre {
    const ALL: &'static [Self] = &[
        Genre::Ballad,
        Genre::Pop,
        Genre::Rock,
        Genre::Edm,
        Genre::HipHop,
        Genre::RnB,
        Genre::Jazz,
        Genre::Classical,
        Genre::Acoustic,
        Genre::LoFi,
        Genre::Indie,
        Genre::Metal,
    ];

    fn label(self) -> &'static str {
        match self {
            Genre::Ballad => "Ballad",
            Genre::Pop => "Pop",
            Genre::Rock => "Rock",
            Genre::Edm => "Edm",
            Genre::HipHop => "Hip-Hop",
            Genre::RnB => "R&B",
            Genre::Jazz => "Jazz",
            Genre::Classical => "Classical",
            Genre::Acoustic => "Acoustic",
            Genre::LoFi => "Lo-Fi",
            Genre::Indie => "Indie",
            Genre::Metal => "Metal",
        }
    }
}

/// Genre alias table, consulted in order (first match wins)
///
/// Keys are lowercase. Identity entries are kept so that the table alone
/// covers every spelling the prompt examples use.
pub const GENRE_ALIASES: &[(&str, Genre)] = &[
    ("edm", Genre::Edm),
    ("electronic", Genre::Edm),
    ("electronica", Genre::Edm),
    ("electro", Genre::Edm),
    ("dance", Genre::Edm),
    ("hiphop", Genre::HipHop),
    ("hip hop", Genre::HipHop),
    ("hip-hop", Genre::HipHop),
    ("rap", Genre::HipHop),
    ("trap", Genre::HipHop),
    ("rnb", Genre::RnB),
    ("r&b", Genre::RnB),
    ("r and b", Genre::RnB),
    ("rhythm and blues", Genre::RnB),
    ("soul", Genre::RnB),
    ("lofi", Genre::LoFi),
    ("lo-fi", Genre::LoFi),
    ("lo fi", Genre::LoFi),
    ("indie", Genre::Indie),
    ("ballad", Genre::Ballad),
    ("pop", Genre::Pop),
    ("rock", Genre::Rock),
    ("jazz", Genre::Jazz),
    ("classical", Genre::Classical),
    ("acoustic", Genre::Acoustic),
    ("heavy metal", Genre::Metal),
    ("metal", Genre::Metal),
];

// ============================================================================
// Mood
// ============================================================================

/// Mood or emotion of the requested music
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    Sad,
    Energetic,
    Calm,
    Angry,
    Melancholic,
    Peaceful,
    Romantic,
    Unknown,
}

impl Vocabulary for Mood {
    const ALL: &'static [Self] = &[
        Mood::Happy,
        Mood::Sad,
        Mood::Energetic,
        Mood::Calm,
        Mood::Angry,
        Mood::Melancholic,
        Mood::Peaceful,
        Mood::Romantic,
        Mood::Unknown,
    ];

    fn label(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Sad => "Sad",
            Mood::Energetic => "Energetic",
            Mood::Calm => "Calm",
            Mood::Angry => "Angry",
            Mood::Melancholic => "Melancholic",
            Mood::Peaceful => "Peaceful",
            Mood::Romantic => "Romantic",
            Mood::Unknown => "Unknown",
        }
    }
}

impl SentinelVocabulary for Mood {
    const UNKNOWN: Self = Mood::Unknown;
}

// ============================================================================
// Language
// ============================================================================

/// Language sung by an artist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Spanish,
    French,
    German,
    Italian,
    Portuguese,
    Russian,
    Japanese,
    Korean,
    Chinese,
    Vietnamese,
    Thai,
    Hindi,
    Arabic,
    Turkish,
    Swedish,
    Polish,
    Dutch,
    Greek,
    Unknown,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Italian => "it",
            Language::Portuguese => "pt",
            Language::Russian => "ru",
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::Chinese => "zh",
            Language::Vietnamese => "vi",
            Language::Thai => "th",
            Language::Hindi => "hi",
            Language::Arabic => "ar",
            Language::Turkish => "tr",
            Language::Swedish => "sv",
            Language::Polish => "pl",
            Language::Dutch => "nl",
            Language::Greek => "el",
            Language::Unknown => "unknown",
        }
    }
}

impl Vocabulary for Language {
    const ALL: &'static [Self] = &[
        Language::English,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Italian,
        Language::Portuguese,
        Language::Russian,
        Language::Japanese,
        Language::Korean,
        Language::Chinese,
        Language::Vietnamese,
        Language::Thai,
        Language::Hindi,
        Language::Arabic,
        Language::Turkish,
        Language::Swedish,
        Language::Polish,
        Language::Dutch,
        Language::Greek,
        Language::Unknown,
    ];

    fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Italian => "Italian",
            Language::Portuguese => "Portuguese",
            Language::Russian => "Russian",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::Chinese => "Chinese",
            Language::Vietnamese => "Vietnamese",
            Language::Thai => "Thai",
            Language::Hindi => "Hindi",
            Language::Arabic => "Arabic",
            Language::Turkish => "Turkish",
            Language::Swedish => "Swedish",
            Language::Polish => "Polish",
            Language::Dutch => "Dutch",
            Language::Greek => "Greek",
            Language::Unknown => "Unknown",
        }
    }

    fn alternate_labels(self) -> &'static [&'static str] {
        match self {
            Language::English => &["en"],
            Language::Spanish => &["es"],
            Language::French => &["fr"],
            Language::German => &["de"],
            Language::Italian => &["it"],
            Language::Portuguese => &["pt"],
            Language::Russian => &["ru"],
            Language::Japanese => &["ja"],
            Language::Korean => &["ko"],
            Language::Chinese => &["zh"],
            Language::Vietnamese => &["vi"],
            Language::Thai => &["th"],
            Language::Hindi => &["hi"],
            Language::Arabic => &["ar"],
            Language::Turkish => &["tr"],
            Language::Swedish => &["sv"],
            Language::Polish => &["pl"],
            Language::Dutch => &["nl"],
            Language::Greek => &["el"],
            Language::Unknown => &[],
        }
    }
}

impl SentinelVocabulary for Language {
    const UNKNOWN: Self = Language::Unknown;
}

macro_rules! display_label {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_label!(Genre, Mood, Language);

/// Labels in declared order, used when describing a vocabulary to a model
pub fn labels<V: Vocabulary>() -> Vec<&'static str> {
    V::ALL.iter().map(|entry| entry.label()).collect()
}
