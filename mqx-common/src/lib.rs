//! # MQX Common Library
//!
//! Shared code for the music query extraction service:
//! - Controlled vocabularies (genre, mood, language)
//! - Canonical descriptor types (`MusicMetadata`, `Track`, `Artist`)
//! - Normalization of untrusted backend values
//! - Compact projection for API responses
//! - Configuration loading

pub mod canonical;
pub mod compact;
pub mod config;
pub mod error;
pub mod metadata;
pub mod normalize;
pub mod vocab;

pub use canonical::Normalizer;
pub use compact::compact_value;
pub use error::{Error, Result};
pub use metadata::{Artist, ArtistOrigin, GenreTag, MusicMetadata, Track};
pub use normalize::NormalizationSettings;
pub use vocab::{Genre, Language, Mood, SentinelVocabulary, Vocabulary};
