//! Canonical music-search descriptor
//!
//! Built once per extraction call from raw backend output, then handed to
//! the caller. Every field is optional; `MusicMetadata::default()` means
//! "nothing extracted" and is a valid result, not an error.

use crate::vocab::{Genre, Language, Mood, Vocabulary};
use serde::{Deserialize, Deserializer, Serialize};

/// Root descriptor returned by every extractor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicMetadata {
    /// Track information
    #[serde(default)]
    pub track: Option<Track>,
    /// Artists, in the order they were mentioned
    #[serde(default, deserialize_with = "one_or_many")]
    pub artist: Option<Vec<Artist>>,
    /// Number of results requested
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Track information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Song/track name (free text)
    #[serde(default)]
    pub name: Option<String>,
    /// Genre, canonical unless no vocabulary entry matched
    #[serde(default)]
    pub genre: Option<GenreTag>,
    /// Mood, always a vocabulary member once normalized
    #[serde(default)]
    pub mood: Option<Mood>,
    /// Release year, within `[year_floor, current_year]` once normalized
    #[serde(default)]
    pub year: Option<i32>,
}

/// Artist information
///
/// Only one origin field is populated, chosen by [`ArtistOrigin`] in the
/// extractor configuration. The inactive one never appears in output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    /// Artist/musician name (free text)
    #[serde(default)]
    pub name: Option<String>,
    /// Country of origin (free text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Language sung
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

/// Which artist-origin field the deployment extracts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtistOrigin {
    /// Free-text `country`
    Country,
    /// Vocabulary-matched `language`
    #[default]
    Language,
}

impl ArtistOrigin {
    /// Key used in raw backend output and in serialized descriptors
    pub fn field_name(self) -> &'static str {
        match self {
            ArtistOrigin::Country => "country",
            ArtistOrigin::Language => "language",
        }
    }
}

/// Normalized genre value
///
/// Genre is the one field allowed to carry text outside its vocabulary, so
/// downstream consumers can still display a genre nobody mapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenreTag {
    Canonical(Genre),
    Unmapped(String),
}

impl GenreTag {
    pub fn as_str(&self) -> &str {
        match self {
            GenreTag::Canonical(genre) => genre.label(),
            GenreTag::Unmapped(raw) => raw,
        }
    }

    /// Vocabulary entry, if the genre was mapped
    pub fn canonical(&self) -> Option<Genre> {
        match self {
            GenreTag::Canonical(genre) => Some(*genre),
            GenreTag::Unmapped(_) => None,
        }
    }
}

impl From<Genre> for GenreTag {
    fn from(genre: Genre) -> Self {
        GenreTag::Canonical(genre)
    }
}

impl MusicMetadata {
    /// The "nothing extracted" descriptor
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no field is populated at any depth
    pub fn is_empty(&self) -> bool {
        self.track.as_ref().map_or(true, Track::is_empty)
            && self
                .artist
                .as_ref()
                .map_or(true, |artists| artists.iter().all(Artist::is_empty))
            && self.limit.is_none()
    }

    /// First artist, the common case for single-artist requests
    pub fn primary_artist(&self) -> Option<&Artist> {
        self.artist.as_ref().and_then(|artists| artists.first())
    }

    /// Normalized genre of the track, if any
    pub fn genre(&self) -> Option<&GenreTag> {
        self.track.as_ref().and_then(|track| track.genre.as_ref())
    }
}

impl Track {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.genre.is_none() && self.mood.is_none() && self.year.is_none()
    }
}

impl Artist {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.country.is_none() && self.language.is_none()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Accept either a single artist object or a list of them
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<Artist>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Artist),
        Many(Vec<Artist>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(artist)) => Some(vec![artist]),
        Some(OneOrMany::Many(artists)) => Some(artists),
    })
}
