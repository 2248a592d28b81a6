//! Raw backend mapping → canonical descriptor
//!
//! Backends return loosely-typed JSON: keys may be missing, values may be
//! the wrong type, the artist may be an object or a list. This module lifts
//! each scalar out of that structure and runs it through
//! [`crate::normalize`].

use crate::metadata::{Artist, ArtistOrigin, MusicMetadata, Track};
use crate::normalize::{
    normalize_enum, normalize_genre, normalize_limit, normalize_text, normalize_year,
    NormalizationSettings,
};
use crate::vocab::{Language, Mood};
use crate::{Error, Result};
use serde_json::{Map, Value};
use tracing::debug;

/// Builds canonical descriptors from raw backend output
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    settings: NormalizationSettings,
    origin: ArtistOrigin,
}

impl Normalizer {
    pub fn new(settings: NormalizationSettings, origin: ArtistOrigin) -> Self {
        Self { settings, origin }
    }

    pub fn origin(&self) -> ArtistOrigin {
        self.origin
    }

    /// Convert a raw mapping into a normalized descriptor
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` when the root is not a JSON object.
    /// Anything below the root is tolerated: bad values become absent or
    /// fall back to their safe defaults.
    pub fn canonicalize(&self, raw: &Value) -> Result<MusicMetadata> {
        let root = raw.as_object().ok_or_else(|| {
            Error::InvalidInput(format!("expected a JSON object, got {}", json_kind(raw)))
        })?;

        let track = root
            .get("track")
            .and_then(Value::as_object)
            .map(|fields| self.track(fields));

        let artist = root.get("artist").and_then(|value| self.artists(value));

        // Few-shot prompts sometimes teach the model to nest the limit
        let raw_limit = root
            .get("limit")
            .filter(|value| !value.is_null())
            .or_else(|| root.get("other").and_then(|other| other.get("limit")));
        let limit = normalize_limit(raw_limit.and_then(lift_int), self.settings.limit_cap);

        let metadata = MusicMetadata {
            track,
            artist,
            limit,
        };

        debug!(
            has_track = metadata.track.is_some(),
            artist_count = metadata.artist.as_ref().map_or(0, Vec::len),
            limit = ?metadata.limit,
            "Canonicalized backend output"
        );

        Ok(metadata)
    }

    fn track(&self, fields: &Map<String, Value>) -> Track {
        Track {
            name: lift_text(fields.get("name")),
            genre: normalize_genre(lift_str(fields.get("genre"))),
            mood: normalize_enum::<Mood>(lift_str(fields.get("mood"))),
            year: normalize_year(
                fields.get("year").and_then(lift_int),
                self.settings.year_floor,
                self.settings.current_year(),
            ),
        }
    }

    fn artists(&self, value: &Value) -> Option<Vec<Artist>> {
        match value {
            Value::Object(fields) => Some(vec![self.artist(fields)]),
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|fields| self.artist(fields))
                    .collect(),
            ),
            Value::String(name) => {
                normalize_text(Some(name.as_str())).map(|name| vec![Artist::named(name)])
            }
            _ => None,
        }
    }

    fn artist(&self, fields: &Map<String, Value>) -> Artist {
        let origin = fields.get(self.origin.field_name());
        let (country, language) = match self.origin {
            ArtistOrigin::Country => (lift_text(origin), None),
            ArtistOrigin::Language => (None, normalize_enum::<Language>(lift_str(origin))),
        };

        Artist {
            name: lift_text(fields.get("name")),
            country,
            language,
        }
    }
}

/// String values only; anything else is absent
fn lift_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

/// Free text; numbers are accepted too (a song called "22")
fn lift_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => normalize_text(Some(text.as_str())),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Integers, finite floats (truncated) and numeric strings
fn lift_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().map(|_| i64::MAX))
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::GenreTag;
    use crate::vocab::Genre;
    use serde_json::json;

    fn normalizer(origin: ArtistOrigin) -> Normalizer {
        Normalizer::new(
            NormalizationSettings {
                reference_year: Some(2024),
                ..NormalizationSettings::default()
            },
            origin,
        )
    }

    #[test]
    fn test_full_backend_output() {
        let raw = json!({
            "track": {"name": "Hello", "genre": "hip hop", "mood": "happy", "year": 2015},
            "artist": {"name": "Adele", "language": "english"},
            "limit": 5
        });

        let metadata = normalizer(ArtistOrigin::Language).canonicalize(&raw).unwrap();
        let track = metadata.track.as_ref().unwrap();
        assert_eq!(track.name.as_deref(), Some("Hello"));
        assert_eq!(track.genre, Some(GenreTag::Canonical(Genre::HipHop)));
        assert_eq!(track.mood, Some(Mood::Happy));
        assert_eq!(track.year, Some(2015));

        let artist = metadata.primary_artist().unwrap();
        assert_eq!(artist.name.as_deref(), Some("Adele"));
        assert_eq!(artist.language, Some(Language::English));
        assert_eq!(artist.country, None);
        assert_eq!(metadata.limit, Some(5));
    }

    #[test]
    fn test_out_of_range_values() {
        let raw = json!({"track": {"year": 1800}, "limit": 99});
        let metadata = normalizer(ArtistOrigin::Language).canonicalize(&raw).unwrap();
        assert_eq!(metadata.track.unwrap().year, Some(2024));
        assert_eq!(metadata.limit, Some(10));
    }

    #[test]
    fn test_unknown_mood_and_language() {
        let raw = json!({
            "track": {"mood": "weird"},
            "artist": {"language": "klingon"}
        });
        let metadata = normalizer(ArtistOrigin::Language).canonicalize(&raw).unwrap();
        assert_eq!(metadata.track.as_ref().unwrap().mood, Some(Mood::Unknown));
        assert_eq!(metadata.primary_artist().unwrap().language, Some(Language::Unknown));
    }

    #[test]
    fn test_country_origin_is_free_text() {
        let raw = json!({"artist": {"name": "Coldplay", "country": " UK ", "language": "english"}});
        let metadata = normalizer(ArtistOrigin::Country).canonicalize(&raw).unwrap();
        let artist = metadata.primary_artist().unwrap();
        assert_eq!(artist.country.as_deref(), Some("UK"));
        assert_eq!(artist.language, None);
    }

    #[test]
    fn test_artist_shapes() {
        let n = normalizer(ArtistOrigin::Language);

        let list = n
            .canonicalize(&json!({"artist": [{"name": "Daft Punk"}, "junk", {"name": "Pharrell"}]}))
            .unwrap();
        let names: Vec<_> = list
            .artist
            .unwrap()
            .into_iter()
            .filter_map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Daft Punk", "Pharrell"]);

        let bare = n.canonicalize(&json!({"artist": "Sơn Tùng M-TP"})).unwrap();
        assert_eq!(bare.artist, Some(vec![Artist::named("Sơn Tùng M-TP")]));

        let wrong = n.canonicalize(&json!({"artist": 42})).unwrap();
        assert!(wrong.artist.is_none());
    }

    #[test]
    fn test_wrong_types_become_absent() {
        let raw = json!({
            "track": {"name": 22, "genre": ["pop"], "mood": true, "year": "2019"},
            "limit": "3"
        });
        let metadata = normalizer(ArtistOrigin::Language).canonicalize(&raw).unwrap();
        let track = metadata.track.unwrap();
        assert_eq!(track.name.as_deref(), Some("22"));
        assert_eq!(track.genre, None);
        assert_eq!(track.mood, None);
        assert_eq!(track.year, Some(2019));
        assert_eq!(metadata.limit, Some(3));
    }

    #[test]
    fn test_track_not_an_object_is_absent() {
        let metadata = normalizer(ArtistOrigin::Language)
            .canonicalize(&json!({"track": "Yellow"}))
            .unwrap();
        assert!(metadata.track.is_none());
    }

    #[test]
    fn test_nested_other_limit() {
        let raw = json!({"track": {"mood": "Calm", "year": 2018}, "other": {"limit": 3}});
        let metadata = normalizer(ArtistOrigin::Language).canonicalize(&raw).unwrap();
        assert_eq!(metadata.limit, Some(3));
    }

    #[test]
    fn test_float_and_huge_numbers() {
        let n = normalizer(ArtistOrigin::Language);
        let metadata = n.canonicalize(&json!({"limit": 4.7})).unwrap();
        assert_eq!(metadata.limit, Some(4));

        let metadata = n.canonicalize(&json!({"limit": 18446744073709551615u64})).unwrap();
        assert_eq!(metadata.limit, Some(10));
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        let n = normalizer(ArtistOrigin::Language);
        assert!(matches!(n.canonicalize(&json!([1, 2])), Err(Error::InvalidInput(_))));
        assert!(matches!(n.canonicalize(&json!("pop")), Err(Error::InvalidInput(_))));
        assert!(matches!(n.canonicalize(&Value::Null), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_unmapped_genre_is_trimmed() {
        let raw = json!({"track": {"genre": "  shoegaze  "}});
        let metadata = normalizer(ArtistOrigin::Language).canonicalize(&raw).unwrap();
        assert_eq!(
            metadata.genre(),
            Some(&GenreTag::Unmapped("shoegaze".to_string()))
        );
    }

    #[test]
    fn test_empty_object_is_empty_descriptor() {
        let metadata = normalizer(ArtistOrigin::Language).canonicalize(&json!({})).unwrap();
        assert_eq!(metadata, MusicMetadata::empty());
    }

    #[test]
    fn test_canonicalizing_canonical_output_is_a_no_op() {
        let n = normalizer(ArtistOrigin::Language);
        let raw = json!({
            "track": {"name": "Yellow", "genre": "lofi", "mood": "calm", "year": 2000},
            "artist": [{"name": "Coldplay", "language": "en"}],
            "limit": 7
        });
        let once = n.canonicalize(&raw).unwrap();
        let twice = n.canonicalize(&serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }
}
