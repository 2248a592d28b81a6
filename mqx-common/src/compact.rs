//! Compact projection: only populated fields
//!
//! An object whose leaves are all absent is itself absent at its parent;
//! the compact form never contains `null`, `{}` or `[]`.

use crate::metadata::{Artist, MusicMetadata, Track};
use serde_json::{Map, Value};
use tracing::warn;

/// Recursively drop nulls, then empty objects and arrays, bottom-up
///
/// Returns `None` when nothing populated remains.
pub fn compact_value(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(fields) => {
            let kept: Map<String, Value> = fields
                .into_iter()
                .filter_map(|(key, value)| compact_value(value).map(|value| (key, value)))
                .collect();
            (!kept.is_empty()).then_some(Value::Object(kept))
        }
        Value::Array(items) => {
            let kept: Vec<Value> = items.into_iter().filter_map(compact_value).collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        scalar => Some(scalar),
    }
}

impl MusicMetadata {
    /// Typed compact projection
    ///
    /// Empty track → absent, empty artists dropped, empty artist list →
    /// absent.
    pub fn compacted(self) -> Self {
        let track = self.track.filter(|track| !Track::is_empty(track));
        let artist = self
            .artist
            .map(|artists| {
                artists
                    .into_iter()
                    .filter(|artist| !Artist::is_empty(artist))
                    .collect::<Vec<_>>()
            })
            .filter(|artists| !artists.is_empty());

        Self {
            track,
            artist,
            limit: self.limit,
        }
    }

    /// JSON form; full keeps `null` for absent fields, compact drops them
    pub fn to_value(&self, compact: bool) -> Value {
        let full = serde_json::to_value(self).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to serialize descriptor");
            Value::Object(Map::new())
        });

        if compact {
            compact_value(full).unwrap_or_else(|| Value::Object(Map::new()))
        } else {
            full
        }
    }

    /// Compact JSON form; always an object, `{}` when nothing was extracted
    pub fn to_compact_value(&self) -> Value {
        self.to_value(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::GenreTag;
    use crate::vocab::{Genre, Mood};
    use serde_json::json;

    #[test]
    fn test_compact_value_removes_nested_empties() {
        let raw = json!({
            "track": {"name": null, "genre": "Pop", "mood": null, "year": null},
            "artist": [{"name": null}, {}],
            "limit": null
        });
        assert_eq!(compact_value(raw), Some(json!({"track": {"genre": "Pop"}})));
    }

    #[test]
    fn test_compact_value_of_all_absent_is_none() {
        assert_eq!(compact_value(json!({"track": {"name": null}, "artist": null})), None);
        assert_eq!(compact_value(Value::Null), None);
        assert_eq!(compact_value(json!([[], {}, null])), None);
    }

    #[test]
    fn test_compact_value_keeps_falsy_scalars() {
        assert_eq!(
            compact_value(json!({"a": 0, "b": false, "c": ""})),
            Some(json!({"a": 0, "b": false, "c": ""}))
        );
    }

    #[test]
    fn test_artist_entirely_absent_is_dropped() {
        let metadata = MusicMetadata {
            track: Some(Track {
                genre: Some(GenreTag::Canonical(Genre::HipHop)),
                ..Track::default()
            }),
            artist: Some(vec![Artist::default()]),
            limit: Some(5),
        };

        let compact = metadata.to_compact_value();
        assert_eq!(compact, json!({"track": {"genre": "Hip-Hop"}, "limit": 5}));
        assert!(compact.get("artist").is_none());
    }

    #[test]
    fn test_compacted_typed_projection() {
        let metadata = MusicMetadata {
            track: Some(Track::default()),
            artist: Some(vec![Artist::default(), Artist::named("Coldplay"), Artist::default()]),
            limit: None,
        };

        let compacted = metadata.compacted();
        assert!(compacted.track.is_none());
        assert_eq!(compacted.artist, Some(vec![Artist::named("Coldplay")]));

        let nothing = MusicMetadata {
            track: Some(Track::default()),
            artist: Some(vec![]),
            limit: None,
        }
        .compacted();
        assert_eq!(nothing, MusicMetadata::empty());
    }

    #[test]
    fn test_typed_and_json_projections_agree() {
        let metadata = MusicMetadata {
            track: Some(Track {
                mood: Some(Mood::Calm),
                ..Track::default()
            }),
            artist: Some(vec![Artist::default()]),
            limit: Some(3),
        };

        let via_json = metadata.to_compact_value();
        let via_typed = metadata.clone().compacted().to_value(false);
        assert_eq!(compact_value(via_typed), Some(via_json));
    }

    #[test]
    fn test_empty_descriptor_compacts_to_empty_object() {
        assert_eq!(MusicMetadata::empty().to_compact_value(), json!({}));
        assert_eq!(
            MusicMetadata::empty().to_value(false),
            json!({"track": null, "artist": null, "limit": null})
        );
    }
}
