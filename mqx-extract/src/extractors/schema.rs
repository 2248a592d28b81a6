//! JSON schema for constrained decoding
//!
//! Restricts the backend to descriptor-shaped output. The enum lists only
//! bound the decoder; the normalizer still runs over everything it emits.

use mqx_common::vocab::labels;
use mqx_common::{ArtistOrigin, Genre, Language, Mood, Vocabulary};
use serde_json::{json, Value};

/// Descriptor schema with the artist origin field chosen by `origin`
pub fn metadata_schema(origin: ArtistOrigin) -> Value {
    let origin_property = match origin {
        ArtistOrigin::Country => nullable_string(),
        ArtistOrigin::Language => nullable_enum::<Language>(),
    };

    json!({
        "type": "object",
        "properties": {
            "track": {
                "type": ["object", "null"],
                "properties": {
                    "name": nullable_string(),
                    "genre": nullable_enum::<Genre>(),
                    "mood": nullable_enum::<Mood>(),
                    "year": {"type": ["integer", "null"]}
                },
                "additionalProperties": false
            },
            "artist": {
                "type": ["array", "null"],
                "items": {
                    "type": "object",
                    "properties": {
                        "name": nullable_string(),
                        origin.field_name(): origin_property
                    },
                    "additionalProperties": false
                }
            },
            "limit": {"type": ["integer", "null"], "minimum": 1}
        },
        "additionalProperties": false
    })
}

fn nullable_string() -> Value {
    json!({"type": ["string", "null"]})
}

fn nullable_enum<V: Vocabulary>() -> Value {
    let mut values: Vec<Value> = labels::<V>().into_iter().map(Value::from).collect();
    values.push(Value::Null);
    json!({"type": ["string", "null"], "enum": values})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lists_vocabulary_labels() {
        let schema = metadata_schema(ArtistOrigin::Language);
        let genres = schema["properties"]["track"]["properties"]["genre"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(genres.len(), Genre::ALL.len() + 1);
        assert!(genres.contains(&json!("R&B")));
        assert!(genres.contains(&Value::Null));
    }

    #[test]
    fn test_schema_origin_field_follows_config() {
        let schema = metadata_schema(ArtistOrigin::Country);
        let artist = &schema["properties"]["artist"]["items"]["properties"];
        assert!(artist.get("country").is_some());
        assert!(artist.get("language").is_none());

        let schema = metadata_schema(ArtistOrigin::Language);
        let artist = &schema["properties"]["artist"]["items"]["properties"];
        assert!(artist.get("language").is_some());
        assert!(artist.get("country").is_none());
    }
}
