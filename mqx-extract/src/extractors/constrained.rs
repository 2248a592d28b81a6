//! Constrained-decoding extractor
//!
//! Sends the descriptor JSON schema with every request so the backend can
//! only decode schema-shaped JSON. The grammar fixes the shape, not the
//! alias policy, so the result still goes through the normalizer.

use super::schema::metadata_schema;
use super::{ExtractError, Extractor, Pipeline};
use crate::backends::{CompletionOptions, CompletionRequest, LlmBackend, Message};
use async_trait::async_trait;
use mqx_common::{MusicMetadata, Normalizer};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const INSTRUCTION: &str = "Extract the music the user is asking for as JSON. \
     Only fill fields that are mentioned or clearly implied; use null otherwise.";

pub struct ConstrainedExtractor {
    pipeline: Pipeline,
    schema: Value,
}

impl ConstrainedExtractor {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        normalizer: Normalizer,
        options: CompletionOptions,
        compact: bool,
    ) -> Self {
        let schema = metadata_schema(normalizer.origin());
        Self {
            pipeline: Pipeline::new(backend, normalizer, options, compact),
            schema,
        }
    }

    fn request(&self, text: &str) -> CompletionRequest {
        CompletionRequest {
            messages: vec![Message::system(INSTRUCTION), Message::user(text)],
            schema: Some(self.schema.clone()),
            options: self.pipeline.options().clone(),
        }
    }
}

#[async_trait]
impl Extractor for ConstrainedExtractor {
    fn name(&self) -> &str {
        "constrained"
    }

    fn is_compact(&self) -> bool {
        self.pipeline.compact()
    }

    async fn extract(&self, text: &str) -> MusicMetadata {
        let text = text.trim();
        if text.is_empty() {
            debug!("Empty input, skipping backend call");
            return MusicMetadata::empty();
        }

        debug!(
            origin = self.pipeline.normalizer().origin().field_name(),
            "Running constrained extraction"
        );
        self.pipeline
            .run(self.name(), self.request(text), parse_strict)
            .await
    }
}

/// Decoder output is grammar-bound, so anything other than plain JSON is
/// a backend fault
fn parse_strict(completion: &str) -> Result<Value, ExtractError> {
    serde_json::from_str(completion.trim()).map_err(|e| ExtractError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::mock::ScriptedBackend;
    use mqx_common::{ArtistOrigin, Language, NormalizationSettings};

    fn extractor(backend: Arc<ScriptedBackend>, origin: ArtistOrigin) -> ConstrainedExtractor {
        ConstrainedExtractor::new(
            backend,
            Normalizer::new(NormalizationSettings::default(), origin),
            CompletionOptions::default(),
            true,
        )
    }

    #[test]
    fn test_parse_strict_rejects_fenced_json() {
        assert!(parse_strict(" {\"limit\": 2} ").is_ok());
        assert!(matches!(
            parse_strict("```json\n{}\n```"),
            Err(ExtractError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_request_carries_schema() {
        let backend = Arc::new(ScriptedBackend::replying("{}"));
        extractor(backend.clone(), ArtistOrigin::Country)
            .extract("Coldplay songs")
            .await;

        let request = backend.last_request().unwrap();
        assert_eq!(request.schema, Some(metadata_schema(ArtistOrigin::Country)));
        assert_eq!(request.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_text_skips_backend() {
        let backend = Arc::new(ScriptedBackend::replying("{}"));
        let extractor = extractor(backend.clone(), ArtistOrigin::Language);

        assert!(extractor.extract("").await.is_empty());
        assert!(extractor.extract(" \n\t ").await.is_empty());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_artist_language_is_normalized() {
        let backend = Arc::new(ScriptedBackend::replying(
            r#"{"artist": [{"name": "Sơn Tùng M-TP", "language": "vi"}], "limit": 40}"#,
        ));
        let metadata = extractor(backend, ArtistOrigin::Language)
            .extract("40 bài của Sơn Tùng")
            .await;

        let artist = metadata.primary_artist().unwrap();
        assert_eq!(artist.name.as_deref(), Some("Sơn Tùng M-TP"));
        assert_eq!(artist.language, Some(Language::Vietnamese));
        assert_eq!(metadata.limit, Some(10));
    }

    #[tokio::test]
    async fn test_truncated_reply_is_empty() {
        let backend = Arc::new(ScriptedBackend::replying(r#"{"track": {"genre": "Po"#));
        assert!(extractor(backend, ArtistOrigin::Language)
            .extract("pop")
            .await
            .is_empty());
    }
}
