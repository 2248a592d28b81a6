//! Free-form prompt extractor
//!
//! Sends an instruction prompt listing the vocabularies, five worked
//! examples as prior chat turns, then the user text. The model answers
//! with unconstrained text, so the reply is parsed leniently: Markdown code
//! fences are stripped and the outermost `{...}` is taken.

use super::{ExtractError, Extractor, Pipeline};
use crate::backends::{CompletionOptions, CompletionRequest, LlmBackend, Message};
use async_trait::async_trait;
use mqx_common::vocab::labels;
use mqx_common::{ArtistOrigin, Genre, Language, Mood, MusicMetadata, Normalizer};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub struct PromptExtractor {
    pipeline: Pipeline,
    system_prompt: String,
    examples: Vec<Message>,
}

impl PromptExtractor {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        normalizer: Normalizer,
        options: CompletionOptions,
        compact: bool,
    ) -> Self {
        let origin = normalizer.origin();
        Self {
            pipeline: Pipeline::new(backend, normalizer, options, compact),
            system_prompt: system_prompt(origin),
            examples: example_turns(origin),
        }
    }

    fn request(&self, text: &str) -> CompletionRequest {
        let mut messages = Vec::with_capacity(self.examples.len() + 2);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(self.examples.iter().cloned());
        messages.push(Message::user(text));

        CompletionRequest {
            messages,
            schema: None,
            options: self.pipeline.options().clone(),
        }
    }
}

#[async_trait]
impl Extractor for PromptExtractor {
    fn name(&self) -> &str {
        "prompt"
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

        self.pipeline
            .run(self.name(), self.request(text), parse_lenient)
            .await
    }
}

fn system_prompt(origin: ArtistOrigin) -> String {
    let origin_line = match origin {
        ArtistOrigin::Country => "- country: Artist's country".to_string(),
        ArtistOrigin::Language => format!(
            "- language: Language the artist sings in (valid: {})",
            labels::<Language>().join(", ")
        ),
    };

    format!(
        "Extract music-related information from the user input text.\n\
         Only include fields that are explicitly mentioned or can be clearly inferred.\n\
         Reply with a single JSON object and nothing else.\n\
         \n\
         Track information (key \"track\"):\n\
         - name: Song or track name\n\
         - genre: Music genre (valid: {genres})\n\
         - mood: Mood or emotion (valid: {moods})\n\
         - year: Specific year mentioned (as integer)\n\
         \n\
         Artist information (key \"artist\", a list of objects):\n\
         - name: Artist's name\n\
         {origin_line}\n\
         \n\
         Other information:\n\
         - limit: Limit or quantity if mentioned (as integer)",
        genres = labels::<Genre>().join(", "),
        moods = labels::<Mood>().join(", "),
        origin_line = origin_line,
    )
}

/// Worked examples, rendered as alternating user/assistant turns
fn example_turns(origin: ArtistOrigin) -> Vec<Message> {
    let coldplay = match origin {
        ArtistOrigin::Country => json!({"name": "Coldplay", "country": "UK"}),
        ArtistOrigin::Language => json!({"name": "Coldplay", "language": "English"}),
    };

    let examples = [
        (
            "Mình đang tìm một bài pop buồn của Taylor Swift, phát hành khoảng năm 2020.",
            json!({
                "track": {"genre": "Pop", "mood": "Sad", "year": 2020},
                "artist": [{"name": "Taylor Swift"}]
            }),
        ),
        (
            "Gợi ý cho tôi 5 bài nhạc jazz nhẹ nhàng để nghe buổi tối.",
            json!({"track": {"genre": "Jazz", "mood": "Calm"}, "limit": 5}),
        ),
        (
            "Tôi muốn nghe bài “Yellow” của Coldplay, ban nhạc đến từ Anh.",
            json!({"track": {"name": "Yellow"}, "artist": [coldplay]}),
        ),
        (
            "Có bài nhạc EDM nào nghe sôi động để tập gym không?",
            json!({"track": {"genre": "Edm", "mood": "Energetic"}}),
        ),
        (
            "Cho mình khoảng 3 bài nhạc phát hành năm 2018, nghe thư giãn là được.",
            json!({"track": {"mood": "Calm", "year": 2018}, "limit": 3}),
        ),
    ];

    examples
        .into_iter()
        .flat_map(|(input, output)| [Message::user(input), Message::assistant(output.to_string())])
        .collect()
}

/// Parse a free-form completion into JSON
///
/// Accepts bare JSON, JSON inside a Markdown code fence, or JSON surrounded
/// by prose (the outermost braces are taken).
pub(crate) fn parse_lenient(completion: &str) -> Result<Value, ExtractError> {
    let body = strip_code_fence(completion.trim());

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Ok(value);
    }

    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&body[start..=end])
            .map_err(|e| ExtractError::Parse(e.to_string())),
        _ => Err(ExtractError::Parse(format!(
            "no JSON object in completion ({} chars)",
            completion.len()
        ))),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
