//! LLM-based extraction.
//!
//! The extractor prompts an LLM for a JSON object with `entities`,
//! `relationships` and `events` arrays, then parses the response leniently:
//!
//! 1. Markdown code fences around the JSON are stripped
//! 2. Common syntax slips (single quotes, trailing commas) are repaired
//! 3. Mentions missing a required field are dropped with a warning
//! 4. A response that still cannot be parsed becomes an empty record

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use graphweave_core::error::WeaveResult;
use graphweave_core::graph::{EntityType, KNOWN_RELATIONS};
use graphweave_core::traits::{Extractor, GenerationOptions, Llm, ResponseFormat};
use graphweave_core::types::{Chunk, ExtractionRecord, Message, ParseMode};

/// Extractor that asks an LLM for structured mentions.
pub struct LlmExtractor {
    llm: Arc<dyn Llm>,
    name: String,
}

impl LlmExtractor {
    /// Create a new LLM extractor.
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        let name = format!("llm:{}", llm.model_name());
        Self { llm, name }
    }

    /// Generate the system prompt for extraction.
    fn system_prompt() -> String {
        let entity_types: Vec<&str> = EntityType::all().iter().map(|t| t.as_str()).collect();

        format!(
            r#"You are a knowledge graph extraction system. Extract the structure, capabilities and evolution of the organizations described in the text.

ENTITY TYPES: {}

RELATIONS (prefer these; fall back to related_to): {}

Output JSON in this exact format:
{{
  "entities": [
    {{"name": "Name", "type": "type", "attributes": {{"description": "brief summary", "tags": ["keyword"], "year": 2020}}}}
  ],
  "relationships": [
    {{"source": "Name", "target": "Name", "relation": "verb", "attributes": {{}}}}
  ],
  "events": [
    {{"name": "Launch <Name> (<Year>)", "type": "launch", "participants": ["Name"], "attributes": {{"year": 2020}}}}
  ]
}}

Rules:
1. Only extract explicitly mentioned entities
2. Every relationship endpoint must also appear in "entities"
3. Keep intermediary platform layers instead of linking everything to the company
4. Merge near-duplicates such as "Food delivery business" and "Food Delivery"
5. Put launches, acquisitions and IPOs in "events" and list the entities involved as participants
6. If nothing is found, return empty arrays

Return ONLY valid JSON, no other text."#,
            entity_types.join(", "),
            KNOWN_RELATIONS.join(", ")
        )
    }

    /// Parse an LLM response into a record for `chunk_id`.
    ///
    /// Never fails: unusable output is logged and yields an empty record.
    pub fn parse_response(chunk_id: &str, content: &str) -> ExtractionRecord {
        let content = content.trim();
        if content.is_empty() {
            return ExtractionRecord::new(chunk_id);
        }

        let json_str = extract_json(content);
        let value: Value = match serde_json::from_str(json_str) {
            Ok(v) => v,
            Err(e) => match lenient_parse(json_str) {
                Some(v) => v,
                None => {
                    tracing::warn!(chunk_id, error = %e, "Failed to parse extraction response");
                    return ExtractionRecord::new(chunk_id);
                }
            },
        };

        match ExtractionRecord::from_json(chunk_id, &value, ParseMode::Lenient) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(chunk_id, error = %e, "Extraction response has the wrong shape");
                ExtractionRecord::new(chunk_id)
            }
        }
    }
}

/// Extract JSON from a response (handles markdown code blocks).
fn extract_json(content: &str) -> &str {
    static JSON_BLOCK: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").unwrap());

    if let Some(m) = JSON_BLOCK.captures(content).and_then(|caps| caps.get(1)) {
        return m.as_str().trim();
    }
    content
}

/// Drop trailing commas and retry. Single quotes are swapped for double
/// quotes only if that still fails, so apostrophes inside names survive.
fn lenient_parse(json_str: &str) -> Option<Value> {
    static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([\]}])").unwrap());

    let fixed = TRAILING_COMMA.replace_all(json_str, "$1");
    if let Ok(value) = serde_json::from_str(&fixed) {
        return Some(value);
    }
    let requoted = fixed.replace('\'', "\"");
    serde_json::from_str(&requoted).ok()
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, chunk: &Chunk) -> WeaveResult<ExtractionRecord> {
        let text = chunk.text.trim();
        if text.is_empty() {
            tracing::debug!(chunk_id = %chunk.id, "Empty chunk text, skipping LLM call");
            return Ok(ExtractionRecord::new(chunk.id.clone()));
        }

        let messages = vec![
            Message::system(Self::system_prompt()),
            Message::user(format!(
                "Extract entities, relationships and events from this text:\n\n{}",
                text
            )),
        ];

        let options = GenerationOptions {
            temperature: Some(0.0),
            response_format: self
                .llm
                .supports_json_mode()
                .then_some(ResponseFormat::Json),
            ..Default::default()
        };

        tracing::info!(chunk_id = %chunk.id, model = self.llm.model_name(), "Extracting chunk with LLM");
        let response = self.llm.generate(&messages, Some(options)).await?;
        let record = Self::parse_response(&chunk.id, response.content_or_empty());
        tracing::debug!(
            chunk_id = %chunk.id,
            mentions = record.mention_count(),
            "Parsed extraction response"
        );
        Ok(record)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweave_core::error::WeaveError;
    use graphweave_core::traits::LlmResponse;
    use std::sync::Mutex;

    /// LLM returning a canned reply and recording the options it was called with.
    struct MockLlm {
        reply: Option<String>,
        seen: Mutex<Vec<GenerationOptions>>,
        json_mode: bool,
    }

    impl MockLlm {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                seen: Mutex::new(Vec::new()),
                json_mode: true,
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                seen: Mutex::new(Vec::new()),
                json_mode: true,
            }
        }
    }

    #[async_trait]
    impl Llm for MockLlm {
        async fn generate(
            &self,
            _messages: &[Message],
            options: Option<GenerationOptions>,
        ) -> WeaveResult<LlmResponse> {
            self.seen.lock().unwrap().push(options.unwrap_or_default());
            match &self.reply {
                Some(text) => Ok(LlmResponse::text(text.clone())),
                None => Err(WeaveError::llm("quota exceeded")),
            }
        }

        fn model_name(&self) -> &str {
            "mock-model"
        }

        fn supports_json_mode(&self) -> bool {
            self.json_mode
        }
    }

    #[tokio::test]
    async fn test_extract_parses_response() {
        let llm = Arc::new(MockLlm::replying(
            r#"{"entities": [{"name": "Swiggy", "type": "Company"}], "relationships": [], "events": []}"#,
        ));
        let extractor = LlmExtractor::new(llm.clone());
        let record = extractor.extract(&Chunk::new("1", "Swiggy delivers food.")).await.unwrap();

        assert_eq!(record.chunk_id, "1");
        assert_eq!(record.entities[0].name, "Swiggy");
        assert_eq!(extractor.name(), "llm:mock-model");

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, Some(0.0));
        assert_eq!(seen[0].response_format, Some(ResponseFormat::Json));
    }

    #[tokio::test]
    async fn test_no_json_mode_for_plain_models() {
        let mut llm = MockLlm::replying("{}");
        llm.json_mode = false;
        let llm = Arc::new(llm);
        LlmExtractor::new(llm.clone())
            .extract(&Chunk::new("1", "text"))
            .await
            .unwrap();
        assert_eq!(llm.seen.lock().unwrap()[0].response_format, None);
    }

    #[tokio::test]
    async fn test_empty_text_skips_llm() {
        let llm = Arc::new(MockLlm::replying("{}"));
        let record = LlmExtractor::new(llm.clone())
            .extract(&Chunk::new("7", "   "))
            .await
            .unwrap();
        assert!(record.is_empty());
        assert!(llm.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_llm_error_propagates() {
        let extractor = LlmExtractor::new(Arc::new(MockLlm::failing()));
        let err = extractor.extract(&Chunk::new("1", "text")).await.unwrap_err();
        assert!(matches!(err, WeaveError::Llm { .. }));
        assert!(err.is_chunk_scoped());
    }

    #[test]
    fn test_parse_code_fenced_response() {
        let content = "Here you go:\n```json\n{\"entities\": [{\"name\": \"Instamart\", \"type\": \"Service\"}]}\n```";
        let record = LlmExtractor::parse_response("2", content);
        assert_eq!(record.entities.len(), 1);
        assert_eq!(record.entities[0].entity_type, "Service");
    }

    #[test]
    fn test_parse_repairs_trailing_commas() {
        let content = r#"{"entities": [{"name": "Genie", "type": "Service",},], "relationships": [],}"#;
        let record = LlmExtractor::parse_response("3", content);
        assert_eq!(record.entities[0].name, "Genie");
    }

    #[test]
    fn test_parse_keeps_apostrophes_when_fixing_commas() {
        let content = r#"{"entities": [{"name": "Swiggy's Genie", "type": "Service",},]}"#;
        let record = LlmExtractor::parse_response("3", content);
        assert_eq!(record.entities[0].name, "Swiggy's Genie");
    }

    #[test]
    fn test_parse_repairs_single_quotes() {
        let content = "{'entities': [{'name': 'Genie', 'type': 'Service'}]}";
        let record = LlmExtractor::parse_response("3", content);
        assert_eq!(record.entities[0].name, "Genie");
    }

    #[test]
    fn test_parse_drops_invalid_mentions() {
        let content = r#"{
            "entities": [{"name": "Swiggy", "type": "Company"}, {"type": "Service"}],
            "relationships": [{"source": "Swiggy", "relation": "offers"}]
        }"#;
        let record = LlmExtractor::parse_response("4", content);
        assert_eq!(record.entities.len(), 1);
        assert!(record.relationships.is_empty());
    }

    #[test]
    fn test_unusable_response_is_empty_record() {
        assert!(LlmExtractor::parse_response("5", "I could not find anything.").is_empty());
        assert!(LlmExtractor::parse_response("5", "").is_empty());
        assert!(LlmExtractor::parse_response("5", "[1, 2, 3]").is_empty());
    }

    #[test]
    fn test_prompt_lists_vocabulary() {
        let prompt = LlmExtractor::system_prompt();
        assert!(prompt.contains("organization"));
        assert!(prompt.contains("enabled_by"));
        assert!(prompt.contains("\"participants\""));
    }
}
