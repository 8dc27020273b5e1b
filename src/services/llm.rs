use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

const STORY_MODEL: &str = "gemini-2.5-flash";

/// Text-generation service. Returns the raw model text; the caller
/// owns prompt construction and response validation.
#[async_trait]
pub trait TextGenClient: Send + Sync + Debug {
    async fn generate(&self, prompt: &str, api_key: &str) -> Result<String>;
}

/// Structured story payload the model must return. The shape is a
/// contract; the prompt wording around it is tuning.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoryContent {
    pub title: String,
    pub scenes: Vec<SceneDraft>,
    pub characters: Vec<CharacterDraft>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneDraft {
    pub text: String,
    pub image_prompt: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CharacterDraft {
    pub name: String,
    pub description: String,
}

/// Models sometimes wrap JSON in markdown fences despite being told
/// not to.
pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else {
        s.to_string()
    }
}

// --- Gemini ---

#[derive(Debug)]
pub struct GeminiClient {
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            model: STORY_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    text: String,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

/// Response schema sent alongside the prompt so the model emits
/// `StoryContent`-shaped JSON directly.
fn story_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "scenes": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "text": { "type": "STRING" },
                        "imagePrompt": { "type": "STRING" }
                    },
                    "required": ["text", "imagePrompt"]
                }
            },
            "characters": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "description": { "type": "STRING" }
                    },
                    "required": ["name", "description"]
                }
            }
        },
        "required": ["title", "scenes", "characters"]
    })
}

#[async_trait]
impl TextGenClient for GeminiClient {
    async fn generate(&self, prompt: &str, api_key: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, api_key
        );

        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: story_schema(),
                temperature: 0.8,
            },
        };

        let resp = self.client.post(&url).json(&request_body).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("Gemini API error: {}", error_text));
        }

        let response_text = resp.text().await?;
        let result: GeminiResponse = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                return Err(anyhow!(
                    "Failed to parse Gemini response: {}. Body: {}",
                    e,
                    response_text
                ))
            }
        };

        if let Some(err) = result.error {
            return Err(anyhow!("Gemini API returned error: {}", err.message));
        }

        if let Some(candidates) = result.candidates {
            if let Some(first) = candidates.first() {
                if let Some(content) = &first.content {
                    if let Some(part) = content.parts.first() {
                        return Ok(part.text.clone());
                    }
                }
                let reason = first.finish_reason.as_deref().unwrap_or("UNKNOWN");
                return Err(anyhow!("Gemini response empty. Finish reason: {}", reason));
            }
        }

        Err(anyhow!(
            "Gemini response format unexpected or empty. Body: {}",
            response_text
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_code_blocks_handles_fences() {
        assert_eq!(strip_code_blocks("json"), "json");
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("  ```json  \n  {}  \n  ```  "), "{}");
    }

    #[test]
    fn gemini_response_parsing_safety_block() {
        let json = r#"{
            "candidates": [
                {
                    "finishReason": "SAFETY",
                    "index": 0
                }
            ]
        }"#;

        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        let candidate = &result.candidates.as_ref().unwrap()[0];

        assert!(candidate.content.is_none());
        assert_eq!(candidate.finish_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn gemini_response_parsing_success() {
        let json = r#"{
            "candidates": [
                {
                    "content": {
                        "parts": [
                            { "text": "{\"title\":\"T\"}" }
                        ],
                        "role": "model"
                    },
                    "finishReason": "STOP",
                    "index": 0
                }
            ]
        }"#;

        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        let candidate = &result.candidates.as_ref().unwrap()[0];

        assert_eq!(
            candidate.content.as_ref().unwrap().parts[0].text,
            "{\"title\":\"T\"}"
        );
    }

    #[test]
    fn gemini_error_body_parses() {
        let json = r#"{ "error": { "message": "API key not valid" } }"#;
        let result: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(result.error.unwrap().message, "API key not valid");
    }

    #[test]
    fn story_content_deserializes_camel_case() {
        let json = r#"{
            "title": "The Brave Snail",
            "scenes": [
                { "text": "Once upon a time", "imagePrompt": "a snail on a leaf" }
            ],
            "characters": [
                { "name": "Sammy", "description": "a small brown snail" }
            ]
        }"#;

        let content: StoryContent = serde_json::from_str(json).unwrap();
        assert_eq!(content.scenes[0].image_prompt, "a snail on a leaf");
        assert_eq!(content.characters[0].name, "Sammy");
    }

    #[test]
    fn story_schema_lists_required_fields() {
        let schema = story_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
    }
}
