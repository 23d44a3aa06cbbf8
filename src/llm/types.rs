//! Wire types for the Gemini `generateContent` endpoint.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// One part of a turn: either text or inline binary content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Inline binary part; raw bytes are base64-encoded here, at the wire
    /// boundary, and nowhere else.
    pub fn inline(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Part::InlineData {
            inline_data: Blob {
                mime_type: mime_type.into(),
                data: BASE64.encode(bytes),
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

/// A role-tagged turn in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: "user".to_string(),
            parts,
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: "model".to_string(),
            parts,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(rename = "googleSearch")]
    pub google_search: serde_json::Value,
}

impl Tool {
    pub fn google_search() -> Self {
        Self {
            google_search: serde_json::json!({}),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: i32,
}

/// Per-request configuration. The provider rejects search grounding
/// combined with custom instructions or sampling parameters, so the two
/// shapes are disjoint variants rather than optional fields.
#[derive(Debug, Clone)]
pub enum RequestConfig {
    /// Delegate retrieval to the provider's search tool; nothing else may
    /// be set.
    SearchGrounded,
    /// Fixed system instruction plus generation parameters, no search.
    Instructed { system_instruction: String },
}

const TEMPERATURE: f64 = 0.45;
const TOP_P: f64 = 0.9;
const TOP_K: i32 = 40;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl GenerateContentRequest {
    pub fn new(contents: Vec<Content>, config: RequestConfig) -> Self {
        match config {
            RequestConfig::SearchGrounded => Self {
                contents,
                system_instruction: None,
                generation_config: None,
                tools: Some(vec![Tool::google_search()]),
            },
            RequestConfig::Instructed { system_instruction } => Self {
                contents,
                system_instruction: Some(Content::user(vec![Part::text(system_instruction)])),
                generation_config: Some(GenerationConfig {
                    temperature: TEMPERATURE,
                    top_p: TOP_P,
                    top_k: TOP_K,
                }),
                tools: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if any.
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.as_ref()?.first()?;
        let content = candidate.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.as_text())
            .collect::<Vec<_>>()
            .join("");
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub safety_ratings: Option<Vec<SafetyRating>>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<GroundingWeb>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroundingWeb {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_config_carries_only_tools() {
        let request = GenerateContentRequest::new(
            vec![Content::user(vec![Part::text("hi")])],
            RequestConfig::SearchGrounded,
        );
        let value = serde_json::to_value(&request).unwrap();

        assert!(value.get("systemInstruction").is_none());
        assert!(value.get("generationConfig").is_none());
        assert_eq!(value["tools"], json!([{ "googleSearch": {} }]));
    }

    #[test]
    fn test_instructed_config_carries_no_tools() {
        let request = GenerateContentRequest::new(
            vec![Content::user(vec![Part::text("hi")])],
            RequestConfig::Instructed {
                system_instruction: "Be helpful.".to_string(),
            },
        );
        let value = serde_json::to_value(&request).unwrap();

        assert!(value.get("tools").is_none());
        assert_eq!(value["generationConfig"]["temperature"], json!(0.45));
        assert_eq!(value["generationConfig"]["topP"], json!(0.9));
        assert_eq!(value["generationConfig"]["topK"], json!(40));
        assert_eq!(
            value["systemInstruction"]["parts"][0]["text"],
            json!("Be helpful.")
        );
    }

    #[test]
    fn test_inline_part_is_base64_encoded() {
        let part = Part::inline("image/png", &[0xDE, 0xAD, 0xBE, 0xEF]);
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["inlineData"]["mimeType"], "image/png");
        assert_eq!(value["inlineData"]["data"], "3q2+7w==");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "Hello " }, { "text": "world" }]
                },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello world"));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .unwrap();
        assert!(response.text().is_none());
        assert_eq!(
            response
                .prompt_feedback
                .unwrap()
                .block_reason
                .as_deref(),
            Some("SAFETY")
        );
    }
}
