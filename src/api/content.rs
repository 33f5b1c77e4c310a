//! Generate-Content Types
//!
//! Caller-facing prompt types and the Gemini-style wire format for
//! `models/{model}:generateContent` requests and responses.

use serde::{Deserialize, Serialize};

/// A prompt supplied by the caller.
#[derive(Debug, Clone)]
pub enum Prompt {
    /// Plain text prompt
    Text(String),

    /// Ordered sequence of text and inline image parts (vision requests)
    Parts(Vec<PromptPart>),
}

impl Prompt {
    /// Build a text-only prompt.
    pub fn text(s: impl Into<String>) -> Self {
        Prompt::Text(s.into())
    }

    /// True when the prompt carries at least one inline image part.
    pub fn has_images(&self) -> bool {
        match self {
            Prompt::Text(_) => false,
            Prompt::Parts(parts) => parts
                .iter()
                .any(|p| matches!(p, PromptPart::InlineImage { .. })),
        }
    }
}

impl From<&str> for Prompt {
    fn from(s: &str) -> Self {
        Prompt::Text(s.to_string())
    }
}

impl From<String> for Prompt {
    fn from(s: String) -> Self {
        Prompt::Text(s)
    }
}

/// One part of a multimodal prompt.
#[derive(Debug, Clone)]
pub enum PromptPart {
    /// Text segment
    Text(String),

    /// Inline image payload, already base64-encoded by the caller
    InlineImage {
        /// MIME type, e.g. "image/jpeg"
        mime_type: String,

        /// Base64-encoded image bytes
        data: String,
    },
}

/// Request body for a generate-content call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    /// Conversation contents (a single turn for this router)
    pub contents: Vec<RequestContent>,
}

/// A single content entry in the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContent {
    /// Ordered parts of this content entry
    pub parts: Vec<Part>,
}

/// A wire-level content part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    /// Text part
    #[serde(rename = "text")]
    Text(String),

    /// Inline binary part tagged with a MIME type
    #[serde(rename = "inline_data")]
    InlineData(InlineData),
}

/// Inline binary payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineData {
    /// MIME type of the payload
    #[serde(rename = "mime_type")]
    pub mime_type: String,

    /// Base64-encoded bytes
    pub data: String,
}

impl GenerateContentRequest {
    /// Build a request body from a caller prompt.
    pub fn from_prompt(prompt: &Prompt) -> Self {
        let parts = match prompt {
            Prompt::Text(text) => vec![Part::Text(text.clone())],
            Prompt::Parts(prompt_parts) => prompt_parts
                .iter()
                .map(|p| match p {
                    PromptPart::Text(text) => Part::Text(text.clone()),
                    PromptPart::InlineImage { mime_type, data } => Part::InlineData(InlineData {
                        mime_type: mime_type.clone(),
                        data: data.clone(),
                    }),
                })
                .collect(),
        };

        Self {
            contents: vec![RequestContent { parts }],
        }
    }
}

/// Response body of a generate-content call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    /// Generated candidates (first one carries the answer)
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generated candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Candidate content
    pub content: Option<CandidateContent>,

    /// Why generation stopped, when reported
    #[serde(rename = "finishReason", skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Content of a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateContent {
    /// Parts of the candidate content
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl GenerateContentResponse {
    /// Extract the text of the first candidate, concatenating text parts.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::InlineData(_) => None,
            })
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prompt_request_serialization() {
        let request = GenerateContentRequest::from_prompt(&Prompt::text("Hello"));
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""text":"Hello""#));
    }

    #[test]
    fn test_vision_prompt_request_serialization() {
        let prompt = Prompt::Parts(vec![
            PromptPart::Text("Describe this meal".to_string()),
            PromptPart::InlineImage {
                mime_type: "image/jpeg".to_string(),
                data: "aGVsbG8=".to_string(),
            },
        ]);

        let request = GenerateContentRequest::from_prompt(&prompt);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""mime_type":"image/jpeg""#));
        assert!(json.contains(r#""data":"aGVsbG8=""#));
        assert!(json.contains("Describe this meal"));
    }

    #[test]
    fn test_prompt_has_images() {
        assert!(!Prompt::text("plain").has_images());
        assert!(!Prompt::Parts(vec![PromptPart::Text("t".into())]).has_images());
        assert!(Prompt::Parts(vec![PromptPart::InlineImage {
            mime_type: "image/png".into(),
            data: "QUJD".into(),
        }])
        .has_images());
    }

    #[test]
    fn test_response_text_extraction() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "Calories: "}, {"text": "420"}]
                },
                "finishReason": "STOP"
            }]
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Calories: 420".to_string()));
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text(), None);
    }
}
