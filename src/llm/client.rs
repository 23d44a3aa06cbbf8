//! Thin HTTP client for the Gemini `generateContent` endpoint.

use log::{debug, warn};
use reqwest::StatusCode;

use crate::error::{LegalChatError, Result};
use crate::llm::types::{Content, GenerateContentRequest, GenerateContentResponse, RequestConfig};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default text model, matching the product's pinned model id.
pub const GEMINI_TEXT_MODEL: &str = "gemini-2.5-flash-preview-04-17";

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Overrides the endpoint base, for tests and proxies.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sends one `generateContent` request and decodes the response body.
    /// Auth failures are separated from other API errors so callers can
    /// surface a precise message.
    pub async fn generate_content(
        &self,
        model: &str,
        contents: Vec<Content>,
        config: RequestConfig,
    ) -> Result<GenerateContentResponse> {
        let request = GenerateContentRequest::new(contents, config);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        debug!(
            "Sending generateContent request to model {} ({} turn(s))",
            model,
            request.contents.len()
        );

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, body);
            if status == StatusCode::UNAUTHORIZED
                || status == StatusCode::FORBIDDEN
                || body.contains("API_KEY_INVALID")
            {
                return Err(LegalChatError::AuthFailed(format!(
                    "status {}: {}",
                    status, body
                )));
            }
            return Err(LegalChatError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }
}
