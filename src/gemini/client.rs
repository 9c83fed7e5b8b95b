use crate::{
    config::GeminiConfig,
    error::{RelayError, Result},
    gemini::traits::ImageAnalyzer,
    models::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse, InlineImage},
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, StatusCode,
};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| RelayError::Config("GEMINI_API_KEY is required".into()))?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            model: config.model,
            base_url: config.base_url,
        })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| RelayError::Config("API key contains invalid characters".into()))?;
        headers.insert(API_KEY_HEADER, key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

/// Best available description of a failed call: the `error.message` of a
/// Google error body, else the status and raw body.
pub(crate) fn describe_api_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ if body.trim().is_empty() => format!("HTTP {}", status),
        _ => format!("HTTP {}: {}", status, body.trim()),
    }
}

/// Turn a `generateContent` reply into the model's text, or the error the
/// relay reports for it.
pub(crate) fn interpret(status: StatusCode, body: &str) -> Result<String> {
    if !status.is_success() {
        let message = describe_api_error(status, body);
        log::error!("Gemini service error {}: {}", status, message);
        return Err(RelayError::RemoteService(message));
    }

    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| RelayError::Serialization(format!("Invalid Gemini response: {}", e)))?;

    if let Some(text) = parsed.text() {
        return Ok(text);
    }

    let reason = parsed
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
        .or_else(|| {
            parsed
                .candidates
                .first()
                .and_then(|candidate| candidate.finish_reason.clone())
        })
        .unwrap_or_else(|| "no candidates".to_string());
    Err(RelayError::RemoteService(format!(
        "Model returned no text ({})",
        reason
    )))
}

#[async_trait]
impl ImageAnalyzer for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, image: &InlineImage, prompt: &str) -> Result<String> {
        let payload = GenerateContentRequest::image_with_prompt(image, prompt);

        log::info!(
            "Invoking model: {} ({}, {} base64 chars)",
            self.model,
            image.mime_type,
            image.data.len()
        );
        log::debug!("Prompt text: {}", prompt.trim());

        let response = self
            .http
            .post(self.endpoint())
            .headers(self.build_headers()?)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                log::error!("Gemini request failed: {:?}", e);
                RelayError::Request(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::RemoteService(format!("Failed to read response: {}", e)))?;

        interpret(status, &body)
    }
}
