use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::RgbImage;
use serde_json::{json, Value};

use crate::inspection::domain::inspection_provider::{InspectionProvider, ProviderError};
use crate::sampling::domain::composite_builder::encode_jpeg;
use crate::shared::constants::COMPOSITE_JPEG_QUALITY;

/// Google Gemini `generateContent` over blocking HTTP.
pub struct GeminiProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: Option<String>,
        model: &str,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ProviderError::MissingApiKey)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Request(Box::new(e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint: endpoint(api_base, model),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl InspectionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn analyze(&self, prompt: &str, image: &RgbImage) -> Result<String, ProviderError> {
        let jpeg = encode_jpeg(image, COMPOSITE_JPEG_QUALITY)
            .map_err(|e| ProviderError::Encode(e.to_string()))?;
        log::debug!(
            "Sending {}x{} composite ({} bytes) to {}",
            image.width(),
            image.height(),
            jpeg.len(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt, &jpeg))
            .send()
            .map_err(|e| ProviderError::Request(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response
            .json()
            .map_err(|e| ProviderError::Request(Box::new(e)))?;
        response_text(&payload).ok_or(ProviderError::EmptyResponse)
    }
}

fn endpoint(api_base: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        api_base.trim_end_matches('/'),
        model
    )
}

/// One user turn: the instruction followed by the inline JPEG.
pub fn request_body(prompt: &str, jpeg: &[u8]) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "text": prompt },
                { "inline_data": { "mime_type": "image/jpeg", "data": STANDARD.encode(jpeg) } }
            ]
        }]
    })
}

/// Concatenated text parts of the first candidate, or `None` when there are
/// none (e.g. the answer was blocked).
pub fn response_text(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_rejected() {
        let result = GeminiProvider::new(None, "m", "https://x", Duration::from_secs(1));
        assert!(matches!(result, Err(ProviderError::MissingApiKey)));
        let blank = GeminiProvider::new(Some("  ".into()), "m", "https://x", Duration::from_secs(1));
        assert!(matches!(blank, Err(ProviderError::MissingApiKey)));
    }

    #[test]
    fn test_endpoint_joins_base_and_model() {
        let provider = GeminiProvider::new(
            Some("key".into()),
            "gemini-1.5-pro",
            "https://generativelanguage.googleapis.com/",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_request_body_carries_prompt_and_base64_image() {
        let body = request_body("Inspect this.", &[0xFF, 0xD8, 0xFF]);
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Inspect this.");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "/9j/");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "{\"overall_assessment\":" },
                { "text": " {}}" }
            ]}}]
        });
        assert_eq!(
            response_text(&payload).as_deref(),
            Some("{\"overall_assessment\": {}}")
        );
    }

    #[test]
    fn test_response_without_text_is_none() {
        assert!(response_text(&json!({ "candidates": [] })).is_none());
        assert!(response_text(&json!({ "promptFeedback": { "blockReason": "SAFETY" } })).is_none());
        let no_text = json!({ "candidates": [{ "content": { "parts": [{ "inline_data": {} }] } }] });
        assert!(response_text(&no_text).is_none());
    }
}
