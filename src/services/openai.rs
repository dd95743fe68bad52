//! OpenAI Images API client.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ImageSynthesizer, SynthesisError};

/// Default endpoint for POST /v1/images/generations
pub const DEFAULT_IMAGES_ENDPOINT: &str = "https://api.openai.com/v1/images/generations";

/// Request body for POST /v1/images/generations
/// Docs: https://platform.openai.com/docs/api-reference/images
#[derive(Serialize, Debug, PartialEq)]
struct ImagesGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,

    // For GPT image models.
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    output_format: Option<&'a str>,

    // For dall-e models.
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
struct ImagesGenerateResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize, Debug)]
struct ImageData {
    b64_json: Option<String>,
    url: Option<String>,
    revised_prompt: Option<String>,
}

fn build_request<'a>(image_model: &'a str, prompt: &'a str) -> ImagesGenerateRequest<'a> {
    // GPT image models always return base64 and support output_format;
    // DALL-E models can return url or b64_json.
    if image_model.starts_with("gpt-image") {
        ImagesGenerateRequest {
            model: image_model,
            prompt,
            n: 1,
            size: "1024x1024",
            quality: Some("high"),
            output_format: Some("png"),
            response_format: None,
            style: None,
        }
    } else if image_model == "dall-e-3" {
        ImagesGenerateRequest {
            model: image_model,
            prompt,
            n: 1,
            size: "1024x1024",
            quality: Some("hd"),
            output_format: None,
            response_format: Some("b64_json"),
            style: Some("vivid"),
        }
    } else {
        ImagesGenerateRequest {
            model: image_model,
            prompt,
            n: 1,
            size: "1024x1024",
            quality: None,
            output_format: None,
            response_format: Some("b64_json"),
            style: None,
        }
    }
}

/// Rate limiting and server-side errors mean the service is unavailable.
fn classify_status(status: StatusCode, body: &[u8]) -> SynthesisError {
    let message = format!(
        "OpenAI Images API error {status}: {}",
        String::from_utf8_lossy(body)
    );
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        SynthesisError::Unavailable(message)
    } else {
        SynthesisError::Failed(message)
    }
}

fn classify_transport(err: &reqwest::Error, context: &str) -> SynthesisError {
    if err.is_connect() || err.is_timeout() {
        SynthesisError::Unavailable(format!("{context}: {err}"))
    } else {
        SynthesisError::Failed(format!("{context}: {err}"))
    }
}

/// Synthesizes images through the OpenAI Images API.
#[derive(Clone, Debug)]
pub struct OpenAiImageSynthesizer {
    client: reqwest::Client,
    api_key: String,
    image_model: String,
    endpoint: String,
}

impl OpenAiImageSynthesizer {
    /// Client against the public API endpoint.
    pub fn new(api_key: &str, image_model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            image_model: image_model.to_string(),
            endpoint: DEFAULT_IMAGES_ENDPOINT.to_string(),
        }
    }

    /// Overrides the generations endpoint, eg for a proxy.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, SynthesisError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| classify_transport(&err, "Failed to download image URL"))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| classify_transport(&err, "Failed to read downloaded image bytes"))?;
        if !status.is_success() {
            return Err(classify_status(status, &bytes));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageSynthesizer for OpenAiImageSynthesizer {
    async fn synthesize(&self, prompt: &str) -> Result<Vec<u8>, SynthesisError> {
        let req_body = build_request(&self.image_model, prompt);

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req_body)
            .send()
            .await
            .map_err(|err| classify_transport(&err, "Request to /v1/images/generations failed"))?;

        let status = resp.status();
        let resp_bytes = resp.bytes().await.map_err(|err| {
            classify_transport(&err, "Failed reading /v1/images/generations body")
        })?;
        if !status.is_success() {
            let err = classify_status(status, &resp_bytes);
            warn!("{err}");
            return Err(err);
        }

        let parsed: ImagesGenerateResponse = serde_json::from_slice(&resp_bytes).map_err(|err| {
            SynthesisError::Failed(format!(
                "Failed to parse /v1/images/generations JSON: {err}"
            ))
        })?;

        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| SynthesisError::Failed("No image data returned".to_string()))?;

        if let Some(revised_prompt) = first.revised_prompt {
            debug!("Revised prompt from OpenAI: {revised_prompt}");
        }

        if let Some(b64_json) = first.b64_json {
            general_purpose::STANDARD
                .decode(b64_json)
                .map_err(|err| SynthesisError::Failed(format!("Failed to base64-decode image: {err}")))
        } else if let Some(url) = first.url {
            self.download(&url).await
        } else {
            Err(SynthesisError::Failed(
                "Image response missing b64_json and url fields".to_string(),
            ))
        }
    }
}
