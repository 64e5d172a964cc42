// Gemini client - generateContent calls that return inline images

use super::{AspectRatio, GenerationError, ImageGenerator, prompts};
use crate::config::ApiKey;
use crate::media::EncodedImage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the Gemini API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Whole-request timeout; generation can take a while
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_timeout_secs() -> u64 {
    180
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Image generator backed by the Gemini `generateContent` endpoint
pub struct GeminiClient {
    config: GeminiConfig,
    api_key: ApiKey,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig, api_key: ApiKey) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Send one prompt with optional reference images and pull out the first inline image
    async fn generate(
        &self,
        prompt: String,
        images: &[&EncodedImage],
        aspect_ratio: AspectRatio,
    ) -> Result<Option<EncodedImage>, GenerationError> {
        let request = build_request(prompt, images, aspect_ratio);

        tracing::info!(
            "Requesting image from {} ({} reference image(s), aspect {})",
            self.config.model,
            images.len(),
            aspect_ratio.as_str()
        );

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;

        let image = first_inline_image(body)?;
        match &image {
            Some(image) => tracing::debug!("Received {} ({} bytes)", image.mime_type(), image.len()),
            None => tracing::warn!("Response contained no image part"),
        }

        Ok(image)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn flower(
        &self,
        flower: &str,
        color: &str,
    ) -> Result<Option<EncodedImage>, GenerationError> {
        self.generate(prompts::flower(flower, color), &[], AspectRatio::Square)
            .await
    }

    async fn bouquet(
        &self,
        flower: &str,
        color: &str,
        recipient: &str,
    ) -> Result<Option<EncodedImage>, GenerationError> {
        self.generate(
            prompts::bouquet(flower, color, recipient),
            &[],
            AspectRatio::Square,
        )
        .await
    }

    async fn comic(
        &self,
        user_photo: &EncodedImage,
        partner_photo: Option<&EncodedImage>,
        flower: &str,
        color: &str,
    ) -> Result<Option<EncodedImage>, GenerationError> {
        let mut images = vec![user_photo];
        images.extend(partner_photo);

        self.generate(
            prompts::comic(flower, color, partner_photo.is_some()),
            &images,
            AspectRatio::Portrait,
        )
        .await
    }
}

fn build_request(
    prompt: String,
    images: &[&EncodedImage],
    aspect_ratio: AspectRatio,
) -> GenerateContentRequest {
    let mut parts = vec![Part {
        text: Some(prompt),
        inline_data: None,
    }];

    for image in images {
        parts.push(Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: Some(image.mime_type().to_string()),
                data: image.to_base64(),
            }),
        });
    }

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            image_config: ImageConfig {
                aspect_ratio: aspect_ratio.as_str().to_string(),
            },
        },
    }
}

fn first_inline_image(
    response: GenerateContentResponse,
) -> Result<Option<EncodedImage>, GenerationError> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    for part in parts {
        if let Some(inline) = part.inline_data {
            let image = EncodedImage::from_base64(inline.mime_type.as_deref(), &inline.data)
                .map_err(|e| GenerationError::DecodeError(e.to_string()))?;
            return Ok(Some(image));
        }
    }

    Ok(None)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
    image_config: ImageConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
