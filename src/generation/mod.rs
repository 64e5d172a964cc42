// Image generation - the three calls the journey makes to the generative service

mod gemini;
pub mod prompts;

pub use gemini::{GeminiClient, GeminiConfig};

use crate::media::EncodedImage;
use async_trait::async_trait;

/// Aspect ratio hint sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Square,
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
        }
    }
}

/// Backend that turns journey choices into images.
///
/// Each call is one request/response with no retries. `Ok(None)` means the
/// service answered but produced no image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// A single flower of the chosen kind and color
    async fn flower(&self, flower: &str, color: &str)
    -> Result<Option<EncodedImage>, GenerationError>;

    /// A bouquet with a card carrying the recipient's name
    async fn bouquet(
        &self,
        flower: &str,
        color: &str,
        recipient: &str,
    ) -> Result<Option<EncodedImage>, GenerationError>;

    /// The four-panel proposal comic built from one or two reference photos
    async fn comic(
        &self,
        user_photo: &EncodedImage,
        partner_photo: Option<&EncodedImage>,
        flower: &str,
        color: &str,
    ) -> Result<Option<EncodedImage>, GenerationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
