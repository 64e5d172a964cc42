//! valentine - an interactive Valentine's proposal journey
//!
//! The [`journey::JourneyController`] walks a visitor from a welcome screen
//! through a generated flower, a named bouquet and a four-panel proposal comic.
//! Images come from an [`generation::ImageGenerator`]; [`generation::GeminiClient`]
//! is the production backend.

pub mod config;
pub mod generation;
pub mod journey;
pub mod media;
pub mod share;

pub use config::{ApiKey, ValentineConfig};
pub use generation::{GeminiClient, GenerationError, ImageGenerator};
pub use journey::{ActionOutcome, JourneyController, Screen, Session};
pub use media::{EncodedImage, MediaEncoder};
pub use share::{ShareOutcome, Sharer};
