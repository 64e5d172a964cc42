// Media encoding - turns picked image files into data URIs and back into files

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::path::Path;

/// MIME type assumed when a payload does not declare one
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// A self-describing image payload
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime_type: String,
    bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Build from a base64 payload, falling back to `image/png` when no type is declared
    pub fn from_base64(mime_type: Option<&str>, data: &str) -> Result<Self, MediaError> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| MediaError::InvalidBase64(e.to_string()))?;

        let mime_type = mime_type
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE);

        Ok(Self::new(mime_type, bytes))
    }

    /// Parse a `data:<mime>;base64,<payload>` URI
    pub fn from_data_uri(uri: &str) -> Result<Self, MediaError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| MediaError::InvalidDataUri("missing data: scheme".into()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| MediaError::InvalidDataUri("missing payload separator".into()))?;

        let mime_type = header.split(';').next().map(str::trim);

        Self::from_base64(mime_type, payload)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 payload without the URI header
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

// Debug shows the size only, never the payload.
impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A binary file ready to be shared or downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Reads local pictures into [`EncodedImage`]s and prepares images for export
#[derive(Debug, Clone, Default)]
pub struct MediaEncoder {}

impl MediaEncoder {
    pub fn new() -> Self {
        Self {}
    }

    /// Read an image file as-is; no resizing or re-encoding
    pub async fn encode_file(&self, path: impl AsRef<Path>) -> Result<EncodedImage, MediaError> {
        let path = path.as_ref();

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| MediaError::Io(format!("{}: {}", path.display(), e)))?;

        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .filter(|m| m.starts_with("image/"))
            .or_else(|| sniff_mime(&bytes))
            .ok_or_else(|| MediaError::NotAnImage(path.display().to_string()))?;

        tracing::debug!("Encoded {} ({}, {} bytes)", path.display(), mime_type, bytes.len());

        Ok(EncodedImage::new(mime_type, bytes))
    }

    /// Reconstruct the exact original bytes under the given filename
    pub fn decode_for_export(&self, image: &EncodedImage, filename: impl Into<String>) -> ExportFile {
        ExportFile {
            filename: filename.into(),
            mime_type: image.mime_type().to_string(),
            bytes: image.bytes().to_vec(),
        }
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        Some("image/tiff")
    } else if bytes.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        Some("image/x-icon")
    } else if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        match &bytes[8..12] {
            b"avif" | b"avis" => Some("image/avif"),
            b"heic" | b"heix" => Some("image/heic"),
            b"mif1" | b"msf1" => Some("image/heif"),
            _ => None,
        }
    } else {
        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Not an image file: {0}")]
    NotAnImage(String),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),
}
