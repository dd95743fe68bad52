//! Boundaries to the external image synthesis and asset storage services.

use async_trait::async_trait;
use uuid::Uuid;

#[cfg(test)]
pub(crate) mod fakes;
pub mod openai;
pub mod storage;

pub use openai::OpenAiImageSynthesizer;
pub use storage::LocalAssetStore;

/// Why the synthesis service did not return usable image data.
#[derive(Debug)]
pub enum SynthesisError {
    /// The service is unreachable, overloaded, or rate limiting.
    Unavailable(String),
    /// Any other failure, including malformed responses.
    Failed(String),
}

impl std::fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "Image service unavailable: {reason}"),
            Self::Failed(reason) => write!(f, "Image synthesis failed: {reason}"),
        }
    }
}

impl std::error::Error for SynthesisError {}

/// Why an image could not be durably stored.
#[derive(Debug)]
pub enum UploadError {
    /// The bytes are not an image format the store accepts.
    UnsupportedFormat,
    /// Writing to the backing store failed.
    Io(std::io::Error),
    /// The public reference could not be built.
    InvalidReference(String),
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat => write!(f, "Unsupported image format"),
            Self::Io(err) => write!(f, "Failed to write image: {err}"),
            Self::InvalidReference(reason) => write!(f, "Invalid image reference: {reason}"),
        }
    }
}

impl std::error::Error for UploadError {}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::Io(err)
    }
}

impl From<url::ParseError> for UploadError {
    fn from(err: url::ParseError) -> Self {
        UploadError::InvalidReference(err.to_string())
    }
}

/// Turns a prompt into encoded image bytes.
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    /// Synthesizes one image for `prompt`.
    async fn synthesize(&self, prompt: &str) -> Result<Vec<u8>, SynthesisError>;
}

/// Stores encoded image bytes and hands back a durable public reference.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stores the image for `item_id`, owned by `owner_id`, returning its URL.
    async fn upload(
        &self,
        owner_id: &str,
        item_id: &Uuid,
        bytes: &[u8],
    ) -> Result<String, UploadError>;
}
