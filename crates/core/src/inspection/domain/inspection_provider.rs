use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[source] BoxError),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider response contained no text")]
    EmptyResponse,
    #[error("failed to encode composite: {0}")]
    Encode(String),
    #[error("no API key configured")]
    MissingApiKey,
}

/// A vision-capable model that answers one instruction about one image.
///
/// Implementations must tolerate calls from several threads at once when
/// used with a concurrent executor.
pub trait InspectionProvider: Send + Sync {
    fn name(&self) -> &str;

    fn analyze(&self, prompt: &str, image: &RgbImage) -> Result<String, ProviderError>;
}

/// A composite whose provider call failed; its contribution was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub chunk_index: usize,
    pub message: String,
}
