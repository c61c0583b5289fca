//! External collaborators behind trait seams so handlers can be exercised
//! with substitutable fakes: text/image generation, image hosting and
//! transformation, PDF text extraction, and the identity/quota provider.

pub mod identity;
pub mod image;
pub mod pdf;
pub mod text;
pub mod transform;

use thiserror::Error;

pub use identity::IdentityProvider;
pub use image::ImageGenerator;
pub use pdf::DocumentTextExtractor;
pub use text::TextGenerator;
pub use transform::ImageTransformer;

/// Failure of any external provider call. Handlers surface these to callers
/// as failure envelopes; they never abort the process or leak raw bodies.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Provider returned an unusable response: {0}")]
    Malformed(String),

    #[error("Provider is not configured: {0}")]
    NotConfigured(&'static str),
}
