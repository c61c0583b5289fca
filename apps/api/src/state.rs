use std::sync::Arc;

use crate::config::Config;
use crate::creations::store::CreationStore;
use crate::providers::{
    DocumentTextExtractor, IdentityProvider, ImageGenerator, ImageTransformer, TextGenerator,
};

/// Shared application state injected into all route handlers via Axum
/// extractors. Every external collaborator sits behind a trait object so
/// handler tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CreationStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub text: Arc<dyn TextGenerator>,
    pub image: Arc<dyn ImageGenerator>,
    pub transformer: Arc<dyn ImageTransformer>,
    pub extractor: Arc<dyn DocumentTextExtractor>,
    /// Resolved startup configuration; providers capture what they need at
    /// construction, this copy is kept for operational introspection.
    #[allow(dead_code)]
    pub config: Config,
}
