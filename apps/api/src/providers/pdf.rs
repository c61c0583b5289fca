//! PDF text extraction. The extractor is CPU-bound, so the real
//! implementation runs on the blocking pool.

use async_trait::async_trait;
use bytes::Bytes;

use super::ProviderError;

/// Extracts plain text from an uploaded PDF document.
#[async_trait]
pub trait DocumentTextExtractor: Send + Sync {
    async fn extract_text(&self, document: Bytes) -> Result<String, ProviderError>;
}

#[derive(Clone, Default)]
pub struct PdfTextExtractor;

#[async_trait]
impl DocumentTextExtractor for PdfTextExtractor {
    async fn extract_text(&self, document: Bytes) -> Result<String, ProviderError> {
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&document)
                .map_err(|e| ProviderError::Malformed(format!("PDF parse failed: {e}")))
        })
        .await
        .map_err(|e| ProviderError::Malformed(format!("extraction task failed: {e}")))??;

        Ok(text)
    }
}
