//! Axum route handlers for the generation API.
//!
//! Every handler follows the same pipeline: quota policy, input validation,
//! provider call(s), exactly one creation row, then the conditional usage
//! bump. Any failure before the insert short-circuits with a failure
//! envelope, so partial rows are never persisted and failed requests never
//! consume quota.

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::warn;

use crate::errors::AppError;
use crate::generation::quota::{self, Billing};
use crate::models::caller::Caller;
use crate::models::creation::{CreationKind, NewCreation};
use crate::providers::ProviderError;
use crate::response::ApiEnvelope;
use crate::state::AppState;

const BLOG_TITLE_MAX_TOKENS: u32 = 300;
const RESUME_REVIEW_MAX_TOKENS: u32 = 1000;
const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

const GENERATION_FAILED: &str = "Content generation failed. Please try again.";
const UPLOAD_FAILED: &str = "Image processing failed. Please try again.";

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ArticleRequest {
    pub prompt: String,
    /// Caller-chosen article length, passed through as the completion budget.
    pub length: u32,
}

#[derive(Debug, Deserialize)]
pub struct BlogTitleRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    #[serde(default)]
    pub publish: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Text generation (metered)
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate/article
pub async fn handle_article(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<ArticleRequest>,
) -> Result<Json<ApiEnvelope>, AppError> {
    metered_completion(
        &state,
        &caller,
        request.prompt,
        request.length,
        CreationKind::Article,
    )
    .await
}

/// POST /api/generate/blog-title
pub async fn handle_blog_title(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<BlogTitleRequest>,
) -> Result<Json<ApiEnvelope>, AppError> {
    metered_completion(
        &state,
        &caller,
        request.prompt,
        BLOG_TITLE_MAX_TOKENS,
        CreationKind::BlogTitle,
    )
    .await
}

async fn metered_completion(
    state: &AppState,
    caller: &Caller,
    prompt: String,
    max_tokens: u32,
    kind: CreationKind,
) -> Result<Json<ApiEnvelope>, AppError> {
    if let Err(denied) = quota::check(Billing::Metered, caller) {
        return Ok(Json(ApiEnvelope::failure(denied.message())));
    }
    if prompt.trim().is_empty() {
        return Ok(Json(ApiEnvelope::failure("prompt cannot be empty")));
    }

    let content = match state.text.complete(&prompt, max_tokens).await {
        Ok(content) => content,
        Err(e) => {
            warn!("Completion failed for {} request: {e}", kind.as_str());
            return Ok(Json(ApiEnvelope::failure(GENERATION_FAILED)));
        }
    };

    state
        .store
        .insert(NewCreation {
            user_id: caller.user_id.clone(),
            prompt,
            content: content.clone(),
            kind,
            publish: false,
        })
        .await?;

    bump_usage(state, caller).await;

    Ok(Json(ApiEnvelope::content(content)))
}

/// Bumps the free-tier counter after a successful metered operation. The row
/// is already persisted at this point, so a counter outage is logged rather
/// than turned into a failure the caller would retry.
async fn bump_usage(state: &AppState, caller: &Caller) {
    if !quota::counts_against_quota(Billing::Metered, caller) {
        return;
    }
    if let Err(e) = state.identity.increment_free_usage(&caller.user_id).await {
        tracing::error!("Failed to increment free usage for {}: {e}", caller.user_id);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Media generation (premium-only)
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate/image
pub async fn handle_image(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<ImageRequest>,
) -> Result<Json<ApiEnvelope>, AppError> {
    if let Err(denied) = quota::check(Billing::PremiumOnly, &caller) {
        return Ok(Json(ApiEnvelope::failure(denied.message())));
    }
    if request.prompt.trim().is_empty() {
        return Ok(Json(ApiEnvelope::failure("prompt cannot be empty")));
    }

    let image = match state.image.synthesize(&request.prompt).await {
        Ok(image) => image,
        Err(ProviderError::NotConfigured(what)) => {
            warn!("Image synthesis unavailable: {what} missing");
            return Ok(Json(ApiEnvelope::failure(
                "Image generation is not configured on this server.",
            )));
        }
        Err(e) => {
            warn!("Image synthesis failed: {e}");
            return Ok(Json(ApiEnvelope::failure(GENERATION_FAILED)));
        }
    };

    let hosted = match state.transformer.upload(image).await {
        Ok(hosted) => hosted,
        Err(e) => {
            warn!("Image upload failed: {e}");
            return Ok(Json(ApiEnvelope::failure(UPLOAD_FAILED)));
        }
    };

    state
        .store
        .insert(NewCreation {
            user_id: caller.user_id.clone(),
            prompt: request.prompt,
            content: hosted.secure_url.clone(),
            kind: CreationKind::Image,
            publish: request.publish,
        })
        .await?;

    Ok(Json(ApiEnvelope::content(hosted.secure_url)))
}

/// POST /api/generate/remove-background
pub async fn handle_remove_background(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    multipart: Multipart,
) -> Result<Json<ApiEnvelope>, AppError> {
    if let Err(denied) = quota::check(Billing::PremiumOnly, &caller) {
        return Ok(Json(ApiEnvelope::failure(denied.message())));
    }

    let upload = read_upload(multipart, "image").await?;
    let Some(image) = upload.file else {
        return Ok(Json(ApiEnvelope::failure("image file is required")));
    };

    let hosted = match state.transformer.remove_background(image).await {
        Ok(hosted) => hosted,
        Err(e) => {
            warn!("Background removal failed: {e}");
            return Ok(Json(ApiEnvelope::failure(UPLOAD_FAILED)));
        }
    };

    state
        .store
        .insert(NewCreation {
            user_id: caller.user_id.clone(),
            prompt: "Remove background from image".to_string(),
            content: hosted.secure_url.clone(),
            kind: CreationKind::Image,
            publish: false,
        })
        .await?;

    Ok(Json(ApiEnvelope::content(hosted.secure_url)))
}

/// POST /api/generate/remove-object
pub async fn handle_remove_object(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    multipart: Multipart,
) -> Result<Json<ApiEnvelope>, AppError> {
    if let Err(denied) = quota::check(Billing::PremiumOnly, &caller) {
        return Ok(Json(ApiEnvelope::failure(denied.message())));
    }

    let upload = read_upload(multipart, "image").await?;
    let Some(object) = upload.object else {
        return Ok(Json(ApiEnvelope::failure("object field is required")));
    };
    // One object per request; a multi-word value is ambiguous, reject before
    // any upload happens.
    let object = object.trim().to_string();
    if object.split_whitespace().count() != 1 {
        return Ok(Json(ApiEnvelope::failure(
            "Please name exactly one object to remove.",
        )));
    }
    let Some(image) = upload.file else {
        return Ok(Json(ApiEnvelope::failure("image file is required")));
    };

    let hosted = match state.transformer.upload(image).await {
        Ok(hosted) => hosted,
        Err(e) => {
            warn!("Object removal upload failed: {e}");
            return Ok(Json(ApiEnvelope::failure(UPLOAD_FAILED)));
        }
    };
    let url = state.transformer.object_removal_url(&hosted.public_id, &object);

    state
        .store
        .insert(NewCreation {
            user_id: caller.user_id.clone(),
            prompt: format!("Removed {object} from image"),
            content: url.clone(),
            kind: CreationKind::Image,
            publish: false,
        })
        .await?;

    Ok(Json(ApiEnvelope::content(url)))
}

/// POST /api/generate/resume-review
pub async fn handle_resume_review(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    multipart: Multipart,
) -> Result<Json<ApiEnvelope>, AppError> {
    if let Err(denied) = quota::check(Billing::PremiumOnly, &caller) {
        return Ok(Json(ApiEnvelope::failure(denied.message())));
    }

    let upload = read_upload(multipart, "resume").await?;
    let Some(resume) = upload.file else {
        return Ok(Json(ApiEnvelope::failure("resume file is required")));
    };
    if resume.len() > MAX_RESUME_BYTES {
        return Ok(Json(ApiEnvelope::failure(
            "Resume file size exceeds the allowed 5 MB.",
        )));
    }

    let resume_text = match state.extractor.extract_text(resume).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Resume text extraction failed: {e}");
            return Ok(Json(ApiEnvelope::failure(
                "Could not read the uploaded resume. Please upload a valid PDF.",
            )));
        }
    };

    let review_prompt = format!(
        "Review the following resume and provide constructive feedback on its \
         strengths, weaknesses, and areas for improvement in short. Resume \
         content:\n\n{resume_text}"
    );

    let content = match state.text.complete(&review_prompt, RESUME_REVIEW_MAX_TOKENS).await {
        Ok(content) => content,
        Err(e) => {
            warn!("Resume review completion failed: {e}");
            return Ok(Json(ApiEnvelope::failure(GENERATION_FAILED)));
        }
    };

    state
        .store
        .insert(NewCreation {
            user_id: caller.user_id.clone(),
            prompt: "Review the uploaded resume".to_string(),
            content: content.clone(),
            kind: CreationKind::ResumeReview,
            publish: false,
        })
        .await?;

    Ok(Json(ApiEnvelope::content(content)))
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart plumbing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Upload {
    file: Option<Bytes>,
    object: Option<String>,
}

/// Drains a multipart body, keeping the file part named `file_field` and the
/// optional `object` text field. Unknown parts are ignored.
async fn read_upload(mut multipart: Multipart, file_field: &str) -> Result<Upload, AppError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some(name) if name == file_field => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;
                upload.file = Some(bytes);
            }
            Some("object") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("failed to read field: {e}")))?;
                upload.object = Some(text);
            }
            _ => {}
        }
    }

    Ok(upload)
}
