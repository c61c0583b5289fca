use serde::Serialize;

use crate::models::creation::CreationRow;

/// Uniform response envelope returned by every business endpoint.
///
/// Recoverable failures (quota, plan gate, validation, provider errors) come
/// back as `success: false` with a human-readable message and a 200 status, so
/// clients branch on `success` rather than on HTTP codes.
#[derive(Debug, Serialize)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creations: Option<Vec<CreationRow>>,
    /// New like membership after a toggle, so clients don't parse the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
}

impl ApiEnvelope {
    pub fn content(content: impl Into<String>) -> Self {
        ApiEnvelope {
            success: true,
            content: Some(content.into()),
            message: None,
            creations: None,
            liked: None,
        }
    }

    pub fn creations(creations: Vec<CreationRow>) -> Self {
        ApiEnvelope {
            success: true,
            content: None,
            message: None,
            creations: Some(creations),
            liked: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ApiEnvelope {
            success: false,
            content: None,
            message: Some(message.into()),
            creations: None,
            liked: None,
        }
    }

    pub fn like_state(liked: bool, message: impl Into<String>) -> Self {
        ApiEnvelope {
            success: true,
            content: None,
            message: Some(message.into()),
            creations: None,
            liked: Some(liked),
        }
    }
}
