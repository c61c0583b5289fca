//! In-memory fakes for the provider and store seams, used by handler tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::creations::store::{CreationStore, LikeState};
use crate::models::caller::{Caller, Plan};
use crate::models::creation::{CreationRow, NewCreation};
use crate::providers::transform::HostedImage;
use crate::providers::{
    DocumentTextExtractor, IdentityProvider, ImageGenerator, ImageTransformer, ProviderError,
    TextGenerator,
};
use crate::state::AppState;

pub fn caller(user_id: &str, plan: Plan, free_usage: i64) -> Caller {
    Caller {
        user_id: user_id.to_string(),
        plan,
        free_usage,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeStore {
    rows: Mutex<Vec<CreationRow>>,
}

impl FakeStore {
    pub fn rows(&self) -> Vec<CreationRow> {
        self.rows.lock().unwrap().clone()
    }

    pub fn insert_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn seed(&self, row: CreationRow) {
        self.rows.lock().unwrap().push(row);
    }
}

pub fn row(user_id: &str, kind: &str, publish: bool) -> CreationRow {
    CreationRow {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        prompt: "Write a haiku".to_string(),
        content: "...".to_string(),
        kind: kind.to_string(),
        publish,
        likes: vec![],
        created_at: Utc::now(),
    }
}

#[async_trait]
impl CreationStore for FakeStore {
    async fn insert(&self, new: NewCreation) -> Result<CreationRow, sqlx::Error> {
        let row = CreationRow {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            prompt: new.prompt,
            content: new.content,
            kind: new.kind.as_str().to_string(),
            publish: new.publish,
            likes: vec![],
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<CreationRow>, sqlx::Error> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn published(&self) -> Result<Vec<CreationRow>, sqlx::Error> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.publish)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    // Same contract as the SQL toggle: one guarded mutation per call, so
    // interleaved callers compose.
    async fn toggle_like(
        &self,
        creation_id: Uuid,
        user_id: &str,
    ) -> Result<Option<LikeState>, sqlx::Error> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|r| r.id == creation_id) else {
            return Ok(None);
        };
        if let Some(pos) = row.likes.iter().position(|u| u == user_id) {
            row.likes.remove(pos);
            Ok(Some(LikeState { liked: false }))
        } else {
            row.likes.push(user_id.to_string());
            Ok(Some(LikeState { liked: true }))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Identity
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeIdentity {
    pub tokens: Mutex<HashMap<String, Caller>>,
    pub increments: Mutex<HashMap<String, usize>>,
}

impl FakeIdentity {
    pub fn with_token(token: &str, caller: Caller) -> Self {
        let fake = FakeIdentity::default();
        fake.tokens.lock().unwrap().insert(token.to_string(), caller);
        fake
    }

    pub fn increments_for(&self, user_id: &str) -> usize {
        self.increments.lock().unwrap().get(user_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn authenticate(&self, bearer_token: &str) -> Result<Option<Caller>, ProviderError> {
        Ok(self.tokens.lock().unwrap().get(bearer_token).cloned())
    }

    async fn increment_free_usage(&self, user_id: &str) -> Result<(), ProviderError> {
        *self
            .increments
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_insert(0) += 1;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation providers
// ────────────────────────────────────────────────────────────────────────────

pub struct FakeText {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl Default for FakeText {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }
}

impl FakeText {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Api {
                status: 500,
                message: "boom".to_string(),
            });
        }
        Ok(format!("generated for: {prompt}"))
    }
}

#[derive(Default)]
pub struct FakeImage {
    pub calls: AtomicUsize,
}

impl FakeImage {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FakeImage {
    async fn synthesize(&self, _prompt: &str) -> Result<Bytes, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from_static(b"\x89PNG"))
    }
}

#[derive(Default)]
pub struct FakeTransformer {
    pub uploads: AtomicUsize,
}

impl FakeTransformer {
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageTransformer for FakeTransformer {
    async fn upload(&self, _image: Bytes) -> Result<HostedImage, ProviderError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(HostedImage {
            public_id: "fake-asset".to_string(),
            secure_url: "https://media.example/fake-asset.png".to_string(),
        })
    }

    async fn remove_background(&self, _image: Bytes) -> Result<HostedImage, ProviderError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(HostedImage {
            public_id: "fake-cutout".to_string(),
            secure_url: "https://media.example/fake-cutout.png".to_string(),
        })
    }

    fn object_removal_url(&self, public_id: &str, object: &str) -> String {
        format!("https://media.example/e_gen_remove:{object}/{public_id}")
    }
}

#[derive(Default)]
pub struct FakeExtractor {
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentTextExtractor for FakeExtractor {
    async fn extract_text(&self, _document: Bytes) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("10 years of Rust experience".to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// State assembly
// ────────────────────────────────────────────────────────────────────────────

pub struct Fakes {
    pub store: Arc<FakeStore>,
    pub identity: Arc<FakeIdentity>,
    pub text: Arc<FakeText>,
    pub image: Arc<FakeImage>,
    pub transformer: Arc<FakeTransformer>,
    pub extractor: Arc<FakeExtractor>,
}

impl Fakes {
    /// Builds an `AppState` wired to these fakes; the test keeps the handles
    /// to assert on call counts and stored rows afterwards.
    pub fn state(&self) -> AppState {
        AppState {
            store: self.store.clone(),
            identity: self.identity.clone(),
            text: self.text.clone(),
            image: self.image.clone(),
            transformer: self.transformer.clone(),
            extractor: self.extractor.clone(),
            config: test_config(),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        llm_api_key: "test".to_string(),
        llm_base_url: "http://llm.invalid".to_string(),
        image_api_key: "test".to_string(),
        image_api_url: "http://image.invalid".to_string(),
        media_cloud_name: "test".to_string(),
        media_api_key: "test".to_string(),
        media_api_secret: "test".to_string(),
        identity_base_url: "http://identity.invalid".to_string(),
        identity_api_key: "test".to_string(),
        port: 0,
        rust_log: "info".to_string(),
    }
}

pub fn state_with(identity: FakeIdentity) -> (AppState, Fakes) {
    let fakes = Fakes {
        store: Arc::new(FakeStore::default()),
        identity: Arc::new(identity),
        text: Arc::new(FakeText::default()),
        image: Arc::new(FakeImage::default()),
        transformer: Arc::new(FakeTransformer::default()),
        extractor: Arc::new(FakeExtractor::default()),
    };
    let state = fakes.state();
    (state, fakes)
}

pub fn test_state() -> (AppState, Fakes) {
    state_with(FakeIdentity::default())
}
