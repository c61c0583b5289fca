use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::creation::{CreationRow, NewCreation};

/// Result of a like toggle: the caller's new membership state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
}

/// Persistence seam for creations. The production implementation is backed
/// by Postgres; handler tests substitute an in-memory fake.
#[async_trait]
pub trait CreationStore: Send + Sync {
    /// Inserts exactly one row; id and timestamp are assigned here.
    async fn insert(&self, new: NewCreation) -> Result<CreationRow, sqlx::Error>;

    /// All creations owned by a user, newest first.
    async fn for_user(&self, user_id: &str) -> Result<Vec<CreationRow>, sqlx::Error>;

    /// All published creations across users, newest first.
    async fn published(&self) -> Result<Vec<CreationRow>, sqlx::Error>;

    /// Flips `user_id`'s membership in the creation's likes set.
    /// Returns `None` when no creation has that id.
    async fn toggle_like(
        &self,
        creation_id: Uuid,
        user_id: &str,
    ) -> Result<Option<LikeState>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgCreationStore {
    pool: PgPool,
}

impl PgCreationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreationStore for PgCreationStore {
    async fn insert(&self, new: NewCreation) -> Result<CreationRow, sqlx::Error> {
        let row = sqlx::query_as::<_, CreationRow>(
            r#"
            INSERT INTO creations (id, user_id, prompt, content, kind, publish)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.user_id)
        .bind(&new.prompt)
        .bind(&new.content)
        .bind(new.kind.as_str())
        .bind(new.publish)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Inserted {} creation {} for user {}",
            row.kind, row.id, row.user_id
        );
        Ok(row)
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<CreationRow>, sqlx::Error> {
        Ok(sqlx::query_as::<_, CreationRow>(
            "SELECT * FROM creations WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn published(&self) -> Result<Vec<CreationRow>, sqlx::Error> {
        Ok(sqlx::query_as::<_, CreationRow>(
            "SELECT * FROM creations WHERE publish = TRUE ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    // The membership flip is one conditional UPDATE keyed by row id, so
    // interleaved toggles from different users compose instead of clobbering
    // each other through a stale read.
    async fn toggle_like(
        &self,
        creation_id: Uuid,
        user_id: &str,
    ) -> Result<Option<LikeState>, sqlx::Error> {
        let liked: Option<bool> = sqlx::query_scalar(
            r#"
            UPDATE creations
            SET likes = CASE
                WHEN $2 = ANY(likes) THEN array_remove(likes, $2)
                ELSE array_append(likes, $2)
            END
            WHERE id = $1
            RETURNING $2 = ANY(likes)
            "#,
        )
        .bind(creation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(liked.map(|liked| LikeState { liked }))
    }
}
