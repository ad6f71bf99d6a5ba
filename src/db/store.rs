//! Store interfaces the recommendation pipeline depends on.
//!
//! The pipeline only needs point lookups and an append, so it talks to these
//! traits rather than to `PgPool` directly. `PgStore` is the production
//! implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Crop, Location, NewRecommendation, Recommendation};
use super::queries;
use crate::errors::AppError;

#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn find_by_state_district(
        &self,
        state: &str,
        district: &str,
    ) -> Result<Option<Location>, AppError>;
}

#[async_trait]
pub trait CropStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Crop>, AppError>;
}

#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Persist a record, returning it with its generated id and timestamp.
    async fn create(&self, record: NewRecommendation) -> Result<Recommendation, AppError>;

    async fn list_for_user(&self, user_id: Uuid, limit: i64)
        -> Result<Vec<Recommendation>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Recommendation>, AppError>;
}

/// PostgreSQL-backed implementation of every store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationStore for PgStore {
    async fn find_by_state_district(
        &self,
        state: &str,
        district: &str,
    ) -> Result<Option<Location>, AppError> {
        Ok(queries::get_location(&self.pool, state, district).await?)
    }
}

#[async_trait]
impl CropStore for PgStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Crop>, AppError> {
        Ok(queries::get_crop_by_name(&self.pool, name).await?)
    }
}

#[async_trait]
impl RecommendationStore for PgStore {
    async fn create(&self, record: NewRecommendation) -> Result<Recommendation, AppError> {
        Ok(queries::insert_recommendation(&self.pool, &record).await?)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Recommendation>, AppError> {
        Ok(queries::list_recommendations_for_user(&self.pool, user_id, limit).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Recommendation>, AppError> {
        Ok(queries::get_recommendation(&self.pool, id).await?)
    }
}
