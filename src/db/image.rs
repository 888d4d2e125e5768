//! Listing image records.
//!
//! The bytes live in [`crate::storage::ImageStorage`]; this table maps a
//! public hashcode to the stored path. Listing photos carry their rent;
//! profile photos of students and renters do not.

use serde::Serialize;
use utoipa::ToSchema;

use super::DbPool;
use crate::{IjaraError, Result};

/// Image record.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Image {
    pub id: i64,
    /// Owning listing; None for profile photos.
    pub rent_id: Option<i64>,
    /// Storage path relative to the image root.
    #[serde(skip_serializing)]
    pub url: String,
    /// Public lookup key.
    pub hashcode: String,
    pub created_at: String,
}

/// Data for creating an image record.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub rent_id: Option<i64>,
    pub url: String,
    pub hashcode: String,
}

/// Repository for image records.
pub struct ImageRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ImageRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert an image record.
    pub async fn create(&self, image: &NewImage) -> Result<Image> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO images (rent_id, url, hashcode) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(image.rent_id)
        .bind(&image.url)
        .bind(&image.hashcode)
        .fetch_one(self.pool)
        .await
        .map_err(|e| IjaraError::from_sqlx(e, "image"))?;

        sqlx::query_as::<_, Image>(
            "SELECT id, rent_id, url, hashcode, created_at FROM images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| IjaraError::NotFound("image".to_string()))
    }

    /// Look up an image by hashcode.
    pub async fn get_by_hashcode(&self, hashcode: &str) -> Result<Option<Image>> {
        let image = sqlx::query_as::<_, Image>(
            "SELECT id, rent_id, url, hashcode, created_at FROM images WHERE hashcode = $1",
        )
        .bind(hashcode)
        .fetch_optional(self.pool)
        .await?;
        Ok(image)
    }

    /// List images of a listing.
    pub async fn list_by_rent(&self, rent_id: i64) -> Result<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(
            "SELECT id, rent_id, url, hashcode, created_at FROM images
             WHERE rent_id = $1 ORDER BY id",
        )
        .bind(rent_id)
        .fetch_all(self.pool)
        .await?;
        Ok(images)
    }
}
