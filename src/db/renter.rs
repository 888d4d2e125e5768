//! Renter (landlord) accounts.

use serde::Serialize;
use utoipa::ToSchema;

use super::DbPool;
use crate::{IjaraError, Result};

/// Renter entity.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Renter {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    /// Login phone number (unique).
    pub phone: String,
    /// Password hash (Argon2).
    #[serde(skip_serializing)]
    pub password: String,
    /// Hashcode of the profile image.
    pub image: Option<String>,
    pub register_at: String,
}

/// Data for creating a new renter.
#[derive(Debug, Clone)]
pub struct NewRenter {
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    pub image: Option<String>,
}

/// Repository for renter accounts.
pub struct RenterRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> RenterRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a renter. A taken phone number yields `Conflict`.
    pub async fn create(&self, new_renter: &NewRenter) -> Result<Renter> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO renters (firstname, lastname, phone, password, image)
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&new_renter.firstname)
        .bind(&new_renter.lastname)
        .bind(&new_renter.phone)
        .bind(&new_renter.password)
        .bind(&new_renter.image)
        .fetch_one(self.pool)
        .await
        .map_err(|e| IjaraError::from_sqlx(e, "phone"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| IjaraError::NotFound("renter".to_string()))
    }

    /// Get a renter by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Renter>> {
        let renter = sqlx::query_as::<_, Renter>(
            "SELECT id, firstname, lastname, phone, password, image, register_at
             FROM renters WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(renter)
    }

    /// Get a renter by phone number.
    pub async fn get_by_phone(&self, phone: &str) -> Result<Option<Renter>> {
        let renter = sqlx::query_as::<_, Renter>(
            "SELECT id, firstname, lastname, phone, password, image, register_at
             FROM renters WHERE phone = $1",
        )
        .bind(phone)
        .fetch_optional(self.pool)
        .await?;
        Ok(renter)
    }

    /// Check whether a phone number is registered.
    pub async fn phone_exists(&self, phone: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM renters WHERE phone = $1)")
                .bind(phone)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Page through renters, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Renter>> {
        let renters = sqlx::query_as::<_, Renter>(
            "SELECT id, firstname, lastname, phone, password, image, register_at
             FROM renters ORDER BY id DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(renters)
    }

    /// Count all renters.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM renters")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
