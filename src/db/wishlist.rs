//! Student wishlists.
//!
//! Listing the wishlisted rents themselves goes through
//! [`super::RentRepository::list_wishlisted`].

use super::DbPool;
use crate::{IjaraError, Result};

/// Repository for wishlist entries.
pub struct WishlistRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Add a listing to a wishlist.
    ///
    /// A second add of the same listing yields `Conflict`.
    pub async fn add(&self, user_id: i64, rent_id: i64) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO wishlists (user_id, rent_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(rent_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| IjaraError::from_sqlx(e, "wishlist entry"))?;
        Ok(id)
    }

    /// Remove a listing from a wishlist.
    ///
    /// Returns true if an entry was removed.
    pub async fn remove(&self, user_id: i64, rent_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wishlists WHERE user_id = $1 AND rent_id = $2")
            .bind(user_id)
            .bind(rent_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check whether a listing is in a wishlist.
    pub async fn contains(&self, user_id: i64, rent_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM wishlists WHERE user_id = $1 AND rent_id = $2)",
        )
        .bind(user_id)
        .bind(rent_id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }
}
