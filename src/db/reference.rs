//! Reference data lookups: universities, faculties, regions, districts,
//! listing categories, genders and staff roles.

use serde::Serialize;
use utoipa::ToSchema;

use super::DbPool;
use crate::Result;

/// University.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct University {
    pub id: i64,
    pub name_uz: String,
    pub name_ru: String,
    pub acronym_uz: Option<String>,
    pub acronym_ru: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// Faculty of a university.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Faculty {
    pub id: i64,
    pub name_uz: String,
    pub name_ru: String,
    pub university_id: i64,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

/// Region.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Region {
    pub id: i64,
    pub name_uz: String,
    pub name_ru: String,
}

/// District of a region.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct District {
    pub id: i64,
    pub name_uz: String,
    pub name_ru: String,
    pub region_id: i64,
}

/// Listing category.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name_uz: String,
    pub name_ru: String,
}

/// Gender ("jins") used to match students with listings.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Jins {
    pub id: i64,
    pub name_uz: String,
    pub name_ru: String,
}

/// Staff role.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct StaffRole {
    pub id: i64,
    pub name: String,
}

/// Read-only repository for reference tables.
pub struct ReferenceRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ReferenceRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// List all universities.
    pub async fn universities(&self) -> Result<Vec<University>> {
        let rows = sqlx::query_as::<_, University>(
            "SELECT id, name_uz, name_ru, acronym_uz, acronym_ru, longitude, latitude
             FROM universities ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// List faculties of a university.
    pub async fn faculties(&self, university_id: i64) -> Result<Vec<Faculty>> {
        let rows = sqlx::query_as::<_, Faculty>(
            "SELECT id, name_uz, name_ru, university_id, longitude, latitude
             FROM faculties WHERE university_id = $1 ORDER BY id",
        )
        .bind(university_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// List all regions.
    pub async fn regions(&self) -> Result<Vec<Region>> {
        let rows =
            sqlx::query_as::<_, Region>("SELECT id, name_uz, name_ru FROM regions ORDER BY id")
                .fetch_all(self.pool)
                .await?;
        Ok(rows)
    }

    /// List districts of a region.
    pub async fn districts(&self, region_id: i64) -> Result<Vec<District>> {
        let rows = sqlx::query_as::<_, District>(
            "SELECT id, name_uz, name_ru, region_id
             FROM districts WHERE region_id = $1 ORDER BY id",
        )
        .bind(region_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// List listing categories.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name_uz, name_ru FROM categories ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// List genders.
    pub async fn jins(&self) -> Result<Vec<Jins>> {
        let rows = sqlx::query_as::<_, Jins>("SELECT id, name_uz, name_ru FROM jins ORDER BY id")
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// List staff roles.
    pub async fn staff_roles(&self) -> Result<Vec<StaffRole>> {
        let rows = sqlx::query_as::<_, StaffRole>("SELECT id, name FROM staff_roles ORDER BY id")
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Insert a university. Used by loaders and tests.
    pub async fn add_university(&self, name_uz: &str, name_ru: &str) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO universities (name_uz, name_ru) VALUES ($1, $2) RETURNING id",
        )
        .bind(name_uz)
        .bind(name_ru)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// Insert a faculty.
    pub async fn add_faculty(&self, university_id: i64, name_uz: &str, name_ru: &str) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO faculties (name_uz, name_ru, university_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name_uz)
        .bind(name_ru)
        .bind(university_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| crate::IjaraError::from_sqlx(e, "faculty"))?;
        Ok(id)
    }

    /// Insert a region.
    pub async fn add_region(&self, name_uz: &str, name_ru: &str) -> Result<i64> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO regions (name_uz, name_ru) VALUES ($1, $2) RETURNING id")
                .bind(name_uz)
                .bind(name_ru)
                .fetch_one(self.pool)
                .await?;
        Ok(id)
    }

    /// Insert a district.
    pub async fn add_district(&self, region_id: i64, name_uz: &str, name_ru: &str) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO districts (name_uz, name_ru, region_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name_uz)
        .bind(name_ru)
        .bind(region_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| crate::IjaraError::from_sqlx(e, "district"))?;
        Ok(id)
    }
}
