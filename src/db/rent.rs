//! Listings ("rents").
//!
//! A listing belongs to exactly one renter and is never hard-deleted.
//! Category, gender and owner are joined in at query time into
//! [`RentDetails`].

use serde::Serialize;
use sqlx::QueryBuilder;
use utoipa::ToSchema;

use super::DbPool;
use crate::{IjaraError, Result};

/// Listing row.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Rent {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    /// Whether a formal contract is signed.
    pub contract: bool,
    /// Whether the listing goes through a broker.
    pub broker: bool,
    pub room_count: i64,
    pub total_price: f64,
    /// Gender of the students the listing is for.
    pub student_jins_id: i64,
    /// Number of students the place fits.
    pub student_count: i64,
    /// Owning renter.
    pub renter_id: i64,
    pub location: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub wifi: bool,
    pub conditioner: bool,
    pub washing_machine: bool,
    pub tv: bool,
    pub refrigerator: bool,
    pub furniture: bool,
    pub other_convenience: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Listing joined with its category, gender and owner.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct RentDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub rent: Rent,
    pub category_name_uz: String,
    pub category_name_ru: String,
    pub jins_name_uz: String,
    pub jins_name_ru: String,
    pub renter_firstname: String,
    pub renter_lastname: String,
    pub renter_phone: String,
}

/// Data for creating a listing.
#[derive(Debug, Clone, Default)]
pub struct NewRent {
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub contract: bool,
    pub broker: bool,
    pub room_count: i64,
    pub total_price: f64,
    pub student_jins_id: i64,
    pub student_count: i64,
    pub renter_id: i64,
    pub location: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub wifi: bool,
    pub conditioner: bool,
    pub washing_machine: bool,
    pub tv: bool,
    pub refrigerator: bool,
    pub furniture: bool,
    pub other_convenience: Option<String>,
}

/// Partial listing update.
#[derive(Debug, Clone, Default)]
pub struct RentUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub contract: Option<bool>,
    pub broker: Option<bool>,
    pub room_count: Option<i64>,
    pub total_price: Option<f64>,
    pub student_jins_id: Option<i64>,
    pub student_count: Option<i64>,
    pub location: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub wifi: Option<bool>,
    pub conditioner: Option<bool>,
    pub washing_machine: Option<bool>,
    pub tv: Option<bool>,
    pub refrigerator: Option<bool>,
    pub furniture: Option<bool>,
    pub other_convenience: Option<String>,
}

/// Search criteria. Unset fields do not restrict.
#[derive(Debug, Clone, Default)]
pub struct RentFilter {
    pub category_id: Option<i64>,
    pub student_jins_id: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub room_count: Option<i64>,
    pub contract: Option<bool>,
    pub broker: Option<bool>,
}

const RENT_COLUMNS: &str = "id, name, description, category_id, contract, broker, room_count,
     total_price, student_jins_id, student_count, renter_id, location, longitude, latitude,
     wifi, conditioner, washing_machine, tv, refrigerator, furniture, other_convenience,
     created_at, updated_at";

const DETAILS_SELECT: &str = "SELECT r.id, r.name, r.description, r.category_id, r.contract,
     r.broker, r.room_count, r.total_price, r.student_jins_id, r.student_count, r.renter_id,
     r.location, r.longitude, r.latitude, r.wifi, r.conditioner, r.washing_machine, r.tv,
     r.refrigerator, r.furniture, r.other_convenience, r.created_at, r.updated_at,
     c.name_uz AS category_name_uz, c.name_ru AS category_name_ru,
     j.name_uz AS jins_name_uz, j.name_ru AS jins_name_ru,
     o.firstname AS renter_firstname, o.lastname AS renter_lastname, o.phone AS renter_phone
     FROM rents r
     JOIN categories c ON c.id = r.category_id
     JOIN jins j ON j.id = r.student_jins_id
     JOIN renters o ON o.id = r.renter_id";

/// Repository for listings.
pub struct RentRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> RentRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a listing and return its ID.
    ///
    /// Identical payloads create distinct rows.
    pub async fn create(&self, rent: &NewRent) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO rents (name, description, category_id, contract, broker, room_count,
                total_price, student_jins_id, student_count, renter_id, location, longitude,
                latitude, wifi, conditioner, washing_machine, tv, refrigerator, furniture,
                other_convenience)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20)
             RETURNING id",
        )
        .bind(&rent.name)
        .bind(&rent.description)
        .bind(rent.category_id)
        .bind(rent.contract)
        .bind(rent.broker)
        .bind(rent.room_count)
        .bind(rent.total_price)
        .bind(rent.student_jins_id)
        .bind(rent.student_count)
        .bind(rent.renter_id)
        .bind(&rent.location)
        .bind(rent.longitude)
        .bind(rent.latitude)
        .bind(rent.wifi)
        .bind(rent.conditioner)
        .bind(rent.washing_machine)
        .bind(rent.tv)
        .bind(rent.refrigerator)
        .bind(rent.furniture)
        .bind(&rent.other_convenience)
        .fetch_one(self.pool)
        .await
        .map_err(|e| IjaraError::from_sqlx(e, "rent"))?;

        Ok(id)
    }

    /// Get a listing by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Rent>> {
        let rent = sqlx::query_as::<_, Rent>(&format!(
            "SELECT {RENT_COLUMNS} FROM rents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(rent)
    }

    /// Check whether a listing exists.
    pub async fn exists(&self, id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM rents WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Get a listing with its joined data.
    pub async fn get_details(&self, id: i64) -> Result<Option<RentDetails>> {
        let rent = sqlx::query_as::<_, RentDetails>(&format!("{DETAILS_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(rent)
    }

    /// List all listings, newest first.
    pub async fn list_details(&self) -> Result<Vec<RentDetails>> {
        let rents = sqlx::query_as::<_, RentDetails>(&format!(
            "{DETAILS_SELECT} ORDER BY r.created_at DESC, r.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rents)
    }

    /// List listings matching a filter.
    pub async fn filter(&self, filter: &RentFilter) -> Result<Vec<RentDetails>> {
        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(DETAILS_SELECT);
        query.push(" WHERE 1 = 1");

        if let Some(category_id) = filter.category_id {
            query.push(" AND r.category_id = ").push_bind(category_id);
        }
        if let Some(jins_id) = filter.student_jins_id {
            query.push(" AND r.student_jins_id = ").push_bind(jins_id);
        }
        if let Some(min_price) = filter.min_price {
            query.push(" AND r.total_price >= ").push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            query.push(" AND r.total_price <= ").push_bind(max_price);
        }
        if let Some(room_count) = filter.room_count {
            query.push(" AND r.room_count = ").push_bind(room_count);
        }
        if let Some(contract) = filter.contract {
            query.push(" AND r.contract = ").push_bind(contract);
        }
        if let Some(broker) = filter.broker {
            query.push(" AND r.broker = ").push_bind(broker);
        }
        query.push(" ORDER BY r.created_at DESC, r.id DESC");

        let rents = query
            .build_query_as::<RentDetails>()
            .fetch_all(self.pool)
            .await?;
        Ok(rents)
    }

    /// Listings for a gender created within the last `days` days.
    pub async fn recent_for_jins(&self, jins_id: i64, days: u32) -> Result<Vec<RentDetails>> {
        let rents = sqlx::query_as::<_, RentDetails>(&format!(
            "{DETAILS_SELECT}
             WHERE r.student_jins_id = $1 AND r.created_at >= datetime('now', $2)
             ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(jins_id)
        .bind(format!("-{days} days"))
        .fetch_all(self.pool)
        .await?;
        Ok(rents)
    }

    /// Listings owned by a renter.
    pub async fn list_by_renter(&self, renter_id: i64) -> Result<Vec<RentDetails>> {
        let rents = sqlx::query_as::<_, RentDetails>(&format!(
            "{DETAILS_SELECT} WHERE r.renter_id = $1 ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(renter_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rents)
    }

    /// Listings in a student's wishlist.
    pub async fn list_wishlisted(&self, user_id: i64) -> Result<Vec<RentDetails>> {
        let rents = sqlx::query_as::<_, RentDetails>(&format!(
            "{DETAILS_SELECT}
             JOIN wishlists w ON w.rent_id = r.id
             WHERE w.user_id = $1
             ORDER BY w.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rents)
    }

    /// Update a listing owned by `renter_id` and stamp `updated_at`.
    ///
    /// Returns None when the listing does not exist or belongs to someone
    /// else.
    pub async fn update_owned(
        &self,
        id: i64,
        renter_id: i64,
        update: &RentUpdate,
    ) -> Result<Option<Rent>> {
        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE rents SET ");
        let mut separated = query.separated(", ");

        separated.push("updated_at = datetime('now')");
        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(ref description) = update.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }
        if let Some(category_id) = update.category_id {
            separated.push("category_id = ");
            separated.push_bind_unseparated(category_id);
        }
        if let Some(contract) = update.contract {
            separated.push("contract = ");
            separated.push_bind_unseparated(contract);
        }
        if let Some(broker) = update.broker {
            separated.push("broker = ");
            separated.push_bind_unseparated(broker);
        }
        if let Some(room_count) = update.room_count {
            separated.push("room_count = ");
            separated.push_bind_unseparated(room_count);
        }
        if let Some(total_price) = update.total_price {
            separated.push("total_price = ");
            separated.push_bind_unseparated(total_price);
        }
        if let Some(jins_id) = update.student_jins_id {
            separated.push("student_jins_id = ");
            separated.push_bind_unseparated(jins_id);
        }
        if let Some(student_count) = update.student_count {
            separated.push("student_count = ");
            separated.push_bind_unseparated(student_count);
        }
        if let Some(ref location) = update.location {
            separated.push("location = ");
            separated.push_bind_unseparated(location);
        }
        if let Some(longitude) = update.longitude {
            separated.push("longitude = ");
            separated.push_bind_unseparated(longitude);
        }
        if let Some(latitude) = update.latitude {
            separated.push("latitude = ");
            separated.push_bind_unseparated(latitude);
        }
        for (column, value) in [
            ("wifi", update.wifi),
            ("conditioner", update.conditioner),
            ("washing_machine", update.washing_machine),
            ("tv", update.tv),
            ("refrigerator", update.refrigerator),
            ("furniture", update.furniture),
        ] {
            if let Some(value) = value {
                separated.push(format!("{column} = "));
                separated.push_bind_unseparated(value);
            }
        }
        if let Some(ref other) = update.other_convenience {
            separated.push("other_convenience = ");
            separated.push_bind_unseparated(other);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(" AND renter_id = ").push_bind(renter_id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| IjaraError::from_sqlx(e, "rent"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }
}
