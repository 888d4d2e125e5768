//! Staff accounts.

use serde::Serialize;
use utoipa::ToSchema;

use super::DbPool;
use crate::{IjaraError, Result};

/// Staff entity.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Staff {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    /// Login email (unique, case-insensitive).
    pub email: String,
    /// Password hash (Argon2).
    #[serde(skip_serializing)]
    pub password: String,
    pub role_id: i64,
    pub registered_at: String,
    pub last_login: Option<String>,
}

/// Data for creating a staff account.
#[derive(Debug, Clone)]
pub struct NewStaff {
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    pub role_id: i64,
}

/// Repository for staff accounts.
pub struct StaffRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> StaffRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a staff account.
    pub async fn create(&self, new_staff: &NewStaff) -> Result<Staff> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO staff (firstname, lastname, phone, email, password, role_id)
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&new_staff.firstname)
        .bind(&new_staff.lastname)
        .bind(&new_staff.phone)
        .bind(&new_staff.email)
        .bind(&new_staff.password)
        .bind(new_staff.role_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| IjaraError::from_sqlx(e, "staff account"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| IjaraError::NotFound("staff".to_string()))
    }

    /// Get a staff member by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(
            "SELECT id, firstname, lastname, phone, email, password, role_id, registered_at, last_login
             FROM staff WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(staff)
    }

    /// Get a staff member by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(
            "SELECT id, firstname, lastname, phone, email, password, role_id, registered_at, last_login
             FROM staff WHERE email = $1 COLLATE NOCASE",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(staff)
    }

    /// Update the last login timestamp.
    pub async fn update_last_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE staff SET last_login = datetime('now') WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Count staff accounts.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn new_staff(email: &str) -> NewStaff {
        NewStaff {
            firstname: "Dilnoza".to_string(),
            lastname: "Rahimova".to_string(),
            phone: "+998935556677".to_string(),
            email: email.to_string(),
            password: "hash".to_string(),
            role_id: 1,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_by_email() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = StaffRepository::new(db.pool());

        let staff = repo.create(&new_staff("admin@ijara.uz")).await.unwrap();
        assert_eq!(staff.role_id, 1);
        assert!(staff.last_login.is_none());

        let found = repo.get_by_email("ADMIN@ijara.uz").await.unwrap().unwrap();
        assert_eq!(found.id, staff.id);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_last_login() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = StaffRepository::new(db.pool());

        let staff = repo.create(&new_staff("admin@ijara.uz")).await.unwrap();
        repo.update_last_login(staff.id).await.unwrap();

        let updated = repo.get_by_id(staff.id).await.unwrap().unwrap();
        assert!(updated.last_login.is_some());
    }

    #[tokio::test]
    async fn test_unknown_role_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = StaffRepository::new(db.pool());

        let mut staff = new_staff("admin@ijara.uz");
        staff.role_id = 77;
        assert!(matches!(
            repo.create(&staff).await,
            Err(IjaraError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = StaffRepository::new(db.pool());

        repo.create(&new_staff("admin@ijara.uz")).await.unwrap();
        let mut second = new_staff("admin@ijara.uz");
        second.phone = "+998930000000".to_string();
        assert!(matches!(
            repo.create(&second).await,
            Err(IjaraError::Conflict(_))
        ));
    }
}
