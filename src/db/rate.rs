//! Listing reviews.

use serde::Serialize;
use utoipa::ToSchema;

use super::DbPool;
use crate::{IjaraError, Result};

/// Review row.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Rate {
    pub id: i64,
    /// Reviewing student.
    pub user_id: i64,
    pub rent_id: i64,
    /// Score from 1 to 5.
    pub rate: i64,
    pub comment: Option<String>,
    pub created_at: String,
}

/// Review joined with the reviewer's name.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct ReviewDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub rate: Rate,
    pub firstname: String,
    pub lastname: String,
}

/// Data for creating a review.
#[derive(Debug, Clone)]
pub struct NewRate {
    pub user_id: i64,
    pub rent_id: i64,
    pub rate: i64,
    pub comment: Option<String>,
}

/// Repository for reviews.
pub struct RateRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> RateRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a review.
    pub async fn create(&self, rate: &NewRate) -> Result<Rate> {
        let created = sqlx::query_as::<_, Rate>(
            "INSERT INTO rates (user_id, rent_id, rate, comment) VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, rent_id, rate, comment, created_at",
        )
        .bind(rate.user_id)
        .bind(rate.rent_id)
        .bind(rate.rate)
        .bind(&rate.comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| IjaraError::from_sqlx(e, "review"))?;
        Ok(created)
    }

    /// Reviews of a listing with reviewer names, oldest first.
    pub async fn list_for_rent(&self, rent_id: i64) -> Result<Vec<ReviewDetails>> {
        let reviews = sqlx::query_as::<_, ReviewDetails>(
            "SELECT r.id, r.user_id, r.rent_id, r.rate, r.comment, r.created_at,
                    s.firstname, s.lastname
             FROM rates r
             JOIN students s ON s.id = r.user_id
             WHERE r.rent_id = $1
             ORDER BY r.id",
        )
        .bind(rent_id)
        .fetch_all(self.pool)
        .await?;
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::rent::tests::{sample_rent, seed_renter};
    use crate::db::{Database, NewStudent, RentRepository, StudentRepository};

    async fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let renter_id = seed_renter(&db, "+998911234567").await;
        let rent_id = RentRepository::new(db.pool())
            .create(&sample_rent(renter_id))
            .await
            .unwrap();
        let student_id = StudentRepository::new(db.pool())
            .create(&NewStudent {
                firstname: "Aziz".to_string(),
                lastname: "Karimov".to_string(),
                phone: "+998901234567".to_string(),
                jins_id: 1,
                password: "hash".to_string(),
                image: None,
                invisible: false,
            })
            .await
            .unwrap()
            .id;
        (db, student_id, rent_id)
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (db, user_id, rent_id) = setup().await;
        let repo = RateRepository::new(db.pool());

        let rate = repo
            .create(&NewRate {
                user_id,
                rent_id,
                rate: 5,
                comment: Some("Zo'r".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(rate.rate, 5);

        let reviews = repo.list_for_rent(rent_id).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].firstname, "Aziz");
        assert_eq!(reviews[0].rate.comment.as_deref(), Some("Zo'r"));
        assert!(repo.list_for_rent(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_rent_rejected() {
        let (db, user_id, _) = setup().await;
        let repo = RateRepository::new(db.pool());

        let result = repo
            .create(&NewRate {
                user_id,
                rent_id: 999,
                rate: 3,
                comment: None,
            })
            .await;
        assert!(matches!(result, Err(IjaraError::Validation(_))));
    }

    #[tokio::test]
    async fn test_score_out_of_range_rejected() {
        let (db, user_id, rent_id) = setup().await;
        let repo = RateRepository::new(db.pool());

        let result = repo
            .create(&NewRate {
                user_id,
                rent_id,
                rate: 6,
                comment: None,
            })
            .await;
        assert!(result.is_err());
    }
}
