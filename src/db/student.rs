//! Student accounts.

use serde::Serialize;
use sqlx::QueryBuilder;
use utoipa::ToSchema;

use super::DbPool;
use crate::{IjaraError, Result};

/// Student entity.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Student {
    /// Unique student ID.
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    /// Login phone number (unique).
    pub phone: String,
    /// Gender reference.
    pub jins_id: i64,
    pub university_id: Option<i64>,
    pub faculty_id: Option<i64>,
    /// Year of study.
    pub grade: Option<i64>,
    pub district_id: Option<i64>,
    /// Password hash (Argon2).
    #[serde(skip_serializing)]
    pub password: String,
    /// Hashcode of the profile image.
    pub image: Option<String>,
    /// Hide the profile from other users.
    pub invisible: bool,
    /// Registration timestamp.
    pub register_at: String,
}

/// Data for creating a new student.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub jins_id: i64,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    pub image: Option<String>,
    pub invisible: bool,
}

/// Profile fields a student may change.
#[derive(Debug, Clone, Default)]
pub struct StudentUpdate {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub university_id: Option<i64>,
    pub faculty_id: Option<i64>,
    pub grade: Option<i64>,
    pub district_id: Option<i64>,
    pub invisible: Option<bool>,
}

impl StudentUpdate {
    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.firstname.is_none()
            && self.lastname.is_none()
            && self.university_id.is_none()
            && self.faculty_id.is_none()
            && self.grade.is_none()
            && self.district_id.is_none()
            && self.invisible.is_none()
    }
}

const STUDENT_COLUMNS: &str = "id, firstname, lastname, phone, jins_id, university_id, faculty_id,
     grade, district_id, password, image, invisible, register_at";

/// Repository for student accounts.
pub struct StudentRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> StudentRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a student. A taken phone number yields `Conflict`.
    pub async fn create(&self, new_student: &NewStudent) -> Result<Student> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO students (firstname, lastname, phone, jins_id, password, image, invisible)
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&new_student.firstname)
        .bind(&new_student.lastname)
        .bind(&new_student.phone)
        .bind(new_student.jins_id)
        .bind(&new_student.password)
        .bind(&new_student.image)
        .bind(new_student.invisible)
        .fetch_one(self.pool)
        .await
        .map_err(|e| IjaraError::from_sqlx(e, "phone"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| IjaraError::NotFound("student".to_string()))
    }

    /// Get a student by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(student)
    }

    /// Get a student by phone number.
    pub async fn get_by_phone(&self, phone: &str) -> Result<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE phone = $1"
        ))
        .bind(phone)
        .fetch_optional(self.pool)
        .await?;
        Ok(student)
    }

    /// Check whether a phone number is registered.
    pub async fn phone_exists(&self, phone: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE phone = $1)")
                .bind(phone)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Update profile fields.
    ///
    /// Returns the updated student, or None if not found.
    pub async fn update(&self, id: i64, update: &StudentUpdate) -> Result<Option<Student>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE students SET ");
        let mut separated = query.separated(", ");

        if let Some(ref firstname) = update.firstname {
            separated.push("firstname = ");
            separated.push_bind_unseparated(firstname);
        }
        if let Some(ref lastname) = update.lastname {
            separated.push("lastname = ");
            separated.push_bind_unseparated(lastname);
        }
        if let Some(university_id) = update.university_id {
            separated.push("university_id = ");
            separated.push_bind_unseparated(university_id);
        }
        if let Some(faculty_id) = update.faculty_id {
            separated.push("faculty_id = ");
            separated.push_bind_unseparated(faculty_id);
        }
        if let Some(grade) = update.grade {
            separated.push("grade = ");
            separated.push_bind_unseparated(grade);
        }
        if let Some(district_id) = update.district_id {
            separated.push("district_id = ");
            separated.push_bind_unseparated(district_id);
        }
        if let Some(invisible) = update.invisible {
            separated.push("invisible = ");
            separated.push_bind_unseparated(invisible);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| IjaraError::from_sqlx(e, "profile"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Page through students, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(students)
    }

    /// Count all students.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
