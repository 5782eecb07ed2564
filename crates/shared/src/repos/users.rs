use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::models::{PrivacyLevel, User};
use crate::timezone::WeekBoundary;

use super::{Store, StoreError};

impl Store {
    /// `User` is a singleton record (spec §3); creates the row with
    /// configured defaults on first access, otherwise returns it.
    pub async fn get_or_create_user(
        &self,
        default_name: &str,
        default_time_zone: &str,
        default_week_boundary: WeekBoundary,
        default_privacy_level: PrivacyLevel,
    ) -> Result<User, StoreError> {
        if let Some(row) = sqlx::query(
            "SELECT id, name, email, timezone, default_week_boundary, default_privacy_level,
                    created_at, updated_at
             FROM users WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?
        {
            return row_to_user(&row);
        }

        let row = sqlx::query(
            "INSERT INTO users (id, name, timezone, default_week_boundary, default_privacy_level)
             VALUES (1, $1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE SET name = users.name
             RETURNING id, name, email, timezone, default_week_boundary, default_privacy_level,
                       created_at, updated_at",
        )
        .bind(default_name)
        .bind(default_time_zone)
        .bind(default_week_boundary.as_str())
        .bind(default_privacy_level.as_str())
        .fetch_one(&self.pool)
        .await?;

        row_to_user(&row)
    }

    pub async fn update_user(
        &self,
        name: Option<&str>,
        email: Option<Option<&str>>,
        timezone: Option<&str>,
        default_week_boundary: Option<WeekBoundary>,
        default_privacy_level: Option<PrivacyLevel>,
    ) -> Result<User, StoreError> {
        let row = sqlx::query(
            "UPDATE users SET
               name = COALESCE($1, name),
               email = CASE WHEN $2 THEN $3 ELSE email END,
               timezone = COALESCE($4, timezone),
               default_week_boundary = COALESCE($5, default_week_boundary),
               default_privacy_level = COALESCE($6, default_privacy_level),
               updated_at = NOW()
             WHERE id = 1
             RETURNING id, name, email, timezone, default_week_boundary, default_privacy_level,
                       created_at, updated_at",
        )
        .bind(name)
        .bind(email.is_some())
        .bind(email.flatten())
        .bind(timezone)
        .bind(default_week_boundary.map(|w| w.as_str()))
        .bind(default_privacy_level.map(|p| p.as_str()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("user".to_string()))?;

        row_to_user(&row)
    }
}

fn row_to_user(row: &PgRow) -> Result<User, StoreError> {
    let week_boundary: String = row.try_get("default_week_boundary")?;
    let privacy_level: String = row.try_get("default_privacy_level")?;

    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        timezone: row.try_get("timezone")?,
        default_week_boundary: WeekBoundary::from_str(&week_boundary).ok_or_else(|| {
            StoreError::InvalidData(format!(
                "unknown default_week_boundary persisted: {week_boundary}"
            ))
        })?,
        default_privacy_level: PrivacyLevel::from_str(&privacy_level).ok_or_else(|| {
            StoreError::InvalidData(format!(
                "unknown default_privacy_level persisted: {privacy_level}"
            ))
        })?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
