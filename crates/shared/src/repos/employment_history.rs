use chrono::NaiveDate;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::models::{EmploymentHistory, EntityId};

use super::{Store, StoreError, classify_sqlx_error};

impl Store {
    /// Invariant: at most one current (`end_date IS NULL`) row per
    /// `(person_id, client_id)` (spec §3). Enforced by a partial
    /// unique index; a violation surfaces as `Conflict`.
    pub async fn create_employment_history(
        &self,
        person_id: EntityId,
        client_id: EntityId,
        role: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<EmploymentHistory, StoreError> {
        let row = sqlx::query(
            "INSERT INTO employment_history (person_id, client_id, role, start_date, end_date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, person_id, client_id, role, start_date, end_date,
                       created_at, updated_at",
        )
        .bind(person_id)
        .bind(client_id)
        .bind(role)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify_sqlx_error(err, "employment_history.person_id"))?;

        row_to_employment_history(&row)
    }

    pub async fn list_employment_history_for_person(
        &self,
        person_id: EntityId,
    ) -> Result<Vec<EmploymentHistory>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, person_id, client_id, role, start_date, end_date, created_at, updated_at
             FROM employment_history WHERE person_id = $1 ORDER BY start_date",
        )
        .bind(person_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_employment_history).collect()
    }
}

fn row_to_employment_history(row: &PgRow) -> Result<EmploymentHistory, StoreError> {
    Ok(EmploymentHistory {
        id: row.try_get("id")?,
        person_id: row.try_get("person_id")?,
        client_id: row.try_get("client_id")?,
        role: row.try_get("role")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
