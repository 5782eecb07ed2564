use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::models::{EntityId, Employer};

use super::{Store, StoreError, classify_sqlx_error};

impl Store {
    pub async fn create_employer(
        &self,
        name: &str,
        notes: Option<&str>,
        tags: &[String],
    ) -> Result<Employer, StoreError> {
        let row = sqlx::query(
            "INSERT INTO employers (name, notes, tags)
             VALUES ($1, $2, $3)
             RETURNING id, name, notes, tags, created_at, updated_at",
        )
        .bind(name)
        .bind(notes)
        .bind(tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify_sqlx_error(err, "employers.name"))?;

        row_to_employer(&row)
    }

    pub async fn get_employer(&self, id: EntityId) -> Result<Employer, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, notes, tags, created_at, updated_at
             FROM employers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("employer {id}")))?;

        row_to_employer(&row)
    }

    pub async fn list_employers(&self) -> Result<Vec<Employer>, StoreError> {
        let rows = sqlx::query("SELECT id, name, notes, tags, created_at, updated_at FROM employers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_employer).collect()
    }

    pub async fn update_employer(
        &self,
        id: EntityId,
        name: Option<&str>,
        notes: Option<Option<&str>>,
        tags: Option<&[String]>,
    ) -> Result<Employer, StoreError> {
        sqlx::query(
            "UPDATE employers SET
               name = COALESCE($2, name),
               notes = CASE WHEN $3 THEN $4 ELSE notes END,
               tags = COALESCE($5, tags),
               updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .bind(notes.is_some())
        .bind(notes.flatten())
        .bind(tags)
        .execute(&self.pool)
        .await
        .map_err(|err| classify_sqlx_error(err, "employers.name"))?;

        self.get_employer(id).await
    }

    pub async fn delete_employer(&self, id: EntityId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM employers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| classify_sqlx_error(err, "project.on_behalf_of_id"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("employer {id}")));
        }
        Ok(())
    }
}

fn row_to_employer(row: &PgRow) -> Result<Employer, StoreError> {
    let tags: Vec<String> = row.try_get("tags")?;
    Ok(Employer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        notes: row.try_get("notes")?,
        tags: tags.into_iter().collect(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
