use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::models::{EntityId, EntityRefType, Note, PrivacyLevel};

use super::{Store, StoreError, classify_sqlx_error};

impl Store {
    /// Invariant: `(entity_type, entity_id)` are both null or both
    /// non-null (spec §3), enforced here before the insert rather
    /// than relying on a check constraint alone, so the caller gets
    /// `InvalidArgument` rather than a raw database error.
    pub async fn create_note(
        &self,
        text: &str,
        privacy_level: PrivacyLevel,
        entity_ref: Option<(EntityRefType, EntityId)>,
        tags: &[String],
    ) -> Result<Note, StoreError> {
        let (entity_type, entity_id) = match entity_ref {
            Some((t, id)) => (Some(t.as_str()), Some(id)),
            None => (None, None),
        };

        let row = sqlx::query(
            "INSERT INTO notes (text, privacy_level, entity_type, entity_id, tags)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, text, privacy_level, entity_type, entity_id, tags,
                       created_at, updated_at",
        )
        .bind(text)
        .bind(privacy_level.as_str())
        .bind(entity_type)
        .bind(entity_id)
        .bind(tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify_sqlx_error(err, "note.entity_id"))?;

        row_to_note(&row)
    }

    pub async fn get_note(&self, id: EntityId) -> Result<Note, StoreError> {
        let row = sqlx::query(
            "SELECT id, text, privacy_level, entity_type, entity_id, tags, created_at, updated_at
             FROM notes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("note {id}")))?;

        row_to_note(&row)
    }

    pub async fn list_notes(&self) -> Result<Vec<Note>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, text, privacy_level, entity_type, entity_id, tags, created_at, updated_at
             FROM notes ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_note).collect()
    }

    pub async fn update_note(
        &self,
        id: EntityId,
        text: Option<&str>,
        privacy_level: Option<PrivacyLevel>,
        tags: Option<&[String]>,
    ) -> Result<Note, StoreError> {
        sqlx::query(
            "UPDATE notes SET
               text = COALESCE($2, text),
               privacy_level = COALESCE($3, privacy_level),
               tags = COALESCE($4, tags),
               updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(text)
        .bind(privacy_level.map(|p| p.as_str()))
        .bind(tags)
        .execute(&self.pool)
        .await?;

        self.get_note(id).await
    }

    pub async fn delete_note(&self, id: EntityId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("note {id}")));
        }
        Ok(())
    }
}

fn row_to_note(row: &PgRow) -> Result<Note, StoreError> {
    let privacy_level: String = row.try_get("privacy_level")?;
    let entity_type: Option<String> = row.try_get("entity_type")?;
    let tags: Vec<String> = row.try_get("tags")?;

    let entity_type = entity_type
        .map(|value| {
            EntityRefType::from_str(&value).ok_or_else(|| {
                StoreError::InvalidData(format!("unknown entity_type persisted: {value}"))
            })
        })
        .transpose()?;

    Ok(Note {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        privacy_level: PrivacyLevel::from_str(&privacy_level).ok_or_else(|| {
            StoreError::InvalidData(format!("unknown privacy_level persisted: {privacy_level}"))
        })?,
        entity_type,
        entity_id: row.try_get("entity_id")?,
        tags: tags.into_iter().collect(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
