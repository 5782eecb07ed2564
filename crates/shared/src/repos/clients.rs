use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::models::{Client, ClientStatus, ClientType, EntityId};

use super::{Store, StoreError, classify_sqlx_error};

impl Store {
    #[allow(clippy::too_many_arguments)]
    pub async fn create_client(
        &self,
        name: &str,
        client_type: ClientType,
        status: ClientStatus,
        contact_person_id: Option<EntityId>,
        notes: Option<&str>,
        tags: &[String],
    ) -> Result<Client, StoreError> {
        let row = sqlx::query(
            "INSERT INTO clients (name, client_type, status, contact_person_id, notes, tags)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, name, client_type, status, contact_person_id, notes, tags,
                       created_at, updated_at",
        )
        .bind(name)
        .bind(client_type.as_str())
        .bind(status.as_str())
        .bind(contact_person_id)
        .bind(notes)
        .bind(tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify_sqlx_error(err, "client.contact_person_id"))?;

        row_to_client(&row)
    }

    pub async fn get_client(&self, id: EntityId) -> Result<Client, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, client_type, status, contact_person_id, notes, tags,
                    created_at, updated_at
             FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("client {id}")))?;

        row_to_client(&row)
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, client_type, status, contact_person_id, notes, tags,
                    created_at, updated_at
             FROM clients ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_client).collect()
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_client(
        &self,
        id: EntityId,
        name: Option<&str>,
        client_type: Option<ClientType>,
        status: Option<ClientStatus>,
        contact_person_id: Option<Option<EntityId>>,
        notes: Option<Option<&str>>,
        tags: Option<&[String]>,
    ) -> Result<Client, StoreError> {
        sqlx::query(
            "UPDATE clients SET
               name = COALESCE($2, name),
               client_type = COALESCE($3, client_type),
               status = COALESCE($4, status),
               contact_person_id = CASE WHEN $5 THEN $6 ELSE contact_person_id END,
               notes = CASE WHEN $7 THEN $8 ELSE notes END,
               tags = COALESCE($9, tags),
               updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .bind(client_type.map(|c| c.as_str()))
        .bind(status.map(|s| s.as_str()))
        .bind(contact_person_id.is_some())
        .bind(contact_person_id.flatten())
        .bind(notes.is_some())
        .bind(notes.flatten())
        .bind(tags)
        .execute(&self.pool)
        .await
        .map_err(|err| classify_sqlx_error(err, "client.contact_person_id"))?;

        self.get_client(id).await
    }

    pub async fn delete_client(&self, id: EntityId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| classify_sqlx_error(err, "project.client_id"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("client {id}")));
        }
        Ok(())
    }
}

fn row_to_client(row: &PgRow) -> Result<Client, StoreError> {
    let client_type: String = row.try_get("client_type")?;
    let status: String = row.try_get("status")?;
    let tags: Vec<String> = row.try_get("tags")?;

    Ok(Client {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        client_type: ClientType::from_str(&client_type).ok_or_else(|| {
            StoreError::InvalidData(format!("unknown client_type persisted: {client_type}"))
        })?,
        status: ClientStatus::from_str(&status).ok_or_else(|| {
            StoreError::InvalidData(format!("unknown client status persisted: {status}"))
        })?,
        contact_person_id: row.try_get("contact_person_id")?,
        notes: row.try_get("notes")?,
        tags: tags.into_iter().collect(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
