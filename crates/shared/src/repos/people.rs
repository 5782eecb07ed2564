use std::collections::BTreeMap;

use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::models::{EntityId, Person};

use super::{Store, StoreError, classify_sqlx_error};

impl Store {
    #[allow(clippy::too_many_arguments)]
    pub async fn create_person(
        &self,
        full_name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        linkedin_url: Option<&str>,
        company: Option<&str>,
        title: Option<&str>,
        notes: Option<&str>,
        additional_info: &BTreeMap<String, String>,
        is_stakeholder: bool,
        tags: &[String],
    ) -> Result<Person, StoreError> {
        let additional_info_json = serde_json::to_value(additional_info)
            .map_err(|err| StoreError::InvalidData(format!("additional_info: {err}")))?;

        let row = sqlx::query(
            "INSERT INTO people (
                full_name, email, phone, linkedin_url, company, title, notes,
                additional_info, is_stakeholder, tags
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING id, full_name, email, phone, linkedin_url, company, title, notes,
                       additional_info, is_stakeholder, tags, created_at, updated_at",
        )
        .bind(full_name)
        .bind(email)
        .bind(phone)
        .bind(linkedin_url)
        .bind(company)
        .bind(title)
        .bind(notes)
        .bind(additional_info_json)
        .bind(is_stakeholder)
        .bind(tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify_sqlx_error(err, "person.email"))?;

        row_to_person(&row)
    }

    pub async fn get_person(&self, id: EntityId) -> Result<Person, StoreError> {
        let row = sqlx::query(
            "SELECT id, full_name, email, phone, linkedin_url, company, title, notes,
                    additional_info, is_stakeholder, tags, created_at, updated_at
             FROM people WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("person {id}")))?;

        row_to_person(&row)
    }

    pub async fn list_people(&self) -> Result<Vec<Person>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, full_name, email, phone, linkedin_url, company, title, notes,
                    additional_info, is_stakeholder, tags, created_at, updated_at
             FROM people ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_person).collect()
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_person(
        &self,
        id: EntityId,
        full_name: Option<&str>,
        email: Option<Option<&str>>,
        phone: Option<Option<&str>>,
        linkedin_url: Option<Option<&str>>,
        company: Option<Option<&str>>,
        title: Option<Option<&str>>,
        notes: Option<Option<&str>>,
        additional_info: Option<&BTreeMap<String, String>>,
        is_stakeholder: Option<bool>,
        tags: Option<&[String]>,
    ) -> Result<Person, StoreError> {
        let additional_info_json = additional_info
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| StoreError::InvalidData(format!("additional_info: {err}")))?;

        sqlx::query(
            "UPDATE people SET
               full_name = COALESCE($2, full_name),
               email = CASE WHEN $3 THEN $4 ELSE email END,
               phone = CASE WHEN $5 THEN $6 ELSE phone END,
               linkedin_url = CASE WHEN $7 THEN $8 ELSE linkedin_url END,
               company = CASE WHEN $9 THEN $10 ELSE company END,
               title = CASE WHEN $11 THEN $12 ELSE title END,
               notes = CASE WHEN $13 THEN $14 ELSE notes END,
               additional_info = COALESCE($15, additional_info),
               is_stakeholder = COALESCE($16, is_stakeholder),
               tags = COALESCE($17, tags),
               updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(full_name)
        .bind(email.is_some())
        .bind(email.flatten())
        .bind(phone.is_some())
        .bind(phone.flatten())
        .bind(linkedin_url.is_some())
        .bind(linkedin_url.flatten())
        .bind(company.is_some())
        .bind(company.flatten())
        .bind(title.is_some())
        .bind(title.flatten())
        .bind(notes.is_some())
        .bind(notes.flatten())
        .bind(additional_info_json)
        .bind(is_stakeholder)
        .bind(tags)
        .execute(&self.pool)
        .await
        .map_err(|err| classify_sqlx_error(err, "person.email"))?;

        self.get_person(id).await
    }

    pub async fn delete_person(&self, id: EntityId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| classify_sqlx_error(err, "client.contact_person_id"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("person {id}")));
        }
        Ok(())
    }
}

fn row_to_person(row: &PgRow) -> Result<Person, StoreError> {
    let tags: Vec<String> = row.try_get("tags")?;
    let additional_info_json: serde_json::Value = row.try_get("additional_info")?;
    let additional_info: BTreeMap<String, String> = serde_json::from_value(additional_info_json)
        .map_err(|err| StoreError::InvalidData(format!("additional_info: {err}")))?;

    Ok(Person {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        linkedin_url: row.try_get("linkedin_url")?,
        company: row.try_get("company")?,
        title: row.try_get("title")?,
        notes: row.try_get("notes")?,
        additional_info,
        is_stakeholder: row.try_get("is_stakeholder")?,
        tags: tags.into_iter().collect(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
