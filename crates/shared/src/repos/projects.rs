use chrono::NaiveDate;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::models::{EntityId, Project, ProjectStatus};

use super::{Store, StoreError, classify_sqlx_error};

impl Store {
    #[allow(clippy::too_many_arguments)]
    pub async fn create_project(
        &self,
        name: &str,
        client_id: EntityId,
        on_behalf_of_id: Option<EntityId>,
        description: Option<&str>,
        status: ProjectStatus,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        tags: &[String],
    ) -> Result<Project, StoreError> {
        let row = sqlx::query(
            "INSERT INTO projects (
                name, client_id, on_behalf_of_id, description, status, start_date, end_date, tags
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, name, client_id, on_behalf_of_id, description, status,
                       start_date, end_date, tags, created_at, updated_at",
        )
        .bind(name)
        .bind(client_id)
        .bind(on_behalf_of_id)
        .bind(description)
        .bind(status.as_str())
        .bind(start_date)
        .bind(end_date)
        .bind(tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify_sqlx_error(err, "project.client_id"))?;

        row_to_project(&row)
    }

    pub async fn get_project(&self, id: EntityId) -> Result<Project, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, client_id, on_behalf_of_id, description, status,
                    start_date, end_date, tags, created_at, updated_at
             FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("project {id}")))?;

        row_to_project(&row)
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, client_id, on_behalf_of_id, description, status,
                    start_date, end_date, tags, created_at, updated_at
             FROM projects ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_project).collect()
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_project(
        &self,
        id: EntityId,
        name: Option<&str>,
        client_id: Option<EntityId>,
        on_behalf_of_id: Option<Option<EntityId>>,
        description: Option<Option<&str>>,
        status: Option<ProjectStatus>,
        start_date: Option<Option<NaiveDate>>,
        end_date: Option<Option<NaiveDate>>,
        tags: Option<&[String]>,
    ) -> Result<Project, StoreError> {
        sqlx::query(
            "UPDATE projects SET
               name = COALESCE($2, name),
               client_id = COALESCE($3, client_id),
               on_behalf_of_id = CASE WHEN $4 THEN $5 ELSE on_behalf_of_id END,
               description = CASE WHEN $6 THEN $7 ELSE description END,
               status = COALESCE($8, status),
               start_date = CASE WHEN $9 THEN $10 ELSE start_date END,
               end_date = CASE WHEN $11 THEN $12 ELSE end_date END,
               tags = COALESCE($13, tags),
               updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .bind(client_id)
        .bind(on_behalf_of_id.is_some())
        .bind(on_behalf_of_id.flatten())
        .bind(description.is_some())
        .bind(description.flatten())
        .bind(status.map(|s| s.as_str()))
        .bind(start_date.is_some())
        .bind(start_date.flatten())
        .bind(end_date.is_some())
        .bind(end_date.flatten())
        .bind(tags)
        .execute(&self.pool)
        .await
        .map_err(|err| classify_sqlx_error(err, "project.client_id"))?;

        self.get_project(id).await
    }

    pub async fn delete_project(&self, id: EntityId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| classify_sqlx_error(err, "work_session.project_id"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("project {id}")));
        }
        Ok(())
    }
}

fn row_to_project(row: &PgRow) -> Result<Project, StoreError> {
    let status: String = row.try_get("status")?;
    let tags: Vec<String> = row.try_get("tags")?;

    Ok(Project {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        client_id: row.try_get("client_id")?,
        on_behalf_of_id: row.try_get("on_behalf_of_id")?,
        description: row.try_get("description")?,
        status: ProjectStatus::from_str(&status).ok_or_else(|| {
            StoreError::InvalidData(format!("unknown project status persisted: {status}"))
        })?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        tags: tags.into_iter().collect(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
