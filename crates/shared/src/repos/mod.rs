//! The entity store (spec §3, §4 "Ownership"): typed persistent
//! records for all eleven entities, CRUD, FK integrity, and the
//! `created_at`/`updated_at` timestamp mixin maintained by the store
//! itself rather than by callers.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

mod clients;
mod employers;
mod employment_history;
mod meetings;
mod notes;
mod people;
mod projects;
mod reminders;
mod users;
mod work_sessions;

pub use meetings::LogMeetingOutcome;
pub use reminders::DueReminder;

/// Embedded at compile time from `crates/shared/migrations/`; applied
/// once up front by [`Store::connect`] so every binary that opens a
/// pool (mcp-server, worker, integration tests) runs against an
/// up-to-date schema without a separate deploy step.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("migrations");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("unique constraint violation: {0}")]
    UniqueViolation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

/// Postgres reports constraint violations via SQLSTATE, not via a
/// distinct Rust type; classify them here so every repo method gets
/// the same `InvalidArgument`/`Conflict` split the core error
/// taxonomy expects (spec §7) without repeating this match at every
/// call site.
fn classify_sqlx_error(err: sqlx::Error, context: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23503") => return classify_foreign_key_violation(context),
            Some("23505") => return StoreError::UniqueViolation(context.to_string()),
            _ => {}
        }
    }
    StoreError::Database(err)
}

/// Most FK violations are caller mistakes reported as `InvalidArgument`
/// (spec §7 "FK violations surface as `InvalidArgument`"), but a
/// handful of contexts name a required parent entity the caller
/// referenced directly by id and expected to already exist — those
/// surface as `NotFound` instead (spec §4.3: `log_meeting` with a
/// nonexistent `project_id` fails with `NotFound`, not
/// `InvalidArgument`).
fn classify_foreign_key_violation(context: &str) -> StoreError {
    match context {
        "meeting.project_id" => StoreError::NotFound(format!("project referenced by {context}")),
        _ => StoreError::ForeignKeyViolation(context.to_string()),
    }
}

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        MIGRATOR.run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let _: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    /// Drains the pool on shutdown (spec §6 "Exit behavior").
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
