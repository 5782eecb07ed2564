//! The structured query engine (spec §4.5 DSL, §4.6 executor): a
//! typed AST validated against a precomputed relationship graph, then
//! run as an in-memory relational plan over a full entity snapshot.
//!
//! The executor deliberately does not generate SQL: spec §5 places
//! "query compilation" alongside rounding as in-memory work, and a
//! single-user daemon's entity counts never justify streaming from
//! the database row by row.

pub mod ast;
pub mod executor;
pub mod schema;
pub mod snapshot;
pub mod validate;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CoreError;
use crate::privacy::AccessMode;
use crate::repos::Store;
use crate::timezone::WeekBoundary;

pub use ast::Query;
pub use executor::QueryOutcome;

/// A resolved scalar or list value in executor output, independent of
/// the AST's input [`ast::Literal`] so that decimals and datetimes
/// serialize as strings the way stored entities do (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiteralOut {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<LiteralOut>),
}

impl LiteralOut {
    fn rank(&self) -> u8 {
        match self {
            LiteralOut::Null => 0,
            LiteralOut::Bool(_) => 1,
            LiteralOut::Int(_) => 2,
            LiteralOut::String(_) => 3,
            LiteralOut::List(_) => 4,
        }
    }

    pub fn compare(a: &LiteralOut, b: &LiteralOut) -> Ordering {
        match (a, b) {
            (LiteralOut::Null, LiteralOut::Null) => Ordering::Equal,
            (LiteralOut::Bool(a), LiteralOut::Bool(b)) => a.cmp(b),
            (LiteralOut::Int(a), LiteralOut::Int(b)) => a.cmp(b),
            (LiteralOut::String(a), LiteralOut::String(b)) => a.cmp(b),
            (LiteralOut::List(a), LiteralOut::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ordering = LiteralOut::compare(x, y);
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => a.rank().cmp(&b.rank()),
        }
    }
}

/// Validates and runs `query` against a fresh snapshot of the store
/// (spec §4.5/§4.6). Each call reflects the store's state at the
/// instant of the call; there is no caching between queries.
pub async fn run_query(
    store: &Store,
    query: Query,
    access_mode: AccessMode,
    now: DateTime<Utc>,
    time_zone: &str,
    week_boundary: WeekBoundary,
) -> Result<QueryOutcome, CoreError> {
    let ctx = validate::ShortcutContext {
        now,
        time_zone: time_zone.to_string(),
        week_boundary,
    };
    let validated = validate::validate(&query, &ctx)?;
    let snapshot = snapshot::Snapshot::load(store).await?;
    Ok(executor::execute(&snapshot, &validated, access_mode))
}
