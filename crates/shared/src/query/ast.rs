//! The query DSL's AST (spec §4.5): a typed structure, not free text.
//! This is the contract between the tool façade and the executor.

use serde::{Deserialize, Serialize};

use crate::models::EntityType;

/// The 15 filter operators (spec §4.5 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
    HasTag,
    HasAnyTag,
}

/// A filter value, or a bare field/relationship reference on the right
/// of the comparison. Untagged so callers write plain JSON (`42`,
/// `"Acme Corp"`, `["a", "b"]`, `null`) without a wrapper tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Literal>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: String,
    pub operator: Op,
    #[serde(default)]
    pub value: Literal,
}

impl Default for Literal {
    fn default() -> Self {
        Literal::Null
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    CountDistinct,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregation {
    pub function: AggFunction,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub group_by: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    Asc,
    Desc,
}

fn default_limit() -> u32 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub entity_type: EntityType,
    #[serde(default)]
    pub filters: Vec<FilterClause>,
    #[serde(default)]
    pub aggregation: Option<Aggregation>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub order_by: Vec<(String, OrderDirection)>,
}

pub const MAX_LIMIT: u32 = 1000;
