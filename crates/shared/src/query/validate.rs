//! Validates a [`Query`] against the relationship graph in
//! [`super::schema`], producing a plan the executor can run without
//! re-checking field/operator/path legality (spec §4.5 "Validation
//! failures").

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::CoreError;
use crate::timezone::{
    WeekBoundary, resolve_time_shortcut, start_of_month_bounds_utc, start_of_week_bounds_utc,
    start_of_year_bounds_utc, user_local_date,
};

use super::ast::{AggFunction, Aggregation, Literal, Op, Query, OrderDirection, MAX_LIMIT};
use super::schema::{FieldType, Relationship, SchemaNode, field_type, relationship};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid field: {0}")]
    InvalidField(String),
    #[error("operator {op:?} is not valid for field {field}")]
    InvalidOperator { field: String, op: Op },
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("invalid value for field {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("invalid aggregation: {0}")]
    InvalidAggregation(String),
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        CoreError::InvalidArgument(err.to_string())
    }
}

/// A field reached by walking zero or more relationship hops from the
/// query's root entity.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    pub original: String,
    pub joins: Vec<Relationship>,
    pub leaf_node: SchemaNode,
    pub leaf_field: &'static str,
    pub leaf_type: FieldType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    List(Vec<ResolvedValue>),
}

pub struct ShortcutContext {
    pub now: DateTime<Utc>,
    pub time_zone: String,
    pub week_boundary: WeekBoundary,
}

impl ShortcutContext {
    fn resolve_date(&self, token: &str) -> Option<NaiveDate> {
        let bounds_start = match token {
            "today" => return Some(user_local_date(self.now, &self.time_zone)),
            "this_week" => start_of_week_bounds_utc(self.now, &self.time_zone, self.week_boundary),
            "this_month" => start_of_month_bounds_utc(self.now, &self.time_zone),
            "this_year" => start_of_year_bounds_utc(self.now, &self.time_zone),
            _ => None,
        }?;
        Some(user_local_date(bounds_start.0, &self.time_zone))
    }

    fn resolve_datetime(&self, token: &str) -> Option<DateTime<Utc>> {
        resolve_time_shortcut(token, self.now, &self.time_zone, self.week_boundary)
    }
}

/// Walks `path` from `root`, validating every intermediate segment is
/// a relationship and the terminal segment is a field, or a
/// relationship normalized to its FK id column (spec §4.5 "field name
/// normalization").
pub fn resolve_path(root: SchemaNode, path: &str) -> Result<ResolvedPath, ValidationError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ValidationError::InvalidPath(path.to_string()));
    }

    let mut current = root;
    let mut joins = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        let is_last = index == segments.len() - 1;

        if !is_last {
            let rel = relationship(current, segment)
                .ok_or_else(|| ValidationError::InvalidPath(path.to_string()))?;
            joins.push(rel);
            current = rel.target;
            continue;
        }

        if let Some(leaf_type) = field_type(current, segment) {
            return Ok(ResolvedPath {
                original: path.to_string(),
                joins,
                leaf_node: current,
                leaf_field: intern(current, segment),
                leaf_type,
            });
        }

        if let Some(rel) = relationship(current, segment) {
            let id_field = rel.id_field.ok_or_else(|| {
                ValidationError::InvalidPath(format!(
                    "{path}: relationship {} has no scalar id to compare",
                    rel.name
                ))
            })?;
            return Ok(ResolvedPath {
                original: path.to_string(),
                joins,
                leaf_node: current,
                leaf_field: id_field,
                leaf_type: FieldType::Int,
            });
        }

        return Err(ValidationError::InvalidField(path.to_string()));
    }

    unreachable!("split('.') on a non-empty string always yields at least one segment")
}

/// Recovers the `&'static str` for a known-good field name so
/// `ResolvedPath` doesn't need an owned string per leaf.
fn intern(node: SchemaNode, name: &str) -> &'static str {
    super::schema::schema_for(node)
        .fields
        .iter()
        .find(|(field_name, _)| *field_name == name)
        .map(|(field_name, _)| *field_name)
        .expect("caller already confirmed the field exists")
}

fn operator_allowed(field_type: FieldType, op: Op) -> bool {
    use FieldType::*;
    use Op::*;
    match field_type {
        Tags => matches!(op, HasTag | HasAnyTag),
        Bool => matches!(op, Eq | Ne | IsNull | IsNotNull),
        String | Enum => matches!(
            op,
            Eq | Ne | In | NotIn | Contains | StartsWith | EndsWith | IsNull | IsNotNull
        ),
        Int | Decimal | Date | DateTime => matches!(
            op,
            Eq | Ne | Gt | Gte | Lt | Lte | In | NotIn | IsNull | IsNotNull
        ),
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedFilter {
    pub path: ResolvedPath,
    pub operator: Op,
    pub value: ResolvedValue,
}

#[derive(Debug, Clone)]
pub struct ValidatedAggregation {
    pub function: AggFunction,
    pub field: Option<ResolvedPath>,
    pub group_by: Vec<ResolvedPath>,
}

#[derive(Debug, Clone)]
pub struct ValidatedOrder {
    pub path: ResolvedPath,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone)]
pub struct ValidatedQuery {
    pub entity_type: crate::models::EntityType,
    pub filters: Vec<ValidatedFilter>,
    pub aggregation: Option<ValidatedAggregation>,
    pub limit: u32,
    pub offset: u32,
    pub order_by: Vec<ValidatedOrder>,
}

pub fn validate(
    query: &Query,
    ctx: &ShortcutContext,
) -> Result<ValidatedQuery, ValidationError> {
    if query.limit > MAX_LIMIT {
        return Err(ValidationError::InvalidValue {
            field: "limit".to_string(),
            reason: format!("limit {} exceeds max {MAX_LIMIT}", query.limit),
        });
    }

    let root = SchemaNode::Entity(query.entity_type);

    let filters = query
        .filters
        .iter()
        .map(|clause| {
            let path = resolve_path(root, &clause.field)?;
            if !operator_allowed(path.leaf_type, clause.operator) {
                return Err(ValidationError::InvalidOperator {
                    field: clause.field.clone(),
                    op: clause.operator,
                });
            }
            let value = resolve_filter_value(path.leaf_type, clause.operator, &clause.value, ctx)
                .map_err(|reason| ValidationError::InvalidValue {
                    field: clause.field.clone(),
                    reason,
                })?;
            Ok(ValidatedFilter {
                path,
                operator: clause.operator,
                value,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let aggregation = query
        .aggregation
        .as_ref()
        .map(|agg| validate_aggregation(root, agg))
        .transpose()?;

    let order_by = query
        .order_by
        .iter()
        .map(|(field, direction)| {
            Ok(ValidatedOrder {
                path: resolve_path(root, field)?,
                direction: *direction,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    Ok(ValidatedQuery {
        entity_type: query.entity_type,
        filters,
        aggregation,
        limit: query.limit,
        offset: query.offset,
        order_by,
    })
}

fn validate_aggregation(
    root: SchemaNode,
    agg: &Aggregation,
) -> Result<ValidatedAggregation, ValidationError> {
    let field = agg
        .field
        .as_ref()
        .map(|path| resolve_path(root, path))
        .transpose()?;

    match agg.function {
        AggFunction::Count => {}
        AggFunction::Sum | AggFunction::Avg => match &field {
            Some(path) if matches!(path.leaf_type, FieldType::Int | FieldType::Decimal) => {}
            Some(_) => {
                return Err(ValidationError::InvalidAggregation(format!(
                    "{:?} requires a numeric field",
                    agg.function
                )));
            }
            None => {
                return Err(ValidationError::InvalidAggregation(format!(
                    "{:?} requires a field",
                    agg.function
                )));
            }
        },
        AggFunction::Min | AggFunction::Max | AggFunction::CountDistinct => match &field {
            Some(path) if !matches!(path.leaf_type, FieldType::Tags) => {}
            Some(_) => {
                return Err(ValidationError::InvalidAggregation(format!(
                    "{:?} does not support a tag-set field",
                    agg.function
                )));
            }
            None => {
                return Err(ValidationError::InvalidAggregation(format!(
                    "{:?} requires a field",
                    agg.function
                )));
            }
        },
    }

    let group_by = agg
        .group_by
        .iter()
        .map(|path| resolve_path(root, path))
        .collect::<Result<Vec<_>, ValidationError>>()?;

    Ok(ValidatedAggregation {
        function: agg.function,
        field,
        group_by,
    })
}

fn resolve_filter_value(
    field_type: FieldType,
    op: Op,
    literal: &Literal,
    ctx: &ShortcutContext,
) -> Result<ResolvedValue, String> {
    match op {
        Op::IsNull | Op::IsNotNull => match literal {
            Literal::Null => Ok(ResolvedValue::Null),
            _ => Err("is_null/is_not_null require a null value".to_string()),
        },
        Op::In | Op::NotIn | Op::HasAnyTag => match literal {
            Literal::List(items) => {
                let scalar_type = if field_type == FieldType::Tags {
                    FieldType::String
                } else {
                    field_type
                };
                let resolved = items
                    .iter()
                    .map(|item| resolve_scalar(scalar_type, item, ctx))
                    .collect::<Result<Vec<_>, String>>()?;
                Ok(ResolvedValue::List(resolved))
            }
            _ => Err(format!("{op:?} requires a list value")),
        },
        Op::HasTag => match literal {
            Literal::String(s) => Ok(ResolvedValue::String(s.clone())),
            _ => Err("has_tag requires a string value".to_string()),
        },
        _ => resolve_scalar(field_type, literal, ctx),
    }
}

fn resolve_scalar(
    field_type: FieldType,
    literal: &Literal,
    ctx: &ShortcutContext,
) -> Result<ResolvedValue, String> {
    match field_type {
        FieldType::Bool => match literal {
            Literal::Bool(b) => Ok(ResolvedValue::Bool(*b)),
            _ => Err("expected a boolean".to_string()),
        },
        FieldType::Int => match literal {
            Literal::Int(i) => Ok(ResolvedValue::Int(*i)),
            Literal::String(s) => s
                .parse::<i64>()
                .map(ResolvedValue::Int)
                .map_err(|_| format!("not an integer: {s}")),
            _ => Err("expected an integer".to_string()),
        },
        FieldType::Decimal => match literal {
            Literal::Int(i) => Ok(ResolvedValue::Decimal(Decimal::from(*i))),
            Literal::Float(f) => Decimal::try_from(*f)
                .map(ResolvedValue::Decimal)
                .map_err(|_| format!("not a decimal: {f}")),
            Literal::String(s) => s
                .parse::<Decimal>()
                .map(ResolvedValue::Decimal)
                .map_err(|_| format!("not a decimal: {s}")),
            _ => Err("expected a decimal".to_string()),
        },
        FieldType::String | FieldType::Enum => match literal {
            Literal::String(s) => Ok(ResolvedValue::String(s.clone())),
            _ => Err("expected a string".to_string()),
        },
        FieldType::Date => match literal {
            Literal::String(s) => {
                if let Some(date) = ctx.resolve_date(s) {
                    Ok(ResolvedValue::Date(date))
                } else {
                    s.parse::<NaiveDate>()
                        .map(ResolvedValue::Date)
                        .map_err(|_| format!("not a date: {s}"))
                }
            }
            _ => Err("expected a date string".to_string()),
        },
        FieldType::DateTime => match literal {
            Literal::String(s) => {
                if let Some(instant) = ctx.resolve_datetime(s) {
                    Ok(ResolvedValue::DateTime(instant))
                } else {
                    DateTime::parse_from_rfc3339(s)
                        .map(|dt| ResolvedValue::DateTime(dt.with_timezone(&Utc)))
                        .map_err(|_| format!("not an ISO-8601 datetime: {s}"))
                }
            }
            _ => Err("expected a datetime string".to_string()),
        },
        FieldType::Tags => Err("tags are not comparable with this operator".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityType;

    #[test]
    fn resolves_single_hop_relationship_path() {
        let resolved =
            resolve_path(SchemaNode::Entity(EntityType::WorkSession), "project.name").unwrap();
        assert_eq!(resolved.joins.len(), 1);
        assert_eq!(resolved.leaf_field, "name");
    }

    #[test]
    fn resolves_two_hop_relationship_path() {
        let resolved = resolve_path(
            SchemaNode::Entity(EntityType::WorkSession),
            "project.client.name",
        )
        .unwrap();
        assert_eq!(resolved.joins.len(), 2);
        assert_eq!(resolved.leaf_field, "name");
    }

    #[test]
    fn resolves_many_valued_join_table_hop() {
        let resolved = resolve_path(
            SchemaNode::Entity(EntityType::Meeting),
            "attendees.person.email",
        )
        .unwrap();
        assert_eq!(resolved.joins.len(), 2);
        assert_eq!(resolved.leaf_field, "email");
    }

    #[test]
    fn normalizes_relationship_name_to_fk_id_column() {
        let resolved =
            resolve_path(SchemaNode::Entity(EntityType::Project), "on_behalf_of").unwrap();
        assert_eq!(resolved.leaf_field, "on_behalf_of_id");
        assert_eq!(resolved.leaf_type, FieldType::Int);
    }

    #[test]
    fn rejects_unknown_intermediate_segment() {
        assert!(
            resolve_path(SchemaNode::Entity(EntityType::WorkSession), "bogus.name").is_err()
        );
    }

    #[test]
    fn rejects_unknown_leaf_field() {
        assert!(
            resolve_path(SchemaNode::Entity(EntityType::WorkSession), "project.bogus").is_err()
        );
    }

    #[test]
    fn operator_compatibility_rejects_ordering_on_tags() {
        assert!(!operator_allowed(FieldType::Tags, Op::Gt));
        assert!(operator_allowed(FieldType::Tags, Op::HasTag));
    }
}
