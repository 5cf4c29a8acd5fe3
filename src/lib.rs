//! Declarative filtering and ordering over related entities.
//!
//! A field spec such as `group__owner__first_name__in` names a path through
//! entity relations, a terminal column and an optional operator. The
//! builders turn maps of such specs into column-bound conditions and order
//! terms, and the [`JoinPlanner`] adds every join they need to a host query
//! exactly once.
//!
//! ```rust,ignore
//! use taxis::{ExportParams, FilterModel, OrderModel};
//! use taxis::sql::{Dialect, Select};
//!
//! #[derive(Serialize, FilterModel)]
//! #[taxis(entity = schema::ITEM, list_as_string = "number__in:int")]
//! struct ItemFilters {
//!     #[serde(rename = "group__owner__first_name")]
//!     owner: Option<String>,
//!     #[serde(rename = "number__in")]
//!     numbers: Option<String>,
//! }
//!
//! let query = filters.apply_filters(Select::from(&schema::ITEM), &ExportParams::default())?;
//! let (sql, params) = query.to_sql(Dialect::Sqlite);
//! ```

pub mod config;
pub mod error;
pub mod expr;
pub mod filter;
pub mod join;
pub mod model;
pub mod operator;
pub mod order;
pub mod path;
pub mod schema;
pub mod sql;
pub mod value;

pub use crate::config::{ConverterConfig, ConverterOptions, ExportParams, ListAsString};
pub use crate::error::Error;
pub use crate::expr::{ColumnRef, Comparison, Condition, Direction, OrderTerm};
pub use crate::filter::{FilterBuilder, Filters};
pub use crate::join::{JoinClause, JoinPlanner, JoinProbe, JoinStep, QueryTarget, Resolved};
pub use crate::model::{FilterModel, FilterSet, IntoOrderBy, OrderModel, OrderSet};
pub use crate::operator::Operator;
pub use crate::order::{OrderBuilder, OrderBy};
pub use crate::schema::{Entity, EntityMeta, EntityRef, Hop, Relation};
pub use crate::value::{ToValue, Value, ValueKind};

#[cfg(feature = "derive")]
pub use taxis_derive::*;

/// Conditions for `filters` against `entity`, joins discarded.
pub fn conditions(filters: &Filters, entity: EntityRef) -> Result<Vec<Condition>, Error> {
    let resolved = FilterBuilder::new(entity).build(filters)?;
    Ok(Resolved::split(resolved).1)
}

/// Joins what `filters` need and attaches their conditions to `query`.
pub fn apply_filters<Q: QueryTarget>(
    query: Q,
    filters: &Filters,
    entity: EntityRef,
) -> Result<Q, Error> {
    let resolved = FilterBuilder::new(entity).build(filters)?;
    JoinPlanner::new(entity).filter(query, resolved)
}

pub fn order_terms(order_by: impl Into<OrderBy>, entity: EntityRef) -> Result<Vec<OrderTerm>, Error> {
    let resolved = OrderBuilder::new(entity).build(&order_by.into())?;
    Ok(Resolved::split(resolved).1)
}

pub fn apply_order_by<Q: QueryTarget>(
    query: Q,
    order_by: impl Into<OrderBy>,
    entity: EntityRef,
) -> Result<Q, Error> {
    let resolved = OrderBuilder::new(entity).build(&order_by.into())?;
    JoinPlanner::new(entity).order(query, resolved)
}
