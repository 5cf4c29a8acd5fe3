//! A small structured SELECT builder that the planner can drive, plus an
//! executor for SQLite.
//!
//! ```rust
//! use taxis::sql::{Dialect, Select};
//! # use taxis::schema::EntityMeta;
//! # static ITEM: EntityMeta = EntityMeta {
//! #     name: "Item", table: "item", primary_key: "id",
//! #     columns: &["id", "name"], relations: &[],
//! # };
//!
//! let select = Select::from(&ITEM).limit(10);
//! let (sql, params) = select.to_sql(Dialect::Sqlite);
//! assert_eq!(sql, r#"SELECT "item".* FROM "item" LIMIT 10"#);
//! assert!(params.is_empty());
//! ```

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExecutor;

use crate::error::Error;
use crate::expr::{ColumnRef, Comparison, Condition, Direction, OrderTerm};
use crate::join::{JoinClause, QueryTarget};
use crate::schema::{Entity, EntityRef, Hop, Relation};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct Select {
    base: EntityRef,
    joins: Vec<JoinClause>,
    conditions: Vec<Condition>,
    order: Vec<OrderTerm>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl From<EntityRef> for Select {
    fn from(base: EntityRef) -> Self {
        Select::new(base)
    }
}

impl Select {
    pub fn new(base: EntityRef) -> Self {
        Self {
            base,
            joins: Vec::new(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn of<T: Entity>() -> Self {
        Self::new(T::META)
    }

    pub fn base(&self) -> EntityRef {
        self.base
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn order(&self) -> &[OrderTerm] {
        &self.order
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Entities currently in the FROM set, base first.
    fn present(&self) -> impl Iterator<Item = EntityRef> + '_ {
        std::iter::once(self.base).chain(self.joins.iter().map(|clause| clause.entity))
    }

    /// The single forward relation from an entity already present, else the
    /// single reverse relation declared on `entity` itself.
    fn join_clause(&self, entity: EntityRef) -> Result<JoinClause, Error> {
        let forward: Vec<Hop> = self
            .present()
            .flat_map(|from| {
                from.relations_to(entity)
                    .map(move |relation| Hop { from, relation })
            })
            .collect();
        match forward.as_slice() {
            [hop] => return Ok(JoinClause::over(*hop)),
            [] => {}
            _ => return Err(ambiguous(entity, forward.iter().map(|hop| hop.relation))),
        }

        let reverse: Vec<(EntityRef, &'static Relation)> = self
            .present()
            .flat_map(|to| entity.relations_to(to).map(move |relation| (to, relation)))
            .collect();
        match reverse.as_slice() {
            [(to, relation)] => Ok(JoinClause {
                entity,
                left: ColumnRef {
                    entity: *to,
                    name: relation.remote_key,
                },
                right: ColumnRef {
                    entity,
                    name: relation.local_key,
                },
            }),
            [] => Err(Error::NoJoinPath {
                from: self.base.name,
                to: entity.name,
            }),
            _ => Err(ambiguous(entity, reverse.iter().map(|(_, relation)| *relation))),
        }
    }

    pub fn to_sql(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT {}.* FROM {}", quote(self.base.table), quote(self.base.table));
        let params = self.render_body(&mut sql, dialect, true);
        (sql, params)
    }

    /// `COUNT(*)` over the same joins and conditions; order and paging dropped.
    pub fn to_count_sql(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT COUNT(*) FROM {}", quote(self.base.table));
        let params = self.render_body(&mut sql, dialect, false);
        (sql, params)
    }

    fn render_body(&self, sql: &mut String, dialect: Dialect, paged: bool) -> Vec<Value> {
        let mut writer = ParamWriter::new(dialect);

        for clause in &self.joins {
            sql.push_str(&format!(
                " JOIN {} ON {} = {}",
                quote(clause.entity.table),
                column(&clause.left),
                column(&clause.right)
            ));
        }

        if !self.conditions.is_empty() {
            let rendered: Vec<String> = self
                .conditions
                .iter()
                .map(|condition| writer.condition(condition))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&rendered.join(" AND "));
        }

        if !paged {
            return writer.params;
        }

        if !self.order.is_empty() {
            let rendered: Vec<String> = self.order.iter().map(order_term).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&rendered.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            if self.limit.is_none() && dialect == Dialect::Sqlite {
                sql.push_str(" LIMIT -1");
            }
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        writer.params
    }
}

impl QueryTarget for Select {
    fn join(mut self, entity: EntityRef) -> Result<Self, Error> {
        let clause = self.join_clause(entity)?;
        self.joins.push(clause);
        Ok(self)
    }

    fn join_via(mut self, hop: Hop) -> Result<Self, Error> {
        if !self.present().any(|entity| entity == hop.from) {
            return Err(Error::NoJoinPath {
                from: hop.from.name,
                to: hop.target().name,
            });
        }
        self.joins.push(JoinClause::over(hop));
        Ok(self)
    }

    fn filter(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    fn order_by(mut self, terms: Vec<OrderTerm>) -> Self {
        self.order.extend(terms);
        self
    }

    fn join_clauses(&self) -> Option<&[JoinClause]> {
        Some(self.joins.as_slice())
    }
}

fn ambiguous(entity: EntityRef, relations: impl Iterator<Item = &'static Relation>) -> Error {
    Error::AmbiguousJoin {
        to: entity.name,
        relations: relations.map(|relation| relation.name).collect(),
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn column(column: &ColumnRef) -> String {
    format!("{}.{}", quote(column.entity.table), quote(column.name))
}

fn order_term(term: &OrderTerm) -> String {
    match term.direction {
        Direction::Asc => format!("{} ASC", column(&term.column)),
        Direction::Desc => format!("{} DESC", column(&term.column)),
    }
}

/// Collects bound parameters and hands out placeholders for them.
struct ParamWriter {
    dialect: Dialect,
    params: Vec<Value>,
}

impl ParamWriter {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    fn push(&mut self, value: Value) -> String {
        self.params.push(value);
        match self.dialect {
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${}", self.params.len()),
        }
    }

    fn condition(&mut self, condition: &Condition) -> String {
        use Comparison::*;

        let lhs = column(&condition.column);
        let value = &condition.value;

        match condition.comparison {
            Equal | Is if value.is_null() => format!("{} IS NULL", lhs),
            NotEqual | IsNot if value.is_null() => format!("{} IS NOT NULL", lhs),
            In | NotIn => self.membership(lhs, condition.comparison == NotIn, value),
            Is => match self.dialect {
                Dialect::Sqlite => format!("{} IS {}", lhs, self.push(value.clone())),
                Dialect::Postgres => {
                    format!("{} IS NOT DISTINCT FROM {}", lhs, self.push(value.clone()))
                }
            },
            IsNot => match self.dialect {
                Dialect::Sqlite => format!("{} IS NOT {}", lhs, self.push(value.clone())),
                Dialect::Postgres => {
                    format!("{} IS DISTINCT FROM {}", lhs, self.push(value.clone()))
                }
            },
            ILike => match self.dialect {
                Dialect::Sqlite => {
                    format!("LOWER({}) LIKE LOWER({})", lhs, self.push(value.clone()))
                }
                Dialect::Postgres => format!("{} ILIKE {}", lhs, self.push(value.clone())),
            },
            comparison => {
                let op = match comparison {
                    Equal => "=",
                    NotEqual => "!=",
                    GreaterThan => ">",
                    LessThan => "<",
                    GreaterThanOrEqual => ">=",
                    LessThanOrEqual => "<=",
                    _ => "LIKE",
                };
                format!("{} {} {}", lhs, op, self.push(value.clone()))
            }
        }
    }

    fn membership(&mut self, lhs: String, negated: bool, value: &Value) -> String {
        let items = match value {
            Value::List(items) => items.as_slice(),
            other => std::slice::from_ref(other),
        };
        if items.is_empty() {
            return if negated { "1 = 1" } else { "1 = 0" }.to_string();
        }
        let placeholders: Vec<String> = items.iter().map(|item| self.push(item.clone())).collect();
        let keyword = if negated { "NOT IN" } else { "IN" };
        format!("{} {} ({})", lhs, keyword, placeholders.join(", "))
    }
}
