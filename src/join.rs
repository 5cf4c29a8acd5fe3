use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use metrics::counter;
use tracing::{debug, trace};

use crate::error::Error;
use crate::expr::{ColumnRef, Condition, OrderTerm};
use crate::schema::{EntityRef, Hop};

/// An expression paired with the entities a query must join for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<E> {
    /// Outer to inner. `[base]` when the field lives on the base entity.
    pub joins: Vec<EntityRef>,
    /// Relations walked to reach `joins`, aligned with it. Empty when the
    /// joins were given as bare entities or the field is local.
    pub hops: Vec<Hop>,
    pub expression: E,
}

impl<E> Resolved<E> {
    pub fn new(base: EntityRef, joins: Vec<EntityRef>, expression: E) -> Self {
        let joins = if joins.is_empty() { vec![base] } else { joins };
        Self {
            joins,
            hops: Vec::new(),
            expression,
        }
    }

    /// Joins taken from the relations a field path walked.
    pub fn via(base: EntityRef, hops: Vec<Hop>, expression: E) -> Self {
        let joins = hops.iter().map(Hop::target).collect();
        Self {
            hops,
            ..Self::new(base, joins, expression)
        }
    }

    pub fn steps(&self) -> impl Iterator<Item = JoinStep> + '_ {
        self.joins
            .iter()
            .enumerate()
            .map(|(position, entity)| JoinStep {
                entity: *entity,
                via: self.hops.get(position).copied(),
            })
    }

    /// Flattens every join list in first-seen order, duplicates included.
    pub fn split(resolved: Vec<Self>) -> (Vec<JoinStep>, Vec<E>) {
        let mut joins = Vec::new();
        let mut expressions = Vec::with_capacity(resolved.len());
        for item in resolved {
            joins.extend(item.steps());
            expressions.push(item.expression);
        }
        (joins, expressions)
    }
}

/// An entity to join, with the relation that reaches it when known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinStep {
    pub entity: EntityRef,
    pub via: Option<Hop>,
}

impl From<EntityRef> for JoinStep {
    fn from(entity: EntityRef) -> Self {
        Self { entity, via: None }
    }
}

impl From<Hop> for JoinStep {
    fn from(hop: Hop) -> Self {
        Self {
            entity: hop.target(),
            via: Some(hop),
        }
    }
}

/// A join already present on a query: `<left> = <right>`, `right` on `entity`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub entity: EntityRef,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

impl JoinClause {
    /// `<from>.<local_key> = <target>.<remote_key>`
    pub fn over(hop: Hop) -> Self {
        let target = hop.target();
        Self {
            entity: target,
            left: ColumnRef {
                entity: hop.from,
                name: hop.relation.local_key,
            },
            right: ColumnRef {
                entity: target,
                name: hop.relation.remote_key,
            },
        }
    }
}

impl Display for JoinClause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} = {}.{}",
            self.left.entity.table, self.left.name, self.right.entity.table, self.right.name
        )
    }
}

/// What the planner needs from a host query object.
///
/// Hosts track their joins differently, so introspection is split across
/// three probes. Implement whichever matches the host's internal state;
/// the others stay `None`.
pub trait QueryTarget: Sized {
    fn join(self, entity: EntityRef) -> Result<Self, Error>;

    /// Joins `hop`'s target over that exact relation. Hosts that can only
    /// join by entity keep the default.
    fn join_via(self, hop: Hop) -> Result<Self, Error> {
        self.join(hop.target())
    }

    fn filter(self, conditions: Vec<Condition>) -> Self;

    fn order_by(self, terms: Vec<OrderTerm>) -> Self;

    /// Joined entities as metadata references.
    fn joined_entities(&self) -> Option<Vec<EntityRef>> {
        None
    }

    /// Structured join clauses.
    fn join_clauses(&self) -> Option<&[JoinClause]> {
        None
    }

    /// Raw joined table names.
    fn joined_tables(&self) -> Option<Vec<String>> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinProbe {
    Entities,
    Clauses,
    Tables,
}

impl JoinProbe {
    pub const PRIORITY: [JoinProbe; 3] = [JoinProbe::Entities, JoinProbe::Clauses, JoinProbe::Tables];

    /// Joined table names as seen through this probe.
    pub fn probe<Q: QueryTarget>(&self, query: &Q) -> Option<Vec<String>> {
        match self {
            JoinProbe::Entities => query
                .joined_entities()
                .map(|entities| entities.iter().map(|e| e.table.to_string()).collect()),
            JoinProbe::Clauses => query.join_clauses().map(|clauses| {
                clauses
                    .iter()
                    .map(|clause| clause.entity.table.to_string())
                    .collect()
            }),
            JoinProbe::Tables => query.joined_tables(),
        }
    }
}

/// Tables already joined into `query`, from the first probe with a non-empty answer.
pub fn established_joins<Q: QueryTarget>(query: &Q) -> HashSet<String> {
    for probe in JoinProbe::PRIORITY {
        match probe.probe(query) {
            Some(tables) if !tables.is_empty() => {
                trace!(?probe, ?tables, "established joins");
                return tables.into_iter().collect();
            }
            _ => trace!(?probe, "probe yielded nothing"),
        }
    }
    HashSet::new()
}

/// Applies the joins required by a set of resolved expressions.
#[derive(Debug, Clone, Copy)]
pub struct JoinPlanner {
    base: EntityRef,
}

impl JoinPlanner {
    pub fn new(base: EntityRef) -> Self {
        Self { base }
    }

    /// Joins each entity at most once, in first-seen order, never the base
    /// and never one the query already has.
    ///
    /// An entity reached over a relation is joined on that relation. Reaching
    /// an already joined entity over a different one is an error.
    pub fn apply<Q, I>(&self, query: Q, joins: I) -> Result<Q, Error>
    where
        Q: QueryTarget,
        I: IntoIterator,
        I::Item: Into<JoinStep>,
    {
        let mut query = query;
        let mut established = established_joins(&query);
        let mut clauses: HashMap<&'static str, JoinClause> = query
            .join_clauses()
            .map(|clauses| {
                clauses
                    .iter()
                    .map(|clause| (clause.entity.table, clause.clone()))
                    .collect()
            })
            .unwrap_or_default();

        for step in joins.into_iter().map(Into::into) {
            let JoinStep { entity, via } = step;
            if entity == self.base {
                continue;
            }
            if established.contains(entity.table) {
                if let (Some(hop), Some(joined)) = (via, clauses.get(entity.table)) {
                    let requested = JoinClause::over(hop);
                    if *joined != requested {
                        return Err(Error::ConflictingJoin {
                            entity: entity.name,
                            joined: joined.to_string(),
                            requested: requested.to_string(),
                        });
                    }
                }
                debug!(entity = entity.name, "join already established");
                continue;
            }
            query = match via {
                Some(hop) => query.join_via(hop)?,
                None => query.join(entity)?,
            };
            let clause = match via {
                Some(hop) => Some(JoinClause::over(hop)),
                None => query
                    .join_clauses()
                    .and_then(|joined| joined.iter().find(|clause| clause.entity == entity))
                    .cloned(),
            };
            if let Some(clause) = clause {
                clauses.insert(entity.table, clause);
            }
            established.insert(entity.table.to_string());
            counter!("taxis.joins.applied", "entity" => entity.name).increment(1);
            debug!(base = self.base.name, entity = entity.name, "joined");
        }

        Ok(query)
    }

    pub fn filter<Q: QueryTarget>(
        &self,
        query: Q,
        resolved: Vec<Resolved<Condition>>,
    ) -> Result<Q, Error> {
        let (joins, conditions) = Resolved::split(resolved);
        let query = self.apply(query, joins)?;
        Ok(query.filter(conditions))
    }

    pub fn order<Q: QueryTarget>(
        &self,
        query: Q,
        resolved: Vec<Resolved<OrderTerm>>,
    ) -> Result<Q, Error> {
        let (joins, terms) = Resolved::split(resolved);
        let query = self.apply(query, joins)?;
        Ok(query.order_by(terms))
    }
}
