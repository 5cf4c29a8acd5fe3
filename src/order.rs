use std::time::Instant;

use metrics::histogram;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::expr::OrderTerm;
use crate::join::Resolved;
use crate::path::{FieldSpec, resolve, resolve_local};
use crate::schema::EntityRef;

/// One order spec or a list of them; `-` prefix for descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderBy {
    One(String),
    Many(Vec<String>),
}

impl OrderBy {
    pub fn specs(&self) -> Vec<&str> {
        match self {
            OrderBy::One(spec) => vec![spec.as_str()],
            OrderBy::Many(specs) => specs.iter().map(String::as_str).collect(),
        }
    }

    /// Splits a comma separated string into a list, trimming every entry.
    pub fn split_list(self) -> Self {
        match self {
            OrderBy::One(spec) => {
                OrderBy::Many(spec.split(',').map(|s| s.trim().to_string()).collect())
            }
            many => many,
        }
    }
}

impl From<&str> for OrderBy {
    fn from(spec: &str) -> Self {
        OrderBy::One(spec.to_string())
    }
}

impl From<String> for OrderBy {
    fn from(spec: String) -> Self {
        OrderBy::One(spec)
    }
}

impl<S: ToString> From<Vec<S>> for OrderBy {
    fn from(specs: Vec<S>) -> Self {
        OrderBy::Many(specs.iter().map(ToString::to_string).collect())
    }
}

impl<S: ToString, const N: usize> From<[S; N]> for OrderBy {
    fn from(specs: [S; N]) -> Self {
        OrderBy::Many(specs.iter().map(ToString::to_string).collect())
    }
}

/// Turns order specs into ascending/descending terms on concrete columns.
#[derive(Debug, Clone, Copy)]
pub struct OrderBuilder {
    base: EntityRef,
}

impl OrderBuilder {
    pub fn new(base: EntityRef) -> Self {
        Self { base }
    }

    pub fn build(&self, order_by: &OrderBy) -> Result<Vec<Resolved<OrderTerm>>, Error> {
        let start = Instant::now();
        let resolved = order_by
            .specs()
            .into_iter()
            .map(|spec| self.build_field(spec))
            .collect::<Result<Vec<_>, _>>()?;
        histogram!("taxis.build.duration_us", "kind" => "order")
            .record(start.elapsed().as_micros() as f64);
        Ok(resolved)
    }

    pub fn build_field(&self, field: &str) -> Result<Resolved<OrderTerm>, Error> {
        let spec = FieldSpec::order(field);

        let (hops, column) = if spec.is_local() {
            let column = resolve_local(self.base, spec.segments[0]).ok_or_else(|| {
                Error::UnknownColumn {
                    entity: self.base.name,
                    column: spec.segments[0].to_string(),
                }
            })?;
            (Vec::new(), column)
        } else {
            let resolution = resolve(self.base, &spec.segments);
            let column = resolution.column.ok_or_else(|| Error::UnresolvedPath {
                entity: self.base.name,
                field: field.to_string(),
            })?;
            (resolution.hops, column)
        };

        let term = if spec.descending {
            column.desc()
        } else {
            column.asc()
        };
        debug!(
            entity = self.base.name,
            field,
            descending = spec.descending,
            joins = hops.len(),
            "resolved ordering"
        );
        Ok(Resolved::via(self.base, hops, term))
    }
}
