use crate::expr::ColumnRef;
use crate::operator::Operator;
use crate::schema::{EntityRef, Hop};

/// Separates relation hops, the terminal field and the operator token.
pub const DELIM: &str = "__";

/// A parsed field key.
///
/// `[-]segment{__segment}[__operator]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec<'a> {
    pub raw: &'a str,
    pub descending: bool,
    pub segments: Vec<&'a str>,
    pub operator: Option<Operator>,
}

impl<'a> FieldSpec<'a> {
    /// Filter key: the trailing segment is popped when it is an operator token.
    pub fn filter(raw: &'a str) -> Self {
        if !raw.contains(DELIM) {
            return Self {
                raw,
                descending: false,
                segments: vec![raw],
                operator: None,
            };
        }

        let mut segments: Vec<&str> = raw.split(DELIM).collect();
        let operator = segments.last().and_then(|last| Operator::from_token(last));
        if operator.is_some() {
            segments.pop();
        }

        Self {
            raw,
            descending: false,
            segments,
            operator,
        }
    }

    /// Order key: only the leading `-` is special.
    pub fn order(raw: &'a str) -> Self {
        let (descending, rest) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        Self {
            raw,
            descending,
            segments: rest.split(DELIM).collect(),
            operator: None,
        }
    }

    pub fn is_local(&self) -> bool {
        self.segments.len() == 1
    }

    /// Last segment of a multi-segment spec that was not taken as an operator.
    pub fn unmatched_trailing(&self) -> Option<&'a str> {
        match (self.operator, self.segments.as_slice()) {
            (None, [_, .., last]) => Some(*last),
            _ => None,
        }
    }
}

/// Result of walking a field path.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Entities traversed, outer to inner. Never contains the base.
    pub joins: Vec<EntityRef>,
    /// The relation walked to reach each entity in `joins`.
    pub hops: Vec<Hop>,
    pub column: Option<ColumnRef>,
}

/// Walks `segments` from `base`: each segment naming a relation is a hop,
/// the first one that does not is looked up as a column on the current
/// entity.
///
/// A column followed by further segments does not resolve.
pub fn resolve(base: EntityRef, segments: &[&str]) -> Resolution {
    let mut current = base;
    let mut joins = Vec::new();
    let mut hops = Vec::new();

    for (position, segment) in segments.iter().enumerate() {
        if let Some(relation) = current.relation(segment) {
            joins.push(relation.target);
            hops.push(Hop {
                from: current,
                relation,
            });
            current = relation.target;
            continue;
        }

        let column = if position + 1 == segments.len() {
            current.column(segment)
        } else {
            None
        };
        return Resolution {
            joins,
            hops,
            column,
        };
    }

    Resolution {
        joins,
        hops,
        column: None,
    }
}

/// Single-segment lookup directly on the base entity.
pub fn resolve_local(base: EntityRef, field: &str) -> Option<ColumnRef> {
    base.column(field)
}
