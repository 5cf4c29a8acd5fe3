use crate::schema::EntityRef;
use crate::value::{ToValue, Value};

/// A column bound to the entity it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnRef {
    pub entity: EntityRef,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    In,
    NotIn,
    Is,
    IsNot,
    Like,
    ILike,
}

/// Boolean expression: `column <comparison> value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: ColumnRef,
    pub comparison: Comparison,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTerm {
    pub column: ColumnRef,
    pub direction: Direction,
}

impl ColumnRef {
    pub fn compare(self, comparison: Comparison, value: impl ToValue) -> Condition {
        Condition {
            column: self,
            comparison,
            value: value.to_value(),
        }
    }

    pub fn eq(self, value: impl ToValue) -> Condition {
        self.compare(Comparison::Equal, value)
    }

    pub fn ne(self, value: impl ToValue) -> Condition {
        self.compare(Comparison::NotEqual, value)
    }

    pub fn gt(self, value: impl ToValue) -> Condition {
        self.compare(Comparison::GreaterThan, value)
    }

    pub fn lt(self, value: impl ToValue) -> Condition {
        self.compare(Comparison::LessThan, value)
    }

    pub fn ge(self, value: impl ToValue) -> Condition {
        self.compare(Comparison::GreaterThanOrEqual, value)
    }

    pub fn le(self, value: impl ToValue) -> Condition {
        self.compare(Comparison::LessThanOrEqual, value)
    }

    pub fn in_(self, values: impl ToValue) -> Condition {
        self.compare(Comparison::In, values)
    }

    pub fn not_in(self, values: impl ToValue) -> Condition {
        self.compare(Comparison::NotIn, values)
    }

    pub fn is(self, value: impl ToValue) -> Condition {
        self.compare(Comparison::Is, value)
    }

    pub fn is_not(self, value: impl ToValue) -> Condition {
        self.compare(Comparison::IsNot, value)
    }

    pub fn like(self, pattern: impl ToValue) -> Condition {
        self.compare(Comparison::Like, pattern)
    }

    pub fn ilike(self, pattern: impl ToValue) -> Condition {
        self.compare(Comparison::ILike, pattern)
    }

    pub fn asc(self) -> OrderTerm {
        OrderTerm {
            column: self,
            direction: Direction::Asc,
        }
    }

    pub fn desc(self) -> OrderTerm {
        OrderTerm {
            column: self,
            direction: Direction::Desc,
        }
    }
}
