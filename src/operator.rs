use crate::error::Error;
use crate::expr::{ColumnRef, Comparison, Condition};
use crate::value::Value;

/// Trailing operator token of a filter field spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    #[default]
    Eq,
    In,
    NotIn,
    Gt,
    Lt,
    Gte,
    Lte,
    Not,
    Is,
    IsNot,
    Like,
    ILike,
    IsNull,
}

impl Operator {
    pub const ALL: &'static [Operator] = &[
        Operator::Eq,
        Operator::In,
        Operator::NotIn,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
        Operator::Not,
        Operator::Is,
        Operator::IsNot,
        Operator::Like,
        Operator::ILike,
        Operator::IsNull,
    ];

    pub const TOKENS: &'static [&'static str] = &[
        "eq", "in", "not_in", "gt", "lt", "gte", "lte", "not", "is", "is_not", "like", "ilike",
        "isnull",
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token {
            "eq" => Operator::Eq,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "gt" => Operator::Gt,
            "lt" => Operator::Lt,
            "gte" => Operator::Gte,
            "lte" => Operator::Lte,
            "not" => Operator::Not,
            "is" => Operator::Is,
            "is_not" => Operator::IsNot,
            "like" => Operator::Like,
            "ilike" => Operator::ILike,
            "isnull" => Operator::IsNull,
            _ => return None,
        };
        Some(op)
    }

    pub fn token(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::Not => "not",
            Operator::Is => "is",
            Operator::IsNot => "is_not",
            Operator::Like => "like",
            Operator::ILike => "ilike",
            Operator::IsNull => "isnull",
        }
    }

    /// `isnull` is not a comparison: it becomes `is` (truthy) or `is_not`
    /// (falsy) against null. Other operators pass through.
    pub fn normalize(self, value: Value) -> (Operator, Value) {
        match self {
            Operator::IsNull if value.is_truthy() => (Operator::Is, Value::Null),
            Operator::IsNull => (Operator::IsNot, Value::Null),
            op => (op, value),
        }
    }

    pub fn comparison(&self) -> Comparison {
        match self {
            Operator::Eq => Comparison::Equal,
            Operator::In => Comparison::In,
            Operator::NotIn => Comparison::NotIn,
            Operator::Gt => Comparison::GreaterThan,
            Operator::Lt => Comparison::LessThan,
            Operator::Gte => Comparison::GreaterThanOrEqual,
            Operator::Lte => Comparison::LessThanOrEqual,
            Operator::Not => Comparison::NotEqual,
            Operator::Is | Operator::IsNull => Comparison::Is,
            Operator::IsNot => Comparison::IsNot,
            Operator::Like => Comparison::Like,
            Operator::ILike => Comparison::ILike,
        }
    }

    /// Builds the condition for `column`, applying the operator's value transform.
    pub fn apply(
        self,
        field: &str,
        column: ColumnRef,
        value: Value,
        wrap_like: bool,
    ) -> Result<Condition, Error> {
        let (op, value) = self.normalize(value);
        let value = match (op, value) {
            (Operator::In | Operator::NotIn, value @ Value::List(_)) => value,
            (Operator::In | Operator::NotIn, _) => {
                return Err(Error::ExpectedList {
                    field: field.to_string(),
                });
            }
            (Operator::Like | Operator::ILike, Value::String(pattern)) if wrap_like => {
                Value::String(format!("%{}%", pattern))
            }
            (_, value) => value,
        };
        Ok(Condition {
            column,
            comparison: op.comparison(),
            value,
        })
    }
}
