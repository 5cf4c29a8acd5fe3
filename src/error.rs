use std::fmt::Display;

use crate::value::ConversionError;

#[derive(Debug)]
pub enum Error {
    /// No base entity bound to a converter configuration.
    MissingEntity,
    /// A multi-segment field path did not end on a column.
    UnresolvedPath { entity: &'static str, field: String },
    /// A single-segment field is not a column of the base entity.
    UnknownColumn { entity: &'static str, column: String },
    /// Strict mode only: the trailing segment is not an operator token.
    UnsupportedOperator {
        token: String,
        supported: &'static [&'static str],
    },
    /// `in` / `not_in` received a scalar.
    ExpectedList { field: String },
    /// List-as-string element could not be converted to its expected type.
    Conversion {
        field: String,
        source: ConversionError,
    },
    /// The host query has no relation connecting the joined entity.
    NoJoinPath { from: &'static str, to: &'static str },
    /// More than one relation could join the entity and none was named.
    AmbiguousJoin {
        to: &'static str,
        relations: Vec<&'static str>,
    },
    /// The entity is already joined on a different condition.
    ConflictingJoin {
        entity: &'static str,
        joined: String,
        requested: String,
    },
    Serialize(String),
    Storage(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingEntity => write!(f, "ConverterConfig param 'entity' can't be None"),
            Error::UnresolvedPath { entity, field } => {
                write!(f, "Cannot resolve field path '{}' from {}", field, entity)
            }
            Error::UnknownColumn { entity, column } => {
                write!(f, "{} has no column '{}'", entity, column)
            }
            Error::UnsupportedOperator { token, supported } => write!(
                f,
                "Unsupported operator '{}', expected one of: {}",
                token,
                supported.join(", ")
            ),
            Error::ExpectedList { field } => {
                write!(f, "Filter '{}' expects a list value", field)
            }
            Error::Conversion { field, source } => {
                write!(f, "Cannot convert value of '{}': {}", field, source)
            }
            Error::NoJoinPath { from, to } => {
                write!(f, "No relation to join {} from {}", to, from)
            }
            Error::AmbiguousJoin { to, relations } => write!(
                f,
                "Ambiguous join to {}: candidate relations {}",
                to,
                relations.join(", ")
            ),
            Error::ConflictingJoin {
                entity,
                joined,
                requested,
            } => write!(
                f,
                "{} is already joined on {}, cannot join it again on {}",
                entity, joined, requested
            ),
            Error::Serialize(err) => write!(f, "Serialization error: {}", err),
            Error::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Conversion { source, .. } => Some(source),
            _ => None,
        }
    }
}
