use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::schema::EntityRef;
use crate::value::ValueKind;

/// Per-call converter configuration: the bound base entity plus options.
#[derive(Debug, Clone, Default)]
pub struct ConverterConfig {
    pub entity: Option<EntityRef>,
    pub options: ConverterOptions,
}

impl ConverterConfig {
    pub fn new(entity: EntityRef) -> Self {
        Self {
            entity: Some(entity),
            options: ConverterOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConverterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn entity(&self) -> Result<EntityRef, Error> {
        self.entity.ok_or(Error::MissingEntity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterOptions {
    /// Wrap `like` / `ilike` patterns in `%...%`.
    pub wrap_like: bool,
    /// Reject a trailing segment that is neither an operator nor resolvable.
    pub strict_operators: bool,
    pub list_as_string: Option<ListAsString>,
}

/// Fields exported as `"a, b, c"` and split into lists before building.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListAsString {
    pub fields: Vec<String>,
    /// Element type per field; `str` when absent.
    pub expected_types: BTreeMap<String, ValueKind>,
}

impl ListAsString {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            expected_types: BTreeMap::new(),
        }
    }

    pub fn expect(mut self, field: impl Into<String>, kind: ValueKind) -> Self {
        self.expected_types.insert(field.into(), kind);
        self
    }

    pub fn applies_to(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn kind_of(&self, field: &str) -> ValueKind {
        self.expected_types.get(field).copied().unwrap_or_default()
    }
}

/// Field selection applied when a model exports its values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportParams {
    pub include: Option<BTreeSet<String>>,
    pub exclude: BTreeSet<String>,
}

impl ExportParams {
    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: None,
            exclude: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            include: Some(fields.into_iter().map(Into::into).collect()),
            exclude: BTreeSet::new(),
        }
    }

    pub fn allows(&self, field: &str) -> bool {
        if self.exclude.contains(field) {
            return false;
        }
        match &self.include {
            Some(include) => include.contains(field),
            None => true,
        }
    }
}
