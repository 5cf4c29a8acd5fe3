use std::time::Instant;

use metrics::histogram;
use tracing::debug;

use crate::config::ConverterOptions;
use crate::error::Error;
use crate::expr::{ColumnRef, Condition};
use crate::join::Resolved;
use crate::operator::Operator;
use crate::path::{FieldSpec, resolve, resolve_local};
use crate::schema::EntityRef;
use crate::value::{ToValue, Value};

/// Ordered `field spec -> value` pairs. Re-inserting a key replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters(Vec<(String, Value)>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl ToValue) {
        let field = field.into();
        let value = value.to_value();
        match self.0.iter_mut().find(|(key, _)| *key == field) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((field, value)),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl ToValue) -> Self {
        self.insert(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.0.iter_mut().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: ToValue> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Filters::new();
        for (field, value) in iter {
            filters.insert(field, value);
        }
        filters
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Filters {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Filters(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
    }
}

impl IntoIterator for Filters {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Turns filter field specs into conditions bound to concrete columns,
/// each paired with the entities that must be joined for it.
#[derive(Debug, Clone)]
pub struct FilterBuilder {
    base: EntityRef,
    options: ConverterOptions,
}

impl FilterBuilder {
    pub fn new(base: EntityRef) -> Self {
        Self {
            base,
            options: ConverterOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConverterOptions) -> Self {
        self.options = options;
        self
    }

    /// Any field failing to resolve aborts the whole build.
    pub fn build(&self, filters: &Filters) -> Result<Vec<Resolved<Condition>>, Error> {
        let start = Instant::now();
        let resolved = filters
            .iter()
            .map(|(field, value)| self.build_field(field, value.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        histogram!("taxis.build.duration_us", "kind" => "filter")
            .record(start.elapsed().as_micros() as f64);
        Ok(resolved)
    }

    pub fn build_field(&self, field: &str, value: Value) -> Result<Resolved<Condition>, Error> {
        let spec = FieldSpec::filter(field);
        let operator = spec.operator.unwrap_or_default();

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
            match resolution.column {
                Some(column) => (resolution.hops, column),
                None => return Err(self.unresolved(&spec)),
            }
        };

        let condition = operator.apply(field, column, value, self.options.wrap_like)?;
        debug!(
            entity = self.base.name,
            field,
            operator = operator.token(),
            joins = hops.len(),
            "resolved filter"
        );
        Ok(Resolved::via(self.base, hops, condition))
    }

    fn unresolved(&self, spec: &FieldSpec<'_>) -> Error {
        if self.options.strict_operators {
            if let Some(token) = spec.unmatched_trailing() {
                let prefix = &spec.segments[..spec.segments.len() - 1];
                if self.resolves(prefix) {
                    return Error::UnsupportedOperator {
                        token: token.to_string(),
                        supported: Operator::TOKENS,
                    };
                }
            }
        }
        Error::UnresolvedPath {
            entity: self.base.name,
            field: spec.raw.to_string(),
        }
    }

    fn resolves(&self, segments: &[&str]) -> bool {
        let column: Option<ColumnRef> = match segments {
            [field] => resolve_local(self.base, field),
            _ => resolve(self.base, segments).column,
        };
        column.is_some()
    }
}
