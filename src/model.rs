//! Declarative adapters: types that export their own state as filters or
//! ordering and hand it to the builders.
//!
//! Implement [`FilterModel`] / [`OrderModel`] with the derive macros, or use
//! [`FilterSet`] / [`OrderSet`] when the configuration is only known at
//! runtime.

use serde::Serialize;

use crate::config::{ConverterConfig, ConverterOptions, ExportParams, ListAsString};
use crate::error::Error;
use crate::expr::{Condition, OrderTerm};
use crate::filter::{FilterBuilder, Filters};
use crate::join::{JoinPlanner, QueryTarget, Resolved};
use crate::order::{OrderBuilder, OrderBy};
use crate::schema::EntityRef;
use crate::value::Value;

pub trait FilterModel: Serialize {
    fn converter_config() -> ConverterConfig;

    /// Exported non-null fields, after list-as-string coercion.
    fn to_filters(&self, params: &ExportParams) -> Result<Filters, Error> {
        let config = Self::converter_config();
        config.entity()?;
        export_filters(self, params, &config.options)
    }

    fn to_resolved(&self, params: &ExportParams) -> Result<Vec<Resolved<Condition>>, Error> {
        let config = Self::converter_config();
        let entity = config.entity()?;
        let filters = export_filters(self, params, &config.options)?;
        FilterBuilder::new(entity)
            .with_options(config.options)
            .build(&filters)
    }

    fn to_conditions(&self, params: &ExportParams) -> Result<Vec<Condition>, Error> {
        Ok(Resolved::split(self.to_resolved(params)?).1)
    }

    fn apply_filters<Q: QueryTarget>(&self, query: Q, params: &ExportParams) -> Result<Q, Error> {
        let entity = Self::converter_config().entity()?;
        JoinPlanner::new(entity).filter(query, self.to_resolved(params)?)
    }
}

pub trait OrderModel {
    fn converter_config() -> ConverterConfig;

    fn order_by(&self) -> Option<OrderBy>;

    fn to_resolved(&self) -> Result<Vec<Resolved<OrderTerm>>, Error> {
        let config = Self::converter_config();
        let entity = config.entity()?;
        match self.order_by() {
            Some(order_by) => OrderBuilder::new(entity).build(&split_order_by(order_by, &config.options)),
            None => Ok(Vec::new()),
        }
    }

    fn to_order_terms(&self) -> Result<Vec<OrderTerm>, Error> {
        Ok(Resolved::split(self.to_resolved()?).1)
    }

    fn apply_order_by<Q: QueryTarget>(&self, query: Q) -> Result<Q, Error> {
        let entity = Self::converter_config().entity()?;
        JoinPlanner::new(entity).order(query, self.to_resolved()?)
    }
}

/// Conversion of an order field's declared type into [`OrderBy`].
pub trait IntoOrderBy {
    fn into_order_by(&self) -> Option<OrderBy>;
}

impl IntoOrderBy for OrderBy {
    fn into_order_by(&self) -> Option<OrderBy> {
        Some(self.clone())
    }
}

impl IntoOrderBy for String {
    fn into_order_by(&self) -> Option<OrderBy> {
        Some(OrderBy::One(self.clone()))
    }
}

impl IntoOrderBy for &str {
    fn into_order_by(&self) -> Option<OrderBy> {
        Some(OrderBy::One(self.to_string()))
    }
}

impl IntoOrderBy for Vec<String> {
    fn into_order_by(&self) -> Option<OrderBy> {
        Some(OrderBy::Many(self.clone()))
    }
}

impl<T: IntoOrderBy> IntoOrderBy for Option<T> {
    fn into_order_by(&self) -> Option<OrderBy> {
        self.as_ref().and_then(IntoOrderBy::into_order_by)
    }
}

/// Filters bound to an entity chosen at runtime.
#[derive(Debug, Clone)]
pub struct FilterSet {
    entity: EntityRef,
    options: ConverterOptions,
    filters: Filters,
}

impl FilterSet {
    /// Fails before touching any field when no entity is bound.
    pub fn new(config: ConverterConfig, filters: Filters) -> Result<Self, Error> {
        let entity = config.entity()?;
        let mut filters = filters;
        if let Some(list) = &config.options.list_as_string {
            split_list_fields(&mut filters, list)?;
        }
        Ok(Self {
            entity,
            options: config.options,
            filters,
        })
    }

    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn to_resolved(&self) -> Result<Vec<Resolved<Condition>>, Error> {
        FilterBuilder::new(self.entity)
            .with_options(self.options.clone())
            .build(&self.filters)
    }

    pub fn to_conditions(&self) -> Result<Vec<Condition>, Error> {
        Ok(Resolved::split(self.to_resolved()?).1)
    }

    pub fn apply<Q: QueryTarget>(&self, query: Q) -> Result<Q, Error> {
        JoinPlanner::new(self.entity).filter(query, self.to_resolved()?)
    }
}

/// Ordering bound to an entity chosen at runtime.
#[derive(Debug, Clone)]
pub struct OrderSet {
    entity: EntityRef,
    order_by: OrderBy,
}

impl OrderSet {
    pub fn new(config: ConverterConfig, order_by: impl Into<OrderBy>) -> Result<Self, Error> {
        let entity = config.entity()?;
        Ok(Self {
            entity,
            order_by: split_order_by(order_by.into(), &config.options),
        })
    }

    pub fn order_by(&self) -> &OrderBy {
        &self.order_by
    }

    pub fn to_resolved(&self) -> Result<Vec<Resolved<OrderTerm>>, Error> {
        OrderBuilder::new(self.entity).build(&self.order_by)
    }

    pub fn to_order_terms(&self) -> Result<Vec<OrderTerm>, Error> {
        Ok(Resolved::split(self.to_resolved()?).1)
    }

    pub fn apply<Q: QueryTarget>(&self, query: Q) -> Result<Q, Error> {
        JoinPlanner::new(self.entity).order(query, self.to_resolved()?)
    }
}

/// Serializes `model` to a map of non-null fields allowed by `params`.
pub fn export_filters<M: Serialize + ?Sized>(
    model: &M,
    params: &ExportParams,
    options: &ConverterOptions,
) -> Result<Filters, Error> {
    let exported = serde_json::to_value(model).map_err(|e| Error::Serialize(e.to_string()))?;
    let serde_json::Value::Object(map) = exported else {
        return Err(Error::Serialize(
            "filter model must serialize to a map".to_string(),
        ));
    };

    let mut filters = Filters::new();
    for (field, value) in map {
        if value.is_null() || !params.allows(&field) {
            continue;
        }
        filters.insert(field, Value::from(value));
    }

    if let Some(list) = &options.list_as_string {
        split_list_fields(&mut filters, list)?;
    }
    Ok(filters)
}

/// Replaces `"a, b"` string values of the configured fields with typed lists.
pub fn split_list_fields(filters: &mut Filters, list: &ListAsString) -> Result<(), Error> {
    for (field, value) in filters.iter_mut() {
        if !list.applies_to(field) {
            continue;
        }
        let Value::String(raw) = value else {
            continue;
        };
        let kind = list.kind_of(field);
        let items = raw
            .split(',')
            .map(|item| kind.parse(item.trim()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| Error::Conversion {
                field: field.to_string(),
                source,
            })?;
        *value = Value::List(items);
    }
    Ok(())
}

fn split_order_by(order_by: OrderBy, options: &ConverterOptions) -> OrderBy {
    if options.list_as_string.is_some() {
        order_by.split_list()
    } else {
        order_by
    }
}
