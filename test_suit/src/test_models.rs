use serde::{Deserialize, Serialize};
use taxis::{
    ConverterConfig, ConverterOptions, Error, ExportParams, FilterModel, FilterSet, Filters,
    ListAsString, OrderBy, OrderModel, OrderSet, Value, ValueKind,
    sql::{Dialect, Select},
};

use crate::fixtures::{seed, setup};
use crate::schema::{GROUP, ITEM, Item};

#[derive(Debug, Default, Serialize, Deserialize, FilterModel)]
#[taxis(entity = ITEM, list_as_string = "number__in:int, created_at__in:timestamp, name__in")]
struct ItemFilters {
    name: Option<String>,
    #[serde(rename = "name__in")]
    names: Option<String>,
    #[serde(rename = "number__in")]
    numbers: Option<String>,
    #[serde(rename = "created_at__in")]
    created: Option<String>,
    #[serde(rename = "group__owner__first_name")]
    owner_first_name: Option<String>,
    #[serde(rename = "group__is_active")]
    group_active: Option<bool>,
}

#[derive(Debug, Default, Serialize, FilterModel)]
#[taxis(entity = ITEM, wrap_like)]
struct WrappedLike {
    #[serde(rename = "name__like")]
    name: Option<String>,
}

#[derive(Debug, Default, Serialize, FilterModel)]
#[taxis(entity = ITEM, strict)]
struct StrictFilters {
    #[serde(rename = "group__name__between")]
    between: Option<String>,
}

#[derive(Debug, Default, Deserialize, OrderModel)]
#[taxis(entity = ITEM, list_as_string)]
struct ItemOrdering {
    order_by: Option<String>,
}

#[derive(Debug, OrderModel)]
#[taxis(entity = ITEM)]
struct ItemSort {
    #[taxis(order_by)]
    sort: Vec<String>,
}

fn ids(items: &[Item]) -> Vec<i64> {
    items.iter().map(|item| item.id).collect()
}

fn sorted_ids(items: &[Item]) -> Vec<i64> {
    let mut ids = ids(items);
    ids.sort();
    ids
}

#[tokio::test]
async fn test_filter_model_nested_eq() {
    let executor = setup().await;
    seed(executor.pool()).await;

    let filters = ItemFilters {
        owner_first_name: Some("Alice".to_string()),
        ..Default::default()
    };
    let select = filters
        .apply_filters(Select::from(&ITEM), &ExportParams::default())
        .unwrap();
    let items: Vec<Item> = executor.fetch_all(&select).await.unwrap();
    assert_eq!(sorted_ids(&items), vec![1, 4]);
}

#[tokio::test]
async fn test_filter_model_list_as_string() {
    let executor = setup().await;
    let data = seed(executor.pool()).await;

    let filters = ItemFilters {
        numbers: Some("4, 5".to_string()),
        ..Default::default()
    };
    let exported = filters.to_filters(&ExportParams::default()).unwrap();
    assert_eq!(
        exported.get("number__in"),
        Some(&Value::List(vec![Value::Int(4), Value::Int(5)]))
    );
    let select = filters
        .apply_filters(Select::from(&ITEM), &ExportParams::default())
        .unwrap();
    let items: Vec<Item> = executor.fetch_all(&select).await.unwrap();
    assert_eq!(sorted_ids(&items), vec![4, 5]);

    let filters = ItemFilters {
        names: Some("name, NAME".to_string()),
        created: Some(format!(
            "{}, {}",
            data.item_created_at[3].to_rfc3339(),
            data.item_created_at[0].format("%Y-%m-%dT%H:%M:%S")
        )),
        ..Default::default()
    };
    let select = filters
        .apply_filters(Select::from(&ITEM), &ExportParams::default())
        .unwrap();
    let items: Vec<Item> = executor.fetch_all(&select).await.unwrap();
    assert_eq!(sorted_ids(&items), vec![4]);
}

#[test]
fn test_filter_model_conversion_error() {
    let filters = ItemFilters {
        numbers: Some("4, five".to_string()),
        ..Default::default()
    };
    let err = filters.to_conditions(&ExportParams::default()).unwrap_err();
    assert!(matches!(err, Error::Conversion { ref field, .. } if field == "number__in"));
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_filter_model_from_json_payload() {
    let executor = setup().await;
    seed(executor.pool()).await;

    let filters: ItemFilters = serde_json::from_value(serde_json::json!({
        "group__is_active": true,
        "name__in": "Some Name, Other Name",
    }))
    .unwrap();
    let select = filters
        .apply_filters(Select::from(&ITEM), &ExportParams::default())
        .unwrap();
    let items: Vec<Item> = executor.fetch_all(&select).await.unwrap();
    assert_eq!(sorted_ids(&items), vec![1, 3]);

    let select = filters
        .apply_filters(Select::from(&ITEM), &ExportParams::exclude(["name__in"]))
        .unwrap();
    assert_eq!(executor.count(&select).await.unwrap(), 3);
}

#[tokio::test]
async fn test_wrap_like_option() {
    let executor = setup().await;
    seed(executor.pool()).await;

    let filters = WrappedLike {
        name: Some("ther nam".to_string()),
    };
    let conditions = filters.to_conditions(&ExportParams::default()).unwrap();
    assert_eq!(conditions[0].value, Value::String("%ther nam%".into()));

    let select = filters
        .apply_filters(Select::from(&ITEM), &ExportParams::default())
        .unwrap();
    let items: Vec<Item> = executor.fetch_all(&select).await.unwrap();
    assert_eq!(sorted_ids(&items), vec![2]);
}

#[test]
fn test_strict_model_rejects_unknown_operator() {
    let filters = StrictFilters {
        between: Some("a".to_string()),
    };
    let err = filters.to_conditions(&ExportParams::default()).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperator { ref token, .. } if token == "between"));
    assert!(err.to_string().contains("isnull"));
}

#[tokio::test]
async fn test_order_model_string_list() {
    let executor = setup().await;
    seed(executor.pool()).await;

    let ordering: ItemOrdering = serde_json::from_value(serde_json::json!({
        "order_by": "-group__name, number"
    }))
    .unwrap();
    let select = ordering.apply_order_by(Select::from(&ITEM)).unwrap();
    let items: Vec<Item> = executor.fetch_all(&select).await.unwrap();
    assert_eq!(ids(&items), vec![3, 2, 5, 1, 4]);

    let unordered = ItemOrdering::default();
    assert!(unordered.to_order_terms().unwrap().is_empty());
}

#[tokio::test]
async fn test_order_model_marked_field() {
    let executor = setup().await;
    seed(executor.pool()).await;

    let sort = ItemSort {
        sort: vec!["-number".to_string()],
    };
    assert_eq!(sort.order_by(), Some(OrderBy::Many(vec!["-number".into()])));
    let select = sort.apply_order_by(Select::from(&ITEM)).unwrap();
    let items: Vec<Item> = executor.fetch_all(&select).await.unwrap();
    assert_eq!(ids(&items), vec![5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn test_runtime_sets_share_joins() {
    let executor = setup().await;
    seed(executor.pool()).await;

    let config = ConverterConfig::new(&GROUP).with_options(ConverterOptions {
        list_as_string: Some(ListAsString::new(["items__number__in"]).expect(
            "items__number__in",
            ValueKind::Int,
        )),
        ..Default::default()
    });
    let filters = FilterSet::new(
        config.clone(),
        Filters::new().with("items__number__in", "1, 4"),
    )
    .unwrap();
    let ordering = OrderSet::new(config, "-items__number").unwrap();

    let select = filters.apply(Select::from(&GROUP)).unwrap();
    let select = ordering.apply(select).unwrap();
    assert_eq!(select.joins().len(), 1);

    let (sql, params) = select.to_sql(Dialect::Sqlite);
    assert!(sql.contains(r#"JOIN "item" ON "group"."id" = "item"."group_id""#));
    assert_eq!(params, vec![Value::Int(1), Value::Int(4)]);

    let groups: Vec<crate::schema::Group> = executor.fetch_all(&select).await.unwrap();
    let names: Vec<&str> = groups.iter().filter_map(|g| g.name.as_deref()).collect();
    assert_eq!(names, vec!["first", "first"]);
}

#[test]
fn test_missing_entity_is_reported_first() {
    let err = FilterSet::new(
        ConverterConfig::default(),
        Filters::new().with("not__a__field", 1),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "ConverterConfig param 'entity' can't be None");
}
