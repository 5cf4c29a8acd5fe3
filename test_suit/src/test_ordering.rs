use taxis::{
    Error, OrderBy, apply_order_by,
    sql::{Select, SqliteExecutor},
};

use crate::fixtures::{seed, setup};
use crate::schema::{GROUP, Group, ITEM, Item};

async fn ordered_ids(executor: &SqliteExecutor, order_by: impl Into<OrderBy>) -> Vec<i64> {
    let select = apply_order_by(Select::of::<Item>(), order_by, &ITEM).unwrap();
    let items: Vec<Item> = executor.fetch_all(&select).await.unwrap();
    items.iter().map(|item| item.id).collect()
}

#[tokio::test]
async fn test_order_reverses_exactly() {
    let executor = setup().await;
    seed(executor.pool()).await;

    let ascending = ordered_ids(&executor, "number").await;
    let mut descending = ordered_ids(&executor, "-number").await;
    assert_eq!(ascending, vec![1, 2, 3, 4, 5]);
    descending.reverse();
    assert_eq!(ascending, descending);

    let ascending = ordered_ids(&executor, "created_at").await;
    let mut descending = ordered_ids(&executor, "-created_at").await;
    descending.reverse();
    assert_eq!(ascending, descending);
}

#[tokio::test]
async fn test_order_by_list() {
    let executor = setup().await;
    seed(executor.pool()).await;

    assert_eq!(
        ordered_ids(&executor, ["-is_valid", "number"]).await,
        vec![1, 2, 4, 3, 5]
    );
}

#[tokio::test]
async fn test_order_by_foreign_key_field() {
    let executor = setup().await;
    seed(executor.pool()).await;

    // first, orphan, second, third
    assert_eq!(
        ordered_ids(&executor, ["group__name", "id"]).await,
        vec![1, 4, 5, 2, 3]
    );
    assert_eq!(
        ordered_ids(&executor, ["-group__name", "id"]).await,
        vec![3, 2, 5, 1, 4]
    );
}

#[tokio::test]
async fn test_order_by_nested_field() {
    let executor = setup().await;
    seed(executor.pool()).await;

    // the orphan group has no owner, so its item drops out of the join
    assert_eq!(
        ordered_ids(&executor, ["-group__owner__first_name", "-id"]).await,
        vec![3, 2, 4, 1]
    );
}

#[tokio::test]
async fn test_order_groups_by_owner() {
    let executor = setup().await;
    seed(executor.pool()).await;

    let select = apply_order_by(
        Select::of::<Group>(),
        ["owner__last_name", "-owner__first_name"],
        &GROUP,
    )
    .unwrap();
    let groups: Vec<Group> = executor.fetch_all(&select).await.unwrap();
    let names: Vec<&str> = groups.iter().filter_map(|g| g.name.as_deref()).collect();
    assert_eq!(names, vec!["second", "third", "first"]);
    assert_eq!(select.joins().len(), 1);
}

#[test]
fn test_unresolvable_order_fails() {
    let err = apply_order_by(Select::from(&ITEM), "-group__rank", &ITEM).unwrap_err();
    assert!(matches!(err, Error::UnresolvedPath { .. }));
}
