use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::SqlitePool;
use taxis::sql::SqliteExecutor;

use crate::schema::SCHEMA;

pub async fn setup() -> SqliteExecutor {
    let executor = SqliteExecutor::new_memory().await.unwrap();
    create_schema(executor.pool()).await;
    executor
}

pub async fn create_schema(pool: &SqlitePool) {
    for statement in SCHEMA {
        if let Err(err) = sqlx::query(statement).execute(pool).await {
            panic!("Error: {:#?}", err);
        }
    }
}

/// Every row gets a distinct `created_at`, one minute apart, in insertion order.
pub struct Seeder<'a> {
    pool: &'a SqlitePool,
    rows: i64,
}

impl<'a> Seeder<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool, rows: 0 }
    }

    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn next_timestamp(&mut self) -> DateTime<Utc> {
        self.rows += 1;
        Self::epoch() + Duration::minutes(self.rows)
    }

    pub async fn owner(&mut self, first_name: &str, last_name: &str, email: Option<&str>) -> i64 {
        let created_at = self.next_timestamp();
        sqlx::query(
            "INSERT INTO owner (first_name, last_name, email, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(created_at)
        .execute(self.pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    pub async fn group(&mut self, name: &str, is_active: bool, owner_id: Option<i64>) -> i64 {
        let created_at = self.next_timestamp();
        sqlx::query(
            r#"INSERT INTO "group" (name, is_active, owner_id, created_at) VALUES (?, ?, ?, ?)"#,
        )
        .bind(name)
        .bind(is_active)
        .bind(owner_id)
        .bind(created_at)
        .execute(self.pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    pub async fn item(
        &mut self,
        name: &str,
        number: i64,
        is_valid: bool,
        group_id: Option<i64>,
    ) -> (i64, DateTime<Utc>) {
        let created_at = self.next_timestamp();
        let id = sqlx::query(
            "INSERT INTO item (name, number, is_valid, group_id, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(number)
        .bind(is_valid)
        .bind(group_id)
        .bind(created_at)
        .execute(self.pool)
        .await
        .unwrap()
        .last_insert_rowid();
        (id, created_at)
    }

    pub async fn message(&mut self, body: &str, sender_id: i64, recipient_id: i64) -> i64 {
        sqlx::query("INSERT INTO message (body, sender_id, recipient_id) VALUES (?, ?, ?)")
            .bind(body)
            .bind(sender_id)
            .bind(recipient_id)
            .execute(self.pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }
}

/// Ids and timestamps of the standard data set.
pub struct Dataset {
    pub owners: Vec<i64>,
    pub groups: Vec<i64>,
    pub items: Vec<i64>,
    pub item_created_at: Vec<DateTime<Utc>>,
}

/// Owners Alice Smith, Bob Jones (no email) and Carol Smith; groups
/// `first` (Alice), `second` (Bob), `third` (Carol) and `orphan` (no owner);
/// items numbered 1..5 with mixed-case names.
pub async fn seed(pool: &SqlitePool) -> Dataset {
    let mut seeder = Seeder::new(pool);

    let alice = seeder.owner("Alice", "Smith", Some("alice@example.com")).await;
    let bob = seeder.owner("Bob", "Jones", None).await;
    let carol = seeder.owner("Carol", "Smith", Some("carol@example.com")).await;

    let first = seeder.group("first", true, Some(alice)).await;
    let second = seeder.group("second", false, Some(bob)).await;
    let third = seeder.group("third", true, Some(carol)).await;
    let orphan = seeder.group("orphan", false, None).await;

    let mut items = Vec::new();
    let mut item_created_at = Vec::new();
    for (name, number, is_valid, group) in [
        ("Some Name", 1, true, first),
        ("other name", 2, true, second),
        ("Other Name", 3, false, third),
        ("name", 4, true, first),
        ("NAME", 5, false, orphan),
    ] {
        let (id, created_at) = seeder.item(name, number, is_valid, Some(group)).await;
        items.push(id);
        item_created_at.push(created_at);
    }

    Dataset {
        owners: vec![alice, bob, carol],
        groups: vec![first, second, third, orphan],
        items,
        item_created_at,
    }
}
