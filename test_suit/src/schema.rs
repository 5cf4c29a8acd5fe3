use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use taxis::{Entity, EntityMeta, EntityRef, Relation};

pub static OWNER: EntityMeta = EntityMeta {
    name: "Owner",
    table: "owner",
    primary_key: "id",
    columns: &["id", "first_name", "last_name", "email", "created_at"],
    relations: &[],
};

pub static GROUP: EntityMeta = EntityMeta {
    name: "Group",
    table: "group",
    primary_key: "id",
    columns: &["id", "name", "is_active", "owner_id", "created_at"],
    relations: &[
        Relation {
            name: "owner",
            target: &OWNER,
            local_key: "owner_id",
            remote_key: "id",
        },
        Relation {
            name: "items",
            target: &ITEM,
            local_key: "id",
            remote_key: "group_id",
        },
    ],
};

pub static ITEM: EntityMeta = EntityMeta {
    name: "Item",
    table: "item",
    primary_key: "id",
    columns: &["id", "name", "number", "is_valid", "group_id", "created_at"],
    relations: &[Relation {
        name: "group",
        target: &GROUP,
        local_key: "group_id",
        remote_key: "id",
    }],
};

pub static MESSAGE: EntityMeta = EntityMeta {
    name: "Message",
    table: "message",
    primary_key: "id",
    columns: &["id", "body", "sender_id", "recipient_id"],
    relations: &[
        Relation {
            name: "sender",
            target: &OWNER,
            local_key: "sender_id",
            remote_key: "id",
        },
        Relation {
            name: "recipient",
            target: &OWNER,
            local_key: "recipient_id",
            remote_key: "id",
        },
    ],
};

pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS owner (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "group" (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        is_active BOOLEAN NOT NULL DEFAULT 0,
        owner_id INTEGER REFERENCES owner (id),
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS item (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        number INTEGER,
        is_valid BOOLEAN NOT NULL DEFAULT 0,
        group_id INTEGER REFERENCES "group" (id),
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS message (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        body TEXT NOT NULL,
        sender_id INTEGER NOT NULL REFERENCES owner (id),
        recipient_id INTEGER NOT NULL REFERENCES owner (id)
    )
    "#,
];

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Owner {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Owner {
    const META: EntityRef = &OWNER;
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: Option<String>,
    pub is_active: bool,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Group {
    const META: EntityRef = &GROUP;
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: Option<String>,
    pub number: Option<i64>,
    pub is_valid: bool,
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Item {
    const META: EntityRef = &ITEM;
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub body: String,
    pub sender_id: i64,
    pub recipient_id: i64,
}

impl Entity for Message {
    const META: EntityRef = &MESSAGE;
}
