//! Entity metadata: the relationship graph field paths are walked against.
//!
//! Entities are declared once as `static` items and referenced by
//! `&'static EntityMeta` everywhere else:
//!
//! ```rust
//! use taxis::schema::{EntityMeta, Relation};
//!
//! pub static OWNER: EntityMeta = EntityMeta {
//!     name: "Owner",
//!     table: "owner",
//!     primary_key: "id",
//!     columns: &["id", "first_name", "last_name", "email"],
//!     relations: &[],
//! };
//!
//! pub static GROUP: EntityMeta = EntityMeta {
//!     name: "Group",
//!     table: "group",
//!     primary_key: "id",
//!     columns: &["id", "name", "is_active", "owner_id"],
//!     relations: &[Relation {
//!         name: "owner",
//!         target: &OWNER,
//!         local_key: "owner_id",
//!         remote_key: "id",
//!     }],
//! };
//!
//! assert!(GROUP.relation("owner").is_some());
//! assert!(GROUP.column("name").is_some());
//! ```

use crate::expr::ColumnRef;

pub type EntityRef = &'static EntityMeta;

#[derive(Debug)]
pub struct EntityMeta {
    /// Entity name, used in logs and errors.
    pub name: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    /// Every addressable column, foreign keys included.
    pub columns: &'static [&'static str],
    pub relations: &'static [Relation],
}

/// A named association to another entity.
///
/// Joining over it emits `<from>.<local_key> = <target>.<remote_key>`.
pub struct Relation {
    pub name: &'static str,
    pub target: EntityRef,
    pub local_key: &'static str,
    pub remote_key: &'static str,
}

impl EntityMeta {
    pub fn relation(&self, name: &str) -> Option<&'static Relation> {
        let relations: &'static [Relation] = self.relations;
        relations.iter().find(|relation| relation.name == name)
    }

    pub fn column(&'static self, name: &str) -> Option<ColumnRef> {
        self.columns
            .iter()
            .find(|column| **column == name)
            .map(|column| ColumnRef {
                entity: self,
                name: *column,
            })
    }

    /// Relations from `self` whose target is `other`, in declaration order.
    pub fn relations_to(
        &'static self,
        other: EntityRef,
    ) -> impl Iterator<Item = &'static Relation> {
        self.relations
            .iter()
            .filter(move |relation| relation.target == other)
    }
}

/// One walked relation: `relation` declared on `from`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hop {
    pub from: EntityRef,
    pub relation: &'static Relation,
}

impl Hop {
    pub fn target(&self) -> EntityRef {
        self.relation.target
    }
}

// Relations may be cyclic, so only the target's name is printed.
impl std::fmt::Debug for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("target", &self.target.name)
            .field("local_key", &self.local_key)
            .field("remote_key", &self.remote_key)
            .finish()
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.local_key == other.local_key
            && self.remote_key == other.remote_key
            && self.target == other.target
    }
}

impl PartialEq for EntityMeta {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.table == other.table
    }
}

impl Eq for EntityMeta {}

/// Binds a row type to its metadata.
pub trait Entity {
    const META: EntityRef;
}
