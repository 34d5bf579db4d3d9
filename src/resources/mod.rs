//! Static descriptors for every table the API exposes.
//!
//! A [`Resource`] ties a table allow-list to its request schemas, its
//! ownership path and the routes the generic CRUD handlers mount for it.

pub mod accounts;
pub mod clients;
pub mod equipment;
pub mod logistics;
pub mod staff;
pub mod workshops;

use crate::scope::ownership::missing_rows;
use crate::scope::{Ownership, Reference, ScopeError, ScopingGuard};
use crate::statement::{OrderBy, Record, TableSpec};
use crate::validation::{FieldRule, Schema, ID};

/// Who may write to a resource once the tenant check passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAccess {
    AnyMember,
    /// Only roles that manage somebody (not `user`).
    Manager,
}

/// Which generic write routes are mounted. Resources with custom handlers
/// switch the corresponding flag off.
#[derive(Debug, Clone, Copy)]
pub struct Ops {
    pub add: bool,
    pub update: bool,
    pub delete: bool,
}

impl Ops {
    pub const ALL: Ops = Ops {
        add: true,
        update: true,
        delete: true,
    };
}

/// A GET listing. `parent` names the column matched against the `:ID` path
/// segment; `filter` is a fixed condition without parameters.
#[derive(Debug)]
pub struct ListRoute {
    pub path: &'static str,
    pub parent: Option<&'static str>,
    pub columns: &'static [&'static str],
    pub filter: Option<&'static str>,
    pub order: Option<OrderBy>,
    pub message: &'static str,
}

impl ListRoute {
    pub const fn all(path: &'static str, message: &'static str) -> Self {
        Self {
            path,
            parent: None,
            columns: &[],
            filter: None,
            order: None,
            message,
        }
    }

    pub const fn by_parent(path: &'static str, column: &'static str, message: &'static str) -> Self {
        Self {
            parent: Some(column),
            ..Self::all(path, message)
        }
    }
}

#[derive(Debug)]
pub struct Resource {
    /// Human name used in messages, e.g. "Accommodation".
    pub label: &'static str,
    /// Route suffix: `/add{entity}`, `/update{entity}`, `/delete{entity}`.
    pub entity: &'static str,
    pub table: &'static TableSpec,
    pub ownership: Ownership,
    /// Foreign columns the client may set, each checked against the tenant.
    pub references: &'static [Reference],
    pub create: &'static Schema,
    pub update: &'static Schema,
    pub access: WriteAccess,
    pub ops: Ops,
    pub lists: &'static [ListRoute],
    /// Message for a foreign-key violation on delete.
    pub in_use: &'static str,
}

impl Resource {
    /// Label for the 404 of a guarded insert that wrote nothing: the parent
    /// or any supplied reference may be the missing row.
    pub fn missing_parent(&self, fields: &Record) -> String {
        missing_rows(self.ownership.parent_label(), self.references, fields, self.label)
    }

    pub fn authorize_write(&self, guard: &ScopingGuard<'_>) -> Result<(), ScopeError> {
        match self.access {
            WriteAccess::AnyMember => Ok(()),
            WriteAccess::Manager => guard.require_manager(),
        }
    }
}

/// `{ID}` body of every generic delete.
pub static DELETE_BY_ID: Schema = Schema {
    fields: &[FieldRule::required("ID", ID)],
    checks: &[],
};

/// Every resource served by the generic handlers.
pub fn all() -> [&'static Resource; 17] {
    [
        &clients::CLIENT,
        &clients::DEPARTMENT,
        &clients::EVENT,
        &clients::EVENT_TYPE,
        &clients::PAUSE,
        &staff::STAFF,
        &staff::TEAM,
        &workshops::WORKSHOP,
        &workshops::QA,
        &workshops::INSTRUCTOR,
        &logistics::TRANSPORT,
        &logistics::CAR,
        &logistics::ACCOMMODATION,
        &logistics::SOIREE,
        &logistics::PRESTATAIRE,
        &equipment::CATEGORY,
        &equipment::SUB_CATEGORY,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn route_paths_are_unique() {
        let mut seen = HashSet::new();
        for resource in all() {
            let writes = [
                (resource.ops.add, format!("/add{}", resource.entity)),
                (resource.ops.update, format!("/update{}", resource.entity)),
                (resource.ops.delete, format!("/delete{}", resource.entity)),
            ];
            for (mounted, path) in writes {
                if mounted {
                    assert!(seen.insert(path.clone()), "duplicate route {}", path);
                }
            }
            for list in resource.lists {
                assert!(seen.insert(list.path.to_string()), "duplicate route {}", list.path);
            }
        }
    }

    #[test]
    fn schemas_only_name_known_columns() {
        for resource in all() {
            for schema in [resource.create, resource.update] {
                for rule in schema.fields {
                    // Fields consumed by handlers rather than written directly.
                    if matches!(rule.name, "staff_id" | "team") {
                        continue;
                    }
                    assert!(
                        resource.table.column(rule.name).is_ok(),
                        "{} has no column {}",
                        resource.table.name,
                        rule.name
                    );
                }
            }
        }
    }

    #[test]
    fn ownership_columns_are_not_updatable() {
        for resource in all() {
            assert!(
                resource.update.field(resource.ownership.column()).is_none(),
                "{} allows updating {}",
                resource.label,
                resource.ownership.column()
            );
            assert_eq!(resource.update.field("ID").map(|rule| rule.required), Some(true));
        }
    }

    #[test]
    fn references_name_writable_columns() {
        for resource in all() {
            for reference in resource.references {
                assert!(resource.table.column(reference.column).is_ok(), "{} {}", resource.label, reference.column);
                assert!(resource.create.field(reference.column).is_some(), "{} {}", resource.label, reference.column);
                assert_ne!(reference.column, resource.ownership.column());
            }
        }
    }

    #[test]
    fn missing_parent_lists_supplied_references() {
        let fields = Record::new().with("evenement_id", 1).with("car_id", 2);
        assert_eq!(logistics::TRANSPORT.missing_parent(&fields), "Event or Car not found");
        assert_eq!(clients::CLIENT.missing_parent(&Record::new()), "Client not found");
    }

    #[test]
    fn list_columns_and_parents_are_allow_listed() {
        for resource in all() {
            assert!(!resource.lists.is_empty(), "{} has no listing", resource.label);
            for list in resource.lists {
                for column in list.columns.iter().chain(list.parent.iter()) {
                    assert!(resource.table.column(column).is_ok(), "{} {}", list.path, column);
                }
                if list.parent.is_some() {
                    assert!(list.path.ends_with("/:ID"), "{}", list.path);
                }
            }
        }
    }
}
