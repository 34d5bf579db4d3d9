use serde_json::Value;

use super::error::ScopeError;
use super::ownership::{Ownership, Reference};
use super::role::Role;
use super::Identity;
use crate::statement::{Record, ScopePredicate, ScopeSpec};

/// Single place where tenant boundaries and the role hierarchy are applied.
pub struct ScopingGuard<'a> {
    identity: &'a Identity,
    role: Role,
}

impl<'a> ScopingGuard<'a> {
    pub fn new(identity: &'a Identity) -> Self {
        Self {
            identity,
            role: Role::parse(&identity.role),
        }
    }

    pub fn caller_id(&self) -> i64 {
        self.identity.id
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn manageable_roles(&self) -> &'static [&'static str] {
        self.role.manageable()
    }

    pub fn tenant(&self, ownership: Ownership) -> ScopePredicate {
        ownership.predicate(self.identity.id)
    }

    /// `"ID"=? AND <tenant>` style scope for a single row.
    pub fn row_scope(&self, key: ScopePredicate, ownership: Ownership) -> ScopeSpec {
        ScopeSpec::new().and(key).and(self.tenant(ownership))
    }

    /// Guard for an `INSERT ... SELECT`: the parent (for child rows) and every
    /// reference present in `fields` must be tenant rows.
    pub fn insert_scope(&self, ownership: Ownership, references: &[Reference], fields: &Record) -> ScopeSpec {
        let mut scope = ownership.insert_guard(self.identity.id);
        for reference in references.iter().filter(|r| fields.contains(r.column)) {
            scope.push(reference.insert_guard(self.identity.id));
        }
        scope
    }

    /// [`row_scope`](Self::row_scope) plus a tenant check on every reference
    /// the update sets.
    pub fn update_scope(
        &self,
        key: ScopePredicate,
        ownership: Ownership,
        references: &[Reference],
        fields: &Record,
    ) -> ScopeSpec {
        let mut scope = self.row_scope(key, ownership);
        for reference in references {
            if let Some(value) = fields.get(reference.column) {
                scope.push(reference.update_guard(self.identity.id, value));
            }
        }
        scope
    }

    /// Writes to staff, teams, equipment and accounts need a role that
    /// manages somebody.
    pub fn require_manager(&self) -> Result<(), ScopeError> {
        if self.manageable_roles().is_empty() {
            return Err(ScopeError::InsufficientPrivilege(format!(
                "Role '{}' is not allowed to perform this operation",
                self.role
            )));
        }
        Ok(())
    }

    /// Entreprise-level writes belong to the tenant owner alone.
    pub fn require_super_admin(&self) -> Result<(), ScopeError> {
        if self.role != Role::SuperAdmin {
            return Err(ScopeError::InsufficientPrivilege(format!(
                "Role '{}' is not allowed to manage the entreprise",
                self.role
            )));
        }
        Ok(())
    }

    /// Callers may always act on themselves; otherwise the target's role has
    /// to be below theirs.
    pub fn authorize_target(&self, target_id: i64, target_role: &str) -> Result<(), ScopeError> {
        if target_id == self.identity.id || self.role.can_manage(target_role) {
            return Ok(());
        }
        Err(ScopeError::InsufficientPrivilege(format!(
            "Role '{}' cannot act on accounts with role '{}'",
            self.role, target_role
        )))
    }

    /// Assigning `new_role` is allowed when it is unchanged or manageable.
    pub fn authorize_role_grant(&self, new_role: &str, current_role: Option<&str>) -> Result<(), ScopeError> {
        if current_role == Some(new_role) || self.role.can_manage(new_role) {
            return Ok(());
        }
        Err(ScopeError::InsufficientPrivilege(format!(
            "Role '{}' cannot assign role '{}'",
            self.role, new_role
        )))
    }

    /// Accounts the caller can see or modify: itself plus manageable roles.
    pub fn account_visibility(&self) -> ScopePredicate {
        let roles: Vec<Value> = self.manageable_roles().iter().map(|r| Value::from(*r)).collect();
        ScopePredicate::new(
            "(\"ID\" = ? OR role = ANY(?))",
            vec![Value::from(self.identity.id), Value::Array(roles)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity(id: i64, role: &str) -> Identity {
        Identity { id, role: role.to_string() }
    }

    #[test]
    fn admin_cannot_modify_other_admin() {
        let caller = identity(1, "admin");
        let guard = ScopingGuard::new(&caller);
        assert!(matches!(
            guard.authorize_target(2, "admin"),
            Err(ScopeError::InsufficientPrivilege(_))
        ));
        assert!(guard.authorize_target(2, "super_user").is_ok());
        assert!(guard.authorize_target(2, "user").is_ok());
    }

    #[test]
    fn self_exception_applies_to_every_role() {
        for role in ["super_admin", "admin", "super_user", "user", "visitor"] {
            let caller = identity(5, role);
            assert!(ScopingGuard::new(&caller).authorize_target(5, role).is_ok());
        }
    }

    #[test]
    fn unknown_role_manages_nobody() {
        let caller = identity(3, "visitor");
        let guard = ScopingGuard::new(&caller);
        assert!(guard.require_manager().is_err());
        assert!(guard.authorize_target(4, "user").is_err());
    }

    #[test]
    fn only_super_admin_manages_the_entreprise() {
        let owner = identity(1, "super_admin");
        assert!(ScopingGuard::new(&owner).require_super_admin().is_ok());
        let admin = identity(2, "admin");
        assert!(ScopingGuard::new(&admin).require_super_admin().is_err());
    }

    #[test]
    fn role_grants_follow_hierarchy() {
        let caller = identity(1, "admin");
        let guard = ScopingGuard::new(&caller);
        assert!(guard.authorize_role_grant("super_user", None).is_ok());
        assert!(guard.authorize_role_grant("admin", None).is_err());
        assert!(guard.authorize_role_grant("admin", Some("admin")).is_ok());
        assert!(guard.authorize_role_grant("super_admin", Some("admin")).is_err());
    }

    #[test]
    fn visibility_binds_caller_and_roles() {
        let caller = identity(9, "super_user");
        let predicate = ScopingGuard::new(&caller).account_visibility();
        assert_eq!(predicate.values, vec![json!(9), json!(["user"])]);
    }

    #[test]
    fn insert_scope_guards_only_supplied_references() {
        let caller = identity(9, "admin");
        let references = [
            Reference::new("car_id", "car", Ownership::Entreprise, "Car"),
            Reference::new("agence_id", "agence", Ownership::Entreprise, "Agency"),
        ];
        let fields = Record::new().with("evenement_id", 3).with("car_id", 12);
        let scope = ScopingGuard::new(&caller).insert_scope(Ownership::Event, &references, &fields);

        let templates: Vec<_> = scope.iter().map(|p| p.template.to_string()).collect();
        assert_eq!(templates.len(), 2);
        assert!(templates[0].starts_with("evenement_id IN ("));
        assert!(templates[1].starts_with("car_id IN (SELECT \"ID\" FROM car WHERE entreprise_id = "));
    }

    #[test]
    fn update_scope_appends_reference_after_tenant() {
        let caller = identity(9, "admin");
        let references = [Reference::new("instructeur_id", "instructeur", Ownership::Entreprise, "Instructor")];
        let fields = Record::new().with("nom", "Intro").with("instructeur_id", 40);
        let scope = ScopingGuard::new(&caller).update_scope(
            ScopePredicate::new("\"ID\"=?", vec![json!(2)]),
            Ownership::Event,
            &references,
            &fields,
        );

        let predicates: Vec<_> = scope.iter().collect();
        assert_eq!(predicates.len(), 3);
        assert!(predicates[2].template.contains("FROM instructeur WHERE entreprise_id = "));
        assert_eq!(predicates[2].values, vec![json!(40), json!(9)]);
    }

    #[test]
    fn row_scope_puts_key_first() {
        let caller = identity(9, "admin");
        let scope = ScopingGuard::new(&caller)
            .row_scope(ScopePredicate::new("\"ID\"=?", vec![json!(4)]), Ownership::Entreprise);
        let templates: Vec<_> = scope.iter().map(|p| p.template.to_string()).collect();
        assert_eq!(templates[0], "\"ID\"=?");
        assert!(templates[1].starts_with("entreprise_id"));
    }
}
