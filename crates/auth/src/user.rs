//! User data contract.
//!
//! Users are owned by the credential store; this module only describes their
//! shape and the validation rules that apply before anything is persisted.

use serde::{Deserialize, Serialize};

use slicehouse_core::{DomainError, DomainResult, FranchiseId, UserId, validate};

use crate::{Role, RoleAssignment};

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A registered user with its current role assignments.
///
/// # Invariants
/// - `email` is unique across the store.
/// - `roles` is never empty; a fresh registration holds exactly `Diner`.
/// - `password_digest` never leaves the process (it is not serialized).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_digest: String,
    pub roles: Vec<RoleAssignment>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r.role == role)
    }

    pub fn is_system_admin(&self) -> bool {
        self.roles.iter().any(RoleAssignment::is_system_admin)
    }

    pub fn administers(&self, franchise_id: FranchiseId) -> bool {
        self.roles.iter().any(|r| r.administers(franchise_id))
    }

    /// Franchise ids this user is an admin of (from loaded assignments).
    pub fn administered_franchises(&self) -> Vec<FranchiseId> {
        self.roles
            .iter()
            .filter(|r| r.role == Role::FranchiseAdmin)
            .filter_map(|r| r.object_id)
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inputs
// ─────────────────────────────────────────────────────────────────────────────

/// A user about to be inserted (id is assigned by the store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub roles: Vec<RoleAssignment>,
}

/// Partial profile update. Only supplied fields change.
///
/// `password` is plaintext here; the session manager hashes it before the
/// patch reaches the store (see [`UserPatch::with_digest`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }

    /// Reject an empty patch or any supplied-but-blank field.
    pub fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Err(DomainError::validation("no fields to update"));
        }
        validate::not_blank("name", self.name.as_deref())?;
        validate::not_blank("email", self.email.as_deref())?;
        validate::not_blank("password", self.password.as_deref())?;
        if let Some(email) = &self.email {
            validate::email(email.trim())?;
        }
        Ok(())
    }

    /// Replace the plaintext password with its digest.
    pub fn with_digest(mut self, digest: Option<String>) -> Self {
        self.password = digest;
        self
    }

    pub(crate) fn normalized(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self.email = self.email.map(|e| normalize_email(&e));
        self
    }
}

/// Canonical form used for uniqueness checks and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: Vec<RoleAssignment>) -> User {
        User {
            id: UserId::new(1),
            name: "pizza diner".to_string(),
            email: "d@jwt.com".to_string(),
            password_digest: "secret-digest".to_string(),
            roles,
        }
    }

    #[test]
    fn digest_is_never_serialized() {
        let json = serde_json::to_value(user(vec![RoleAssignment::diner()])).unwrap();
        assert!(json.get("password_digest").is_none());
        assert_eq!(json["roles"][0]["role"], "diner");
    }

    #[test]
    fn administered_franchises_reads_scoped_assignments() {
        let u = user(vec![
            RoleAssignment::diner(),
            RoleAssignment::franchise_admin(FranchiseId::new(2)),
            RoleAssignment::franchise_admin(FranchiseId::new(9)),
        ]);
        assert_eq!(u.administered_franchises(), vec![FranchiseId::new(2), FranchiseId::new(9)]);
        assert!(u.administers(FranchiseId::new(9)));
        assert!(!u.is_system_admin());
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(UserPatch::default().validate().is_err());

        let blank = UserPatch { email: Some("  ".into()), ..Default::default() };
        assert!(blank.validate().is_err());

        let ok = UserPatch { name: Some("new name".into()), ..Default::default() };
        assert!(ok.validate().is_ok());
    }
}
