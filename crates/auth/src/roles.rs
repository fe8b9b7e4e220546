use serde::{Deserialize, Serialize};

use slicehouse_core::FranchiseId;

/// Role tag used for RBAC.
///
/// Roles are data, not a type hierarchy: a user holds an ordered list of
/// [`RoleAssignment`]s and the engine evaluates them together.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Default role for every registered user.
    #[serde(rename = "diner")]
    Diner,
    /// Administrator of one franchise (scoped by `object_id`).
    #[serde(rename = "franchisee")]
    FranchiseAdmin,
    /// Global administrator.
    #[serde(rename = "admin")]
    SystemAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Diner => "diner",
            Role::FranchiseAdmin => "franchisee",
            Role::SystemAdmin => "admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diner" => Ok(Role::Diner),
            "franchisee" => Ok(Role::FranchiseAdmin),
            "admin" => Ok(Role::SystemAdmin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// A role optionally scoped to one franchise.
///
/// `object_id` is only meaningful for [`Role::FranchiseAdmin`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<FranchiseId>,
}

impl RoleAssignment {
    pub fn diner() -> Self {
        Self { role: Role::Diner, object_id: None }
    }

    pub fn system_admin() -> Self {
        Self { role: Role::SystemAdmin, object_id: None }
    }

    pub fn franchise_admin(franchise_id: FranchiseId) -> Self {
        Self {
            role: Role::FranchiseAdmin,
            object_id: Some(franchise_id),
        }
    }

    pub fn is_system_admin(&self) -> bool {
        self.role == Role::SystemAdmin
    }

    /// True when this assignment administers `franchise_id`.
    pub fn administers(&self, franchise_id: FranchiseId) -> bool {
        self.role == Role::FranchiseAdmin && self.object_id == Some(franchise_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_matches_clients() {
        let diner = serde_json::to_value(RoleAssignment::diner()).unwrap();
        assert_eq!(diner, serde_json::json!({ "role": "diner" }));

        let admin = serde_json::to_value(RoleAssignment::franchise_admin(FranchiseId::new(7))).unwrap();
        assert_eq!(admin, serde_json::json!({ "role": "franchisee", "objectId": 7 }));
    }

    #[test]
    fn administers_is_scoped() {
        let a = RoleAssignment::franchise_admin(FranchiseId::new(3));
        assert!(a.administers(FranchiseId::new(3)));
        assert!(!a.administers(FranchiseId::new(5)));
        assert!(!RoleAssignment::system_admin().administers(FranchiseId::new(3)));
    }
}
