//! Authorization engine.
//!
//! [`decide`] is a pure function over (subject, role assignments, action,
//! resource). [`Authorizer`] wraps it with the store lookups that some
//! decisions need (a store's owning franchise, franchise admin membership).
//! Nothing here is cached: every call reflects the current store state.

use std::sync::Arc;

use serde::Serialize;

use slicehouse_core::{FranchiseId, StoreId, UserId};

use crate::{AuthError, CredentialStore, Role, RoleAssignment, User};

/// What the caller wants to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

/// What the caller wants to do it to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// A user profile (and the per-user franchise listing).
    User(UserId),
    /// One existing franchise.
    Franchise(FranchiseId),
    /// The collection new franchises are created in.
    FranchiseCatalog,
    /// A store under a franchise; `store` is `None` when creating one.
    Store {
        franchise: FranchiseId,
        store: Option<StoreId>,
    },
    /// The shared menu.
    Menu,
    /// A diner's orders.
    Orders(UserId),
}

impl Resource {
    /// Franchise the resource is scoped to, if any.
    pub fn franchise_scope(&self) -> Option<FranchiseId> {
        match self {
            Resource::Franchise(f) | Resource::Store { franchise: f, .. } => Some(*f),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No credential, or an invalid one.
    NotAuthenticated,
    /// Authenticated but no assignment grants the action.
    InsufficientRole,
}

impl core::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DenyReason::NotAuthenticated => f.write_str("not authenticated"),
            DenyReason::InsufficientRole => f.write_str("insufficient role"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason.into()),
        }
    }
}

/// Decide whether `subject` holding `roles` may perform `action` on `resource`.
///
/// - No IO
/// - No panics
/// - Logical OR over assignments: any granting assignment allows
pub fn decide(subject: UserId, roles: &[RoleAssignment], action: Action, resource: &Resource) -> Decision {
    if self_scoped(subject, action, resource) || roles.iter().any(|a| grants(a, action, resource)) {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::InsufficientRole)
    }
}

/// [`decide`] for an optional authenticated user.
pub fn authorize(user: Option<&User>, action: Action, resource: &Resource) -> Decision {
    match user {
        Some(user) => decide(user.id, &user.roles, action, resource),
        None => Decision::Deny(DenyReason::NotAuthenticated),
    }
}

/// Grants every authenticated subject has regardless of assignments.
fn self_scoped(subject: UserId, action: Action, resource: &Resource) -> bool {
    match resource {
        Resource::Menu => action == Action::Read,
        Resource::User(id) => *id == subject && matches!(action, Action::Read | Action::Update),
        Resource::Orders(owner) => *owner == subject && matches!(action, Action::Read | Action::Create),
        _ => false,
    }
}

fn grants(assignment: &RoleAssignment, action: Action, resource: &Resource) -> bool {
    match assignment.role {
        Role::SystemAdmin => true,
        Role::FranchiseAdmin => {
            let Some(scope) = assignment.object_id else {
                return false;
            };
            match resource {
                Resource::Franchise(f) => *f == scope && action == Action::Read,
                Resource::Store { franchise, .. } => *franchise == scope,
                _ => false,
            }
        }
        Role::Diner => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store-backed authorizer
// ─────────────────────────────────────────────────────────────────────────────

/// Authorization entry point for resource services.
#[derive(Clone)]
pub struct Authorizer {
    store: Arc<dyn CredentialStore>,
}

impl Authorizer {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Decide, consulting the store where the loaded user is not enough.
    ///
    /// Store-level resources are first re-scoped to the store's real owning
    /// franchise, so a path naming another franchise cannot widen access.
    pub async fn authorize(
        &self,
        user: Option<&User>,
        action: Action,
        resource: Resource,
    ) -> Result<Decision, AuthError> {
        let Some(user) = user else {
            return Ok(Decision::Deny(DenyReason::NotAuthenticated));
        };

        let resource = self.resolve(resource).await?;
        let mut decision = decide(user.id, &user.roles, action, &resource);

        if !decision.is_allowed() {
            if let Some(franchise) = resource.franchise_scope() {
                let admins = self.store.find_franchise_admins(franchise).await?;
                if admins.contains(&user.id) {
                    let mut roles = user.roles.clone();
                    roles.push(RoleAssignment::franchise_admin(franchise));
                    decision = decide(user.id, &roles, action, &resource);
                }
            }
        }

        match decision {
            Decision::Allow => {
                tracing::debug!(user_id = %user.id, ?action, ?resource, "authorization granted");
            }
            Decision::Deny(reason) => {
                tracing::info!(user_id = %user.id, ?action, ?resource, %reason, "authorization denied");
            }
        }
        Ok(decision)
    }

    /// [`Authorizer::authorize`] turned into a `Result`.
    pub async fn require(&self, user: Option<&User>, action: Action, resource: Resource) -> Result<(), AuthError> {
        self.authorize(user, action, resource).await?.into_result()
    }

    async fn resolve(&self, resource: Resource) -> Result<Resource, AuthError> {
        match resource {
            Resource::Store { franchise, store: Some(store) } => {
                let owner = self.store.find_store_franchise(store).await?;
                Ok(Resource::Store {
                    franchise: owner.unwrap_or(franchise),
                    store: Some(store),
                })
            }
            other => Ok(other),
        }
    }
}
