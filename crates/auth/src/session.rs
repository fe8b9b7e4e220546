//! Session manager: register, login, logout, authenticate, profile updates.
//!
//! Tokens are stateless (signed, time-bounded) but only honoured while their
//! id sits in the store's active-token registry, so logout takes effect
//! immediately.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use serde::Serialize;

use slicehouse_core::{UserId, validate};

use crate::authorize::{Action, Authorizer, Resource};
use crate::user::normalize_email;
use crate::{AuthError, CredentialStore, NewUser, PasswordScheme, RoleAssignment, TokenCodec, User, UserPatch};

/// A user together with the bearer token just issued for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    codec: Arc<dyn TokenCodec>,
    passwords: Arc<dyn PasswordScheme>,
    authorizer: Authorizer,
    // Verified against when the e-mail is unknown so both login failures
    // cost one hash check.
    decoy_digest: Arc<OnceLock<String>>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        codec: Arc<dyn TokenCodec>,
        passwords: Arc<dyn PasswordScheme>,
    ) -> Self {
        let authorizer = Authorizer::new(store.clone());
        Self {
            store,
            codec,
            passwords,
            authorizer,
            decoy_digest: Arc::new(OnceLock::new()),
        }
    }

    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    /// Create a diner account and sign it in.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let name = validate::required("name", Some(name))?;
        let email = validate::required("email", Some(email))?;
        validate::required("password", Some(password))?;
        validate::email(email)?;

        let email = normalize_email(email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let digest = self.passwords.hash(password)?;
        let user = self
            .store
            .insert_user(NewUser {
                name: name.to_string(),
                email,
                password_digest: digest,
                roles: vec![RoleAssignment::diner()],
            })
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        self.start_session(user).await
    }

    /// Sign in with e-mail and password.
    ///
    /// Unknown e-mail and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        let accepted = match self.store.find_user_by_email(&email).await? {
            Some(user) => self.passwords.verify(password, &user.password_digest).then_some(user),
            None => {
                self.verify_decoy(password);
                None
            }
        };
        let Some(user) = accepted else {
            tracing::info!("login rejected");
            return Err(AuthError::UnknownCredentials);
        };

        tracing::info!(user_id = %user.id, "user logged in");
        self.start_session(user).await
    }

    /// Release a token. Idempotent: revoked, expired or unreadable tokens
    /// are not errors.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        match self.codec.decode_identifier(token) {
            Ok(claims) => {
                self.store.revoke_token(claims.jti).await?;
                tracing::info!(user_id = %claims.sub, token_id = %claims.jti, "token revoked");
            }
            Err(e) => {
                tracing::debug!(error = %e, "logout with unreadable token ignored");
            }
        }
        Ok(())
    }

    /// Resolve a bearer token to the current user record.
    ///
    /// Checks run cheapest first: signature and expiry, then registry
    /// membership, then the user lookup. A revoked token never reaches the
    /// user lookup.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.codec.decode(token, Utc::now()).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthError::Unauthorized
        })?;

        if !self.store.is_token_active(claims.jti).await? {
            tracing::debug!(token_id = %claims.jti, "token not active");
            return Err(AuthError::Unauthorized);
        }

        match self.store.find_user_by_id(claims.sub).await? {
            Some(user) => Ok(user),
            None => {
                tracing::debug!(user_id = %claims.sub, "token subject no longer exists");
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// Update a profile. Allowed for the user themself or a system admin.
    pub async fn update_user(&self, acting: &User, target: UserId, patch: UserPatch) -> Result<User, AuthError> {
        self.authorizer
            .require(Some(acting), Action::Update, Resource::User(target))
            .await?;

        patch.validate()?;
        let patch = patch.normalized();

        if let Some(email) = &patch.email {
            if let Some(existing) = self.store.find_user_by_email(email).await? {
                if existing.id != target {
                    return Err(AuthError::DuplicateIdentity);
                }
            }
        }

        let digest = match &patch.password {
            Some(password) => Some(self.passwords.hash(password)?),
            None => None,
        };
        let user = self.store.update_user(target, patch.with_digest(digest)).await?;

        tracing::info!(user_id = %target, acting_user_id = %acting.id, "user updated");
        Ok(user)
    }

    /// Delete a user (system admins only). Outstanding tokens die with the
    /// record because `authenticate` re-resolves the subject.
    pub async fn delete_user(&self, acting: &User, target: UserId) -> Result<(), AuthError> {
        self.authorizer
            .require(Some(acting), Action::Delete, Resource::User(target))
            .await?;

        self.store.delete_user(target).await?;
        tracing::info!(user_id = %target, acting_user_id = %acting.id, "user deleted");
        Ok(())
    }

    /// Make sure a system admin with this e-mail exists (startup seeding).
    ///
    /// An existing account is left untouched.
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(validate::required("email", Some(email))?);
        if let Some(existing) = self.store.find_user_by_email(&email).await? {
            if !existing.is_system_admin() {
                tracing::warn!(user_id = %existing.id, "admin e-mail belongs to an account without the admin role");
            }
            return Ok(existing);
        }

        validate::required("password", Some(password))?;
        let digest = self.passwords.hash(password)?;
        let user = self
            .store
            .insert_user(NewUser {
                name: validate::required("name", Some(name))?.to_string(),
                email,
                password_digest: digest,
                roles: vec![RoleAssignment::system_admin()],
            })
            .await?;

        tracing::info!(user_id = %user.id, "system admin seeded");
        Ok(user)
    }

    fn verify_decoy(&self, password: &str) {
        let digest = match self.decoy_digest.get() {
            Some(digest) => digest,
            None => match self.passwords.hash("decoy-password") {
                Ok(digest) => self.decoy_digest.get_or_init(|| digest),
                Err(e) => {
                    tracing::warn!(error = %e, "decoy digest unavailable");
                    return;
                }
            },
        };
        let _ = self.passwords.verify(password, digest);
    }

    async fn start_session(&self, user: User) -> Result<AuthSession, AuthError> {
        let issued = self
            .codec
            .issue(user.id, Utc::now())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.store
            .register_token_active(issued.id, user.id, issued.expires_at)
            .await?;

        tracing::debug!(user_id = %user.id, token_id = %issued.id, "token issued");
        Ok(AuthSession {
            user,
            token: issued.token,
        })
    }
}
