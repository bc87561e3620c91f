//! Upstream-first user lifecycle.
//!
//! Mutations go to the identity provider before the mirror, so the
//! provider stays the source of truth. A mutation that lands upstream but
//! fails locally leaves the mirror behind; the next reconciliation pass
//! repairs it.

use std::sync::Arc;

use souk_core::Role;
use souk_db::models::User;
use souk_db::store::{IdentityStore, StoreError};
use souk_provider::{
    IdentityProvider, NewProviderUser, ProviderError, ProviderUserUpdate,
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The username or email is already taken.
    #[error("{field} already exists")]
    AlreadyExists { field: &'static str },

    /// No such user.
    #[error("user not found")]
    NotFound,

    #[error("identity provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("identity store error: {0}")]
    Store(#[from] StoreError),
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: Role,
}

/// Input for updating a user. The username is immutable.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// User lifecycle over provider and mirror.
#[derive(Clone)]
pub struct UserService {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn IdentityStore>,
}

impl UserService {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn IdentityStore>) -> Self {
        Self { provider, store }
    }

    /// Create a user upstream, set their credential and role, then mirror
    /// the record locally.
    ///
    /// A failure after the upstream create leaves an upstream-only user;
    /// the reconciliation engine adopts it on its next pass.
    pub async fn create_user(&self, input: NewUser) -> Result<User, LifecycleError> {
        if self.store.exists_by_username(&input.username).await? {
            return Err(LifecycleError::AlreadyExists { field: "username" });
        }
        if self.store.exists_by_email(&input.email).await? {
            return Err(LifecycleError::AlreadyExists { field: "email" });
        }

        let request = NewProviderUser::new(
            &input.username,
            &input.first_name,
            &input.last_name,
            &input.email,
        );
        let provider_id = match self.provider.create_user(&request).await {
            Ok(id) => id,
            Err(ProviderError::Conflict(_)) => {
                return Err(LifecycleError::AlreadyExists { field: "username" });
            }
            Err(error) => return Err(error.into()),
        };
        info!(username = %input.username, %provider_id, "Created user upstream");

        self.provider
            .set_credential(&provider_id, &input.password, false)
            .await?;

        let role_name = input.role.provider_name();
        if let Err(error) = self.provider.assign_realm_role(&provider_id, role_name).await {
            warn!(username = %input.username, role = role_name, %error, "Failed to assign realm role");
        } else {
            self.verify_role_effective(&provider_id, &input.username, role_name)
                .await;
        }

        let user = User::new(
            &provider_id,
            &input.username,
            &input.email,
            &input.first_name,
            &input.last_name,
            input.role,
        );
        self.store.save(&user).await?;
        info!(username = %user.username, id = %user.id, role = %user.role, "Mirrored created user");
        Ok(user)
    }

    /// Fetch a user by local id.
    pub async fn get_user(&self, id: Uuid) -> Result<User, LifecycleError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::NotFound)
    }

    /// Fetch a user by username.
    pub async fn get_user_by_username(&self, username: &str) -> Result<User, LifecycleError> {
        self.store
            .find_by_username(username)
            .await?
            .ok_or(LifecycleError::NotFound)
    }

    /// List every mirrored user.
    pub async fn list_users(&self) -> Result<Vec<User>, LifecycleError> {
        Ok(self.store.find_all().await?)
    }

    /// List mirrored users with the given role.
    pub async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, LifecycleError> {
        Ok(self.store.list_by_role(role).await?)
    }

    /// Update a user's profile fields and role, upstream first.
    pub async fn update_user(&self, id: Uuid, input: UserUpdate) -> Result<User, LifecycleError> {
        let mut user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        let update = ProviderUserUpdate {
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
        };
        self.provider.update_user(&user.provider_id, &update).await?;

        if user.role != input.role {
            self.replace_realm_role(&user, input.role).await;
        }

        user.email = input.email;
        user.first_name = input.first_name;
        user.last_name = input.last_name;
        user.role = input.role;
        self.store.save(&user).await?;
        info!(username = %user.username, id = %user.id, "Updated user");
        Ok(user)
    }

    /// Delete a user, upstream first. A user already gone upstream is
    /// treated as deleted there and removed locally.
    pub async fn delete_user(&self, id: Uuid) -> Result<(), LifecycleError> {
        let user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        match self.provider.delete_user(&user.provider_id).await {
            Ok(()) => {
                info!(username = %user.username, "Deleted user upstream");
            }
            Err(ProviderError::NotFound(_)) => {
                info!(username = %user.username, "User already gone upstream");
            }
            Err(error) => return Err(error.into()),
        }

        self.store.delete(user.id).await?;
        info!(username = %user.username, id = %user.id, "Deleted mirrored user");
        Ok(())
    }

    /// Swap the user's realm roles upstream for the new one. Failures are
    /// logged only; the next reconciliation pass re-reads the truth.
    async fn replace_realm_role(&self, user: &User, role: Role) {
        let current: Vec<String> = match self.provider.list_assignable_roles(&user.provider_id).await
        {
            Ok(names) => names,
            Err(error) => {
                warn!(username = %user.username, %error, "Failed to list current roles");
                Vec::new()
            }
        };
        if !current.is_empty() {
            if let Err(error) = self
                .provider
                .remove_realm_roles(&user.provider_id, &current)
                .await
            {
                warn!(username = %user.username, %error, "Failed to remove current roles");
            }
        }

        let role_name = role.provider_name();
        if let Err(error) = self
            .provider
            .assign_realm_role(&user.provider_id, role_name)
            .await
        {
            warn!(username = %user.username, role = role_name, %error, "Failed to assign new role");
        } else {
            self.verify_role_effective(&user.provider_id, &user.username, role_name)
                .await;
        }
    }

    /// Read back the effective set and warn when the grant has not
    /// propagated yet. The resolver's retry tier covers the lag.
    async fn verify_role_effective(&self, provider_id: &str, username: &str, role_name: &str) {
        match self.provider.list_effective_roles(provider_id).await {
            Ok(names) => {
                let found = names.iter().any(|n| n.eq_ignore_ascii_case(role_name));
                if !found {
                    warn!(username, role = role_name, "Role not yet in effective set");
                }
            }
            Err(error) => {
                warn!(username, %error, "Failed to verify effective roles");
            }
        }
    }
}
