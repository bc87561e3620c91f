//! Identity provider capability trait.
//!
//! The reconciliation core and the user lifecycle workflow consume this
//! contract only; the provider is an injected capability reference, never
//! ambient global state.

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::types::{NewProviderUser, ProviderUser, ProviderUserUpdate, UserSignals};

/// Capability surface over the external identity provider.
///
/// The realm is construction state of the implementation; every call is
/// scoped to it implicitly.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// List every user in the realm.
    ///
    /// This is the ground truth for a reconciliation pass; a failure here
    /// aborts the pass.
    async fn list_users(&self) -> ProviderResult<Vec<ProviderUser>>;

    /// List the effective realm-level role names of a user.
    ///
    /// "Effective" includes composite expansion; freshly assigned roles may
    /// lag here, which is why the resolver also consults
    /// [`IdentityProvider::list_assignable_roles`].
    async fn list_effective_roles(&self, provider_id: &str) -> ProviderResult<Vec<String>>;

    /// List the directly assigned realm-level role names of a user,
    /// covering roles not yet propagated to the effective set.
    async fn list_assignable_roles(&self, provider_id: &str) -> ProviderResult<Vec<String>>;

    /// Fetch the free-form attributes and group memberships of a user.
    async fn get_attributes_and_groups(&self, provider_id: &str) -> ProviderResult<UserSignals>;

    /// Create a user upstream; returns the provider-issued id.
    ///
    /// Fails with [`crate::ProviderError::Conflict`] when the username or
    /// email already exists upstream.
    async fn create_user(&self, user: &NewProviderUser) -> ProviderResult<String>;

    /// Update the mutable fields of an upstream user.
    async fn update_user(
        &self,
        provider_id: &str,
        update: &ProviderUserUpdate,
    ) -> ProviderResult<()>;

    /// Set a user's password credential.
    async fn set_credential(
        &self,
        provider_id: &str,
        password: &str,
        temporary: bool,
    ) -> ProviderResult<()>;

    /// Assign a realm-level role by name.
    async fn assign_realm_role(&self, provider_id: &str, role_name: &str) -> ProviderResult<()>;

    /// Remove realm-level roles by name. Names that do not exist upstream
    /// are skipped.
    async fn remove_realm_roles(
        &self,
        provider_id: &str,
        role_names: &[String],
    ) -> ProviderResult<()>;

    /// Find a user by exact username.
    async fn search_user_by_username(&self, username: &str)
        -> ProviderResult<Option<ProviderUser>>;

    /// Delete a user upstream.
    async fn delete_user(&self, provider_id: &str) -> ProviderResult<()>;
}
