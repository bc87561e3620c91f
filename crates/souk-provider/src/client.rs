//! Keycloak admin REST client (reqwest-based).
//!
//! Implements [`IdentityProvider`] against the Keycloak admin API for a
//! single realm. Listing is paginated with a safety cap; user creation
//! extracts the provider-issued id from the `Location` header of the 201
//! response, mirroring the admin API contract.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::AdminAuth;
use crate::error::{ProviderError, ProviderResult};
use crate::traits::IdentityProvider;
use crate::types::{NewProviderUser, ProviderUser, ProviderUserUpdate, UserSignals};

/// Page size for paginated user listing.
const LIST_PAGE_SIZE: usize = 100;

/// Maximum number of users fetched per listing.
///
/// Prevents unbounded memory growth against very large realms. A realm
/// exceeding this fails the listing; a truncated listing must never feed
/// the stale-record deletion step.
const MAX_LISTED_USERS: usize = 50_000;

/// Realm role representation (subset of the admin API shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RoleRepresentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Full user representation, used only for attribute extraction.
#[derive(Debug, Deserialize)]
struct UserDetail {
    #[serde(default)]
    attributes: Option<HashMap<String, Vec<String>>>,
}

/// Group representation returned by the membership endpoint.
#[derive(Debug, Deserialize)]
struct GroupRepresentation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: Option<String>,
}

/// Password credential payload for the reset endpoint.
#[derive(Debug, Serialize)]
struct CredentialRepresentation<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
    temporary: bool,
}

/// Keycloak admin REST client scoped to one realm.
#[derive(Debug, Clone)]
pub struct KeycloakClient {
    base_url: String,
    realm: String,
    auth: AdminAuth,
    http_client: Client,
}

impl KeycloakClient {
    /// Create a new client.
    pub fn new(
        base_url: String,
        realm: String,
        auth: AdminAuth,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent("souk-provider/0.1")
            .build()
            .map_err(|e| {
                ProviderError::InvalidConfig(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self::with_http_client(base_url, realm, auth, http_client))
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(
        base_url: String,
        realm: String,
        auth: AdminAuth,
        http_client: Client,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            realm,
            auth,
            http_client,
        }
    }

    /// The realm this client is scoped to.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}/admin/realms/{}{path}", self.base_url, self.realm)
    }

    async fn authorized(&self, builder: reqwest::RequestBuilder) -> ProviderResult<Response> {
        let token = self.auth.bearer_token().await?;
        Ok(builder.bearer_auth(token).send().await?)
    }

    /// Decode a JSON body after checking the status.
    async fn handle_json<T: DeserializeOwned>(&self, response: Response) -> ProviderResult<T> {
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    /// Map a non-success response to the matching error variant.
    async fn check_status(response: Response) -> ProviderResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::from_status(status.as_u16(), body))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ProviderResult<T> {
        let response = self.authorized(self.http_client.get(url)).await?;
        self.handle_json(response).await
    }

    /// Resolve a realm role representation by name.
    async fn realm_role(&self, role_name: &str) -> ProviderResult<RoleRepresentation> {
        let url = self.admin_url(&format!("/roles/{role_name}"));
        self.get_json(&url).await
    }
}

#[async_trait]
impl IdentityProvider for KeycloakClient {
    async fn list_users(&self) -> ProviderResult<Vec<ProviderUser>> {
        let mut all_users = Vec::new();
        let mut first = 0usize;

        loop {
            let url = self.admin_url(&format!("/users?first={first}&max={LIST_PAGE_SIZE}"));
            let page: Vec<ProviderUser> = self.get_json(&url).await?;
            let fetched = page.len();
            all_users.extend(page);

            if fetched < LIST_PAGE_SIZE {
                break;
            }
            if all_users.len() >= MAX_LISTED_USERS {
                warn!(
                    fetched = all_users.len(),
                    cap = MAX_LISTED_USERS,
                    "User listing hit the safety cap with pages remaining, aborting"
                );
                return Err(ProviderError::ListingCapExceeded {
                    cap: MAX_LISTED_USERS,
                });
            }
            first += fetched;
        }

        debug!(realm = %self.realm, count = all_users.len(), "Listed provider users");
        Ok(all_users)
    }

    async fn list_effective_roles(&self, provider_id: &str) -> ProviderResult<Vec<String>> {
        let url = self.admin_url(&format!("/users/{provider_id}/role-mappings/realm/composite"));
        let roles: Vec<RoleRepresentation> = self.get_json(&url).await?;
        Ok(roles.into_iter().map(|r| r.name).collect())
    }

    async fn list_assignable_roles(&self, provider_id: &str) -> ProviderResult<Vec<String>> {
        let url = self.admin_url(&format!("/users/{provider_id}/role-mappings/realm"));
        let roles: Vec<RoleRepresentation> = self.get_json(&url).await?;
        Ok(roles.into_iter().map(|r| r.name).collect())
    }

    async fn get_attributes_and_groups(&self, provider_id: &str) -> ProviderResult<UserSignals> {
        let detail_url = self.admin_url(&format!("/users/{provider_id}"));
        let detail: UserDetail = self.get_json(&detail_url).await?;

        let groups_url = self.admin_url(&format!("/users/{provider_id}/groups"));
        let groups: Vec<GroupRepresentation> = self.get_json(&groups_url).await?;

        Ok(UserSignals {
            attributes: detail.attributes.unwrap_or_default(),
            groups: groups
                .into_iter()
                .map(|g| g.path.unwrap_or(g.name))
                .collect(),
        })
    }

    async fn create_user(&self, user: &NewProviderUser) -> ProviderResult<String> {
        let url = self.admin_url("/users");
        let response = self
            .authorized(self.http_client.post(&url).json(user))
            .await?;

        if response.status() != StatusCode::CREATED {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        // The admin API returns the new user id only via the Location header.
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ProviderError::Api {
                status: 201,
                message: "user created but Location header missing".to_string(),
            })?;

        let id = location
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::Api {
                status: 201,
                message: format!("unparseable Location header: {location}"),
            })?;

        debug!(username = %user.username, provider_id = %id, "Created provider user");
        Ok(id.to_string())
    }

    async fn update_user(
        &self,
        provider_id: &str,
        update: &ProviderUserUpdate,
    ) -> ProviderResult<()> {
        let url = self.admin_url(&format!("/users/{provider_id}"));
        let response = self
            .authorized(self.http_client.put(&url).json(update))
            .await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn set_credential(
        &self,
        provider_id: &str,
        password: &str,
        temporary: bool,
    ) -> ProviderResult<()> {
        let url = self.admin_url(&format!("/users/{provider_id}/reset-password"));
        let credential = CredentialRepresentation {
            kind: "password",
            value: password,
            temporary,
        };
        let response = self
            .authorized(self.http_client.put(&url).json(&credential))
            .await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn assign_realm_role(&self, provider_id: &str, role_name: &str) -> ProviderResult<()> {
        let role = self.realm_role(role_name).await?;
        let url = self.admin_url(&format!("/users/{provider_id}/role-mappings/realm"));
        let response = self
            .authorized(self.http_client.post(&url).json(&vec![role]))
            .await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn remove_realm_roles(
        &self,
        provider_id: &str,
        role_names: &[String],
    ) -> ProviderResult<()> {
        let mut roles = Vec::with_capacity(role_names.len());
        for name in role_names {
            match self.realm_role(name).await {
                Ok(role) => roles.push(role),
                Err(e) if e.is_not_found() => {
                    debug!(role = %name, "Realm role vanished upstream, skipping removal");
                }
                Err(e) => return Err(e),
            }
        }
        if roles.is_empty() {
            return Ok(());
        }

        let url = self.admin_url(&format!("/users/{provider_id}/role-mappings/realm"));
        let response = self
            .authorized(self.http_client.delete(&url).json(&roles))
            .await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn search_user_by_username(
        &self,
        username: &str,
    ) -> ProviderResult<Option<ProviderUser>> {
        let url = self.admin_url(&format!("/users?username={username}&exact=true"));
        let users: Vec<ProviderUser> = self.get_json(&url).await?;
        Ok(users.into_iter().next())
    }

    async fn delete_user(&self, provider_id: &str) -> ProviderResult<()> {
        let url = self.admin_url(&format!("/users/{provider_id}"));
        let response = self.authorized(self.http_client.delete(&url)).await?;
        Self::check_status(response).await.map(|_| ())
    }
}
