//! Identity provider client for souk.
//!
//! Defines the [`IdentityProvider`] capability trait consumed by the
//! reconciliation core and the user lifecycle workflow, plus the
//! [`KeycloakClient`] implementation against the Keycloak admin REST API.

pub mod auth;
pub mod client;
pub mod error;
pub mod traits;
pub mod types;

pub use auth::{AdminAuth, AdminCredentials};
pub use client::KeycloakClient;
pub use error::{ProviderError, ProviderResult};
pub use traits::IdentityProvider;
pub use types::{NewProviderUser, ProviderUser, ProviderUserUpdate, UserSignals};
