//! Seam to the external identity provider.
//!
//! The layer never stores credentials itself: it asks the provider for one
//! per request and asks it to refresh after a `401`. Correctness of the
//! provider's own cache under concurrent refreshes is the provider's job.
//! `SingleFlightIdentity` is an opt-in decorator for providers that do not
//! coordinate refreshes themselves.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The identity provider could not produce a credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CredentialUnavailable {
    pub message: String,
}

impl CredentialUnavailable {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// External identity collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Return the current credential, possibly from the provider's cache.
    async fn get_credential(&self) -> Result<Credential, CredentialUnavailable>;

    /// Force a new credential, bypassing any cache.
    async fn refresh_credential(&self) -> Result<Credential, CredentialUnavailable>;
}

/// Provider with no signed-in user. Requests go out without `Authorization`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait]
impl IdentityProvider for Anonymous {
    async fn get_credential(&self) -> Result<Credential, CredentialUnavailable> {
        Err(CredentialUnavailable::new("no signed-in user"))
    }

    async fn refresh_credential(&self) -> Result<Credential, CredentialUnavailable> {
        Err(CredentialUnavailable::new("no signed-in user"))
    }
}

/// Provider that always hands out the same token. Useful for service
/// accounts and local development against the mock server.
#[derive(Debug, Clone)]
pub struct StaticToken(Credential);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Credential::new(token))
    }
}

#[async_trait]
impl IdentityProvider for StaticToken {
    async fn get_credential(&self) -> Result<Credential, CredentialUnavailable> {
        Ok(self.0.clone())
    }

    async fn refresh_credential(&self) -> Result<Credential, CredentialUnavailable> {
        Ok(self.0.clone())
    }
}

/// Collapses concurrent refreshes into a single call on the inner provider.
///
/// A caller that starts waiting while another refresh is in flight reuses
/// that refresh's result instead of issuing its own.
pub struct SingleFlightIdentity<P> {
    inner: P,
    generation: AtomicU64,
    latest: Mutex<Option<Result<Credential, CredentialUnavailable>>>,
}

impl<P: IdentityProvider> SingleFlightIdentity<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            generation: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl<P: IdentityProvider> IdentityProvider for SingleFlightIdentity<P> {
    async fn get_credential(&self) -> Result<Credential, CredentialUnavailable> {
        self.inner.get_credential().await
    }

    async fn refresh_credential(&self) -> Result<Credential, CredentialUnavailable> {
        let observed = self.generation.load(Ordering::Acquire);
        let mut latest = self.latest.lock().await;
        if self.generation.load(Ordering::Acquire) != observed {
            if let Some(result) = latest.as_ref() {
                tracing::debug!("reusing in-flight credential refresh");
                return result.clone();
            }
        }

        let result = self.inner.refresh_credential().await;
        *latest = Some(result.clone());
        self.generation.fetch_add(1, Ordering::AcqRel);
        result
    }
}
