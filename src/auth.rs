//! Credential acquisition
//!
//! The pipeline does not implement a sign-in UI. It consumes a
//! [`CredentialProvider`] capability and applies a fixed two-branch
//! sequence: try a silent renewal of a previously established identity,
//! and on any failure fall back to exactly one interactive attempt.

use crate::error::AuthError;
use async_trait::async_trait;
use std::fmt;

/// An opaque bearer token for the remote task API
///
/// `Debug` output is redacted so tokens never leak into logs.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw bearer token string
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw token, for building the `Authorization` header
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Capability that produces bearer tokens for the remote task API
///
/// Implementors wrap an identity library (e.g., an MSAL-style public
/// client). The interactive path may present whatever UI the host
/// application uses; the pipeline treats both calls as opaque. Either call
/// may persist session state in the provider's own store.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Renew a token for the previously established identity without user
    /// interaction.
    async fn acquire_silent(&self) -> Result<AccessToken, AuthError>;

    /// Acquire a token through the provider's interactive sign-in flow for
    /// the given scopes.
    async fn acquire_interactive(&self, scopes: &[String]) -> Result<AccessToken, AuthError>;
}

/// Acquire a usable token: silent first, one interactive fallback
///
/// This is a two-branch decision, not a retry loop: a silent failure of any
/// kind triggers exactly one interactive attempt, and if that also fails
/// the interactive error surfaces to the caller.
pub async fn acquire_token(
    provider: &dyn CredentialProvider,
    scopes: &[String],
) -> Result<AccessToken, AuthError> {
    match provider.acquire_silent().await {
        Ok(token) => {
            tracing::debug!("token acquired silently");
            Ok(token)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "silent token acquisition failed, attempting interactive sign-in"
            );
            let token = provider.acquire_interactive(scopes).await?;
            tracing::debug!("token acquired interactively");
            Ok(token)
        }
    }
}
