//! # Provider client contract

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ProviderError;
use crate::types::{ProviderKind, VerifiedIdentity};

/// Query parameters a provider may send back to the callback route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    /// OAuth 2.0 authorization code
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    /// OAuth 1.0a request token echoed back
    pub oauth_token: Option<String>,
    pub oauth_verifier: Option<String>,
    /// Set by Twitter when the user cancels
    pub denied: Option<String>,
}

/// Handshake state that must survive between `begin` and `complete`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingHandshake {
    OAuth2 {
        state: String,
        redirect_url: String,
    },
    OAuth1 {
        request_token: String,
        request_token_secret: String,
    },
}

impl fmt::Debug for PendingHandshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OAuth2 { redirect_url, .. } => f
                .debug_struct("OAuth2")
                .field("redirect_url", redirect_url)
                .finish_non_exhaustive(),
            Self::OAuth1 { request_token, .. } => f
                .debug_struct("OAuth1")
                .field("request_token", request_token)
                .finish_non_exhaustive(),
        }
    }
}

/// Where to send the browser, plus what to remember for the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub redirect_url: String,
    pub handshake: PendingHandshake,
}

/// One adapter per provider. The resolver only ever sees this trait.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Build the provider authorization URL for a callback at `return_url`.
    async fn begin(&self, return_url: &str) -> Result<AuthorizationRequest, ProviderError>;

    /// Turn the callback into a verified identity.
    async fn complete(
        &self,
        params: &CallbackParams,
        handshake: Option<PendingHandshake>,
    ) -> Result<VerifiedIdentity, ProviderError>;
}
