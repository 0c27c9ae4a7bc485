//! # Provider errors
//!
//! Everything that can go wrong talking to a provider collapses into one of
//! two kinds before it leaves the adapter.

use thiserror::Error;

use crate::types::ProviderKind;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Could not start a handshake; the user should try again later
    #[error("{provider} unavailable: {message}")]
    Unavailable {
        provider: ProviderKind,
        message: String,
    },

    /// Credential exchange or identity fetch failed
    #[error("{provider} authentication failed: {message}")]
    AuthFailure {
        provider: ProviderKind,
        message: String,
    },
}

impl ProviderError {
    pub fn unavailable<T: Into<String>>(provider: ProviderKind, message: T) -> Self {
        Self::Unavailable {
            provider,
            message: message.into(),
        }
    }

    pub fn auth_failure<T: Into<String>>(provider: ProviderKind, message: T) -> Self {
        Self::AuthFailure {
            provider,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn provider(&self) -> ProviderKind {
        match self {
            Self::Unavailable { provider, .. } | Self::AuthFailure { provider, .. } => *provider,
        }
    }
}
