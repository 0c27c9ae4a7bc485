//! # Error types

use axum::http::StatusCode;
use thiserror::Error;

use crate::provider::ProviderError;
use crate::registration::ValidationErrors;
use crate::types::ProviderKind;

/// Crate-wide error type.
///
/// The first group of variants is the taxonomy every caller above the provider
/// boundary handles. The rest are infrastructure failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// Provider could not be reached or refused to start a handshake
    #[error("provider {provider} unavailable: {message}")]
    ProviderUnavailable {
        provider: ProviderKind,
        message: String,
    },

    /// Credential exchange or identity verification failed at the provider
    #[error("authentication with {provider} failed: {message}")]
    AuthFailure {
        provider: ProviderKind,
        message: String,
    },

    /// The external identity already belongs to another local user
    #[error("{provider} identity {external_id} is already linked to another account")]
    DuplicateIdentity {
        provider: ProviderKind,
        external_id: String,
    },

    /// Username or email rejected at registration
    #[error("validation failed: {errors}")]
    Validation { errors: ValidationErrors },

    /// Nothing to unlink, nothing staged, unknown record
    #[error("not found: {message}")]
    NotFound { message: String },

    /// The owning local account is disabled
    #[error("account inactive: {message}")]
    InactiveAccount { message: String },

    /// Operation requires a logged-in session
    #[error("authentication required")]
    NotAuthenticated,

    /// New accounts may not be created through this provider
    #[error("registration through {provider} is closed")]
    RegistrationClosed { provider: ProviderKind },

    /// Route named a provider that is not configured
    #[error("unknown provider: {name}")]
    UnknownProvider { name: String },

    /// Local credentials did not verify
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Wraps another error with a human readable context line
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// HTTP status and stable error code for this error.
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::ProviderUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE")
            }
            Self::AuthFailure { .. } => (StatusCode::UNAUTHORIZED, "AUTH_FAILURE"),
            Self::DuplicateIdentity { .. } => (StatusCode::CONFLICT, "DUPLICATE_IDENTITY"),
            Self::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::InactiveAccount { .. } => (StatusCode::FORBIDDEN, "INACTIVE_ACCOUNT"),
            Self::NotAuthenticated => (StatusCode::UNAUTHORIZED, "NOT_AUTHENTICATED"),
            Self::RegistrationClosed { .. } => (StatusCode::FORBIDDEN, "REGISTRATION_CLOSED"),
            Self::UnknownProvider { .. } => (StatusCode::NOT_FOUND, "UNKNOWN_PROVIDER"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// Innermost error, skipping context wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the error should be shown to the user as their own mistake.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.to_http_response_parts().0.is_client_error()
    }

    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn inactive_account<T: Into<String>>(message: T) -> Self {
        Self::InactiveAccount {
            message: message.into(),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable { provider, message } => {
                Self::ProviderUnavailable { provider, message }
            }
            ProviderError::AuthFailure { provider, message } => {
                Self::AuthFailure { provider, message }
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation { errors }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::database_with_source(err.to_string(), err)
    }
}

impl From<sea_orm::TransactionError<Self>> for AppError {
    fn from(err: sea_orm::TransactionError<Self>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(db) => db.into(),
            sea_orm::TransactionError::Transaction(inner) => inner,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal_with_source(err.to_string(), err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source(format!("TOML parse error: {err}"), err)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::internal_with_source("password hashing failed", err)
    }
}
