//! # Error handling tests

use std::error::Error;

use axum::http::StatusCode;

use crate::error::{AppError, Context};
use crate::provider::ProviderError;
use crate::registration::ValidationErrors;
use crate::types::ProviderKind;

#[test]
fn test_config_error_creation() {
    let err = AppError::config("missing port");
    assert!(matches!(err, AppError::Config { .. }));
    assert_eq!(err.to_string(), "config error: missing port");
}

#[test]
fn test_config_error_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
    let err = AppError::config_with_source("could not load config", io_err);

    assert!(err.to_string().contains("could not load config"));
    assert!(err.source().is_some());
}

#[test]
fn test_provider_error_conversion() {
    let err: AppError = ProviderError::unavailable(ProviderKind::Twitter, "503").into();
    assert!(matches!(
        err,
        AppError::ProviderUnavailable {
            provider: ProviderKind::Twitter,
            ..
        }
    ));

    let err: AppError = ProviderError::auth_failure(ProviderKind::Facebook, "bad code").into();
    assert_eq!(err.to_http_response_parts(), (StatusCode::UNAUTHORIZED, "AUTH_FAILURE"));
}

#[test]
fn test_taxonomy_status_codes() {
    let duplicate = AppError::DuplicateIdentity {
        provider: ProviderKind::Facebook,
        external_id: "555".into(),
    };
    assert_eq!(duplicate.to_http_response_parts().0, StatusCode::CONFLICT);
    assert_eq!(
        AppError::not_found("nothing staged").to_http_response_parts().0,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        AppError::inactive_account("alice").to_http_response_parts(),
        (StatusCode::FORBIDDEN, "INACTIVE_ACCOUNT")
    );

    let mut errors = ValidationErrors::default();
    errors.add("username", "This username is already in use.");
    let err: AppError = errors.into();
    assert_eq!(
        err.to_http_response_parts(),
        (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
    );
    assert!(err.is_client_error());
    assert!(!AppError::internal("boom").is_client_error());
}

#[test]
fn test_context_keeps_inner_status() {
    let result: Result<(), AppError> = Err(AppError::NotAuthenticated);
    let err = result.context("unlinking facebook").unwrap_err();

    assert_eq!(err.to_string(), "unlinking facebook: authentication required");
    assert_eq!(err.to_http_response_parts().0, StatusCode::UNAUTHORIZED);
    assert!(matches!(err.root(), AppError::NotAuthenticated));
}

#[test]
fn test_with_context_on_foreign_error() {
    let result: Result<(), std::io::Error> = Err(std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        "denied",
    ));
    let err = result
        .with_context(|| format!("reading {}", "config.toml"))
        .unwrap_err();

    assert!(err.to_string().starts_with("reading config.toml"));
    assert!(matches!(err.root(), AppError::Internal { .. }));
}

#[test]
fn test_error_macros() {
    let err = crate::config_error!("port {} is invalid", 0);
    assert_eq!(err.to_string(), "config error: port 0 is invalid");

    let err = crate::database_error!("connection lost");
    assert!(matches!(err, AppError::Database { .. }));
}
