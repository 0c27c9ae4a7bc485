//! # Logging
//!
//! tracing-subscriber setup plus the structured `l*` macros used across the crate.
//! Every record carries a request id, a stage, a component and an operation name so
//! a single handshake can be followed through the logs.

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset. SQL statement logging stays off.
pub const DEFAULT_LOG_FILTER: &str = "social_registration=debug,sqlx::query=off,sea_orm::query=warn,sqlx=warn";

/// Where in the request lifecycle a record was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Shutdown,
    Configuration,
    Db,
    Authentication,
    ExternalApi,
    Resolution,
    Registration,
    Session,
    Response,
    Error,
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Configuration => "configuration",
            Self::Db => "db",
            Self::Authentication => "authentication",
            Self::ExternalApi => "external_api",
            Self::Resolution => "resolution",
            Self::Registration => "registration",
            Self::Session => "session",
            Self::Response => "response",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Which part of the system emitted a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    Config,
    Database,
    ServerSetup,
    Session,
    AssociationStore,
    Provider,
    Facebook,
    Twitter,
    Resolver,
    Registration,
    Accounts,
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Main => "main",
            Self::Config => "config",
            Self::Database => "database",
            Self::ServerSetup => "server_setup",
            Self::Session => "session",
            Self::AssociationStore => "association_store",
            Self::Provider => "provider",
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::Resolver => "resolver",
            Self::Registration => "registration",
            Self::Accounts => "accounts",
        };
        f.write_str(name)
    }
}

/// `linfo!(request_id, stage, component, operation, message, field = value, ...)`
#[macro_export]
macro_rules! linfo {
    ($rid:expr, $stage:expr, $component:expr, $op:expr, $msg:expr $(, $($fields:tt)+)?) => {
        ::tracing::info!(
            request_id = %$rid,
            stage = %$stage,
            component = %$component,
            operation = $op,
            $($($fields)+,)?
            "{}",
            $msg
        )
    };
}

/// Debug-level variant of [`linfo!`].
#[macro_export]
macro_rules! ldebug {
    ($rid:expr, $stage:expr, $component:expr, $op:expr, $msg:expr $(, $($fields:tt)+)?) => {
        ::tracing::debug!(
            request_id = %$rid,
            stage = %$stage,
            component = %$component,
            operation = $op,
            $($($fields)+,)?
            "{}",
            $msg
        )
    };
}

/// Warn-level variant of [`linfo!`].
#[macro_export]
macro_rules! lwarn {
    ($rid:expr, $stage:expr, $component:expr, $op:expr, $msg:expr $(, $($fields:tt)+)?) => {
        ::tracing::warn!(
            request_id = %$rid,
            stage = %$stage,
            component = %$component,
            operation = $op,
            $($($fields)+,)?
            "{}",
            $msg
        )
    };
}

/// Error-level variant of [`linfo!`].
#[macro_export]
macro_rules! lerror {
    ($rid:expr, $stage:expr, $component:expr, $op:expr, $msg:expr $(, $($fields:tt)+)?) => {
        ::tracing::error!(
            request_id = %$rid,
            stage = %$stage,
            component = %$component,
            operation = $op,
            $($($fields)+,)?
            "{}",
            $msg
        )
    };
}

/// Build the filter directive string from an optional base level.
#[must_use]
pub fn default_filter(log_level: Option<&str>) -> String {
    format!("{},{DEFAULT_LOG_FILTER}", log_level.unwrap_or("info"))
}

/// Install the global subscriber. `RUST_LOG` wins over `log_level`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(log_level: Option<&str>) {
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(log_level));

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_component_names() {
        assert_eq!(LogStage::ExternalApi.to_string(), "external_api");
        assert_eq!(LogComponent::AssociationStore.to_string(), "association_store");
    }

    #[test]
    fn test_default_filter_uses_level() {
        let filter = default_filter(Some("warn"));
        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("sqlx::query=off"));
        assert!(default_filter(None).starts_with("info,"));
    }

    #[test]
    fn test_macros_expand_with_and_without_fields() {
        init_logging(None);
        crate::linfo!("test", LogStage::Startup, LogComponent::Main, "plain", "hello");
        crate::ldebug!(
            "test",
            LogStage::Session,
            LogComponent::Session,
            "with_fields",
            "hello",
            user_id = 7,
            provider = %"twitter"
        );
    }
}
