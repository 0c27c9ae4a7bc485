//! # Error construction macros

/// Build an [`AppError::Config`](crate::error::AppError::Config).
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::AppError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::AppError::config(format!($fmt, $($arg)*))
    };
}

/// Build an [`AppError::Database`](crate::error::AppError::Database).
#[macro_export]
macro_rules! database_error {
    ($msg:expr) => {
        $crate::error::AppError::database($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::AppError::database(format!($fmt, $($arg)*))
    };
}

/// Build an [`AppError::Internal`](crate::error::AppError::Internal).
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::error::AppError::internal($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::AppError::internal(format!($fmt, $($arg)*))
    };
}

/// Return a config error unless the condition holds.
#[macro_export]
macro_rules! ensure_config {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::config_error!($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::config_error!($fmt, $($arg)*));
        }
    };
}
