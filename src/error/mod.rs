//! The unified error handling system for the application.

use std::fmt::Display;

pub use types::AppError;

/// A unified `Result` type for the entire application.
pub type Result<T> = std::result::Result<T, AppError>;

pub mod macros;
pub mod types;

/// Attach a context line to any error convertible into [`AppError`].
pub trait Context<T, E> {
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display;

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display,
    {
        self.with_context(|| context)
    }

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|error| AppError::Context {
            context: context().to_string(),
            source: Box::new(error.into()),
        })
    }
}

#[cfg(test)]
mod tests;
