//! # Social registration
//!
//! Sign-in and registration through external identity providers (Facebook over
//! OAuth 2.0, Twitter over OAuth 1.0a), bound to local user accounts.
//!
//! A provider callback yields a verified identity. The resolver then grants a
//! login to its owner, links it to the logged-in user, or stages it in the
//! session until the registration handoff creates a local account for it.

pub mod accounts;
pub mod app;
pub mod association;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod provider;
pub mod registration;
pub mod resolution;
pub mod session;
pub mod testing;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use error::{AppError, Result};
