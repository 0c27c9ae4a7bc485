//! # Registration handoff
//!
//! Turns a staged pending identity plus a chosen username and email into a local
//! user and its association, atomically, then announces the new user.

mod events;
mod handoff;
mod validation;

pub use events::{RegistrationEvents, UserRegistered};
pub use handoff::RegistrationService;
pub use validation::{ValidationErrors, validate_email_format, validate_username_format};
