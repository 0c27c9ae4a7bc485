//! # Local accounts
//!
//! Lookup, creation and password login for local users. Accounts created through
//! a provider get an unusable password and can only sign in through their
//! associations.

mod directory;

pub use directory::{UserDirectory, insert_external_user, unusable_password};

/// A stored user row.
pub type User = entity::users::Model;
