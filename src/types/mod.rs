//! Shared domain types passed between the provider adapters, the resolver and
//! the session layer.

pub mod identity;

pub use identity::*;
