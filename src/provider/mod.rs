//! # Provider client adapters
//!
//! One adapter per identity provider behind the [`ProviderClient`] trait. All
//! transport, status and decoding failures are turned into [`ProviderError`]
//! here and never leak further up.

mod error;
pub mod facebook;
pub mod http;
mod registry;
mod traits;
pub mod twitter;

pub use error::ProviderError;
pub use facebook::FacebookProvider;
pub use registry::ProviderRegistry;
pub use traits::{AuthorizationRequest, CallbackParams, PendingHandshake, ProviderClient};
pub use twitter::TwitterProvider;
