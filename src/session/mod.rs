//! # Sessions
//!
//! Server-side sessions keyed by an opaque cookie id. A session carries the
//! logged-in user, the pending identity awaiting registration and any provider
//! handshake in flight.

mod middleware;
mod staging;
mod store;

pub use middleware::session_layer;
pub use store::{Session, SessionData, SessionStore};
