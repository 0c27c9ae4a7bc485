//! # HTTP surface
//!
//! axum router, handlers and the JSON envelope for errors.

pub mod handlers;
mod request_id;
pub mod response;
mod routes;
mod server;

pub use request_id::{REQUEST_ID_HEADER, RequestId};
pub use routes::create_routes;
pub use server::{AppState, build_router, serve};
