//! # Account resolution
//!
//! Maps a verified external identity plus the session's login state onto one of
//! grant, deny, stage-for-registration or link, and handles unlinking.

mod engine;
mod outcome;

pub use engine::AccountResolver;
pub use outcome::{Destination, Outcome};
