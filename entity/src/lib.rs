//! # Entities
//!
//! Sea-ORM entity definitions for local users and their provider associations.

pub mod associations;
pub mod users;

pub use associations::Entity as Associations;
pub use users::Entity as Users;
