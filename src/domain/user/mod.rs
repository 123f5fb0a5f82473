//! User domain: roles, profiles and the authenticated caller

mod entity;
mod repository;

pub use entity::{Caller, Role, UserProfile};
pub use repository::UserDirectory;

#[cfg(test)]
pub use repository::MockUserDirectory;
