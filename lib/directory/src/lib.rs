//! Directory of users, roles and approval committees for docflow.
//!
//! This crate provides:
//! - User records carrying the roles they hold (`User`, `RoleSet`)
//! - Approval committees with a chairperson (`Committee`)
//! - The `Directory` lookup trait consumed by the workflow engine, and
//!   `DirectoryAdmin` for maintaining records
//! - Directory error types
//!
//! # Example
//!
//! ```
//! use docflow_core::{RoleId, UserId};
//! use docflow_directory::{Committee, RoleSet, User};
//!
//! let finance = RoleId::new();
//! let mut user = User::new("Alice");
//! user.set_roles(RoleSet::from_roles([finance]));
//! assert!(user.has_role(finance));
//!
//! let chair = UserId::new();
//! let committee = Committee::new("Budget board", vec![user.id()], chair);
//! assert_eq!(committee.participants(), vec![user.id(), chair]);
//! ```

pub mod committee;
pub mod directory;
pub mod error;
pub mod role;
pub mod user;

// Re-export main types at crate root
pub use committee::Committee;
pub use directory::{Directory, DirectoryAdmin};
pub use error::DirectoryError;
pub use role::RoleSet;
pub use user::User;
