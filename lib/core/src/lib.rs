//! Core domain types and utilities for docflow.
//!
//! This crate provides the strongly-typed identifiers and the shared
//! `Result` alias used by the directory, workflow engine and server crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{
    CommitteeId, DocumentId, NotificationId, ParseIdError, RoleId, TemplateId, UserId, WorkflowId,
};
