//! docflow HTTP server.
//!
//! Exposes the approval workflow engine over a JSON API backed by
//! PostgreSQL.

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;
