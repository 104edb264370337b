//! Shared infrastructure for the group directory service: errors, base
//! configuration, observability and HTTP middleware.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
