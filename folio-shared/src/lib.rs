//! # Folio Shared Library
//!
//! Domain types, persistence and access control used by the Folio API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their sqlx queries
//! - `db`: Connection pool and migrations
//! - `store`: Persistence seam (`Store` trait) with Postgres and in-memory backends
//! - `auth`: Passwords, JWTs, bearer extraction and ownership-based authorization
//! - `files`: Storage path generation and the file store backend
//! - `documents`: Keeps document records and stored files in step
//! - `services`: Project, task and document operations behind the access gate

pub mod auth;
pub mod db;
pub mod documents;
pub mod files;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Folio shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
