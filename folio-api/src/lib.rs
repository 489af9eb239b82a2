//! # Folio API Server Library
//!
//! HTTP surface of Folio: authentication plus the nested
//! project → task → document resources.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
