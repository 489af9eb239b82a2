/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and token refresh
/// - `projects`, `tasks`, `documents`: Nested resource endpoints

pub mod auth;
pub mod documents;
pub mod health;
pub mod projects;
pub mod tasks;
