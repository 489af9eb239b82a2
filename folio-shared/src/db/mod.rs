/// Database layer for Folio
///
/// - `pool`: PostgreSQL connection pool setup and health check
/// - `migrations`: embedded schema migrations
///
/// Row types and their queries live in [`crate::models`].

pub mod migrations;
pub mod pool;
