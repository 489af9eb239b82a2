/// Document file storage
///
/// # Modules
///
/// - [`path`]: collision-resistant storage path generation
/// - [`backend`]: the [`backend::FileStore`] trait and the local filesystem backend

pub mod backend;
pub mod path;
