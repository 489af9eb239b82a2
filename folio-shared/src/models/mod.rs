/// Database models for Folio
///
/// Each model carries its sqlx CRUD operations as associated functions taking a
/// `&PgPool`. Application code normally goes through [`crate::store::Store`]
/// instead of calling these directly.
///
/// # Models
///
/// - `user`: accounts, the root of the ownership chain
/// - `project`: projects owned by a user
/// - `task`: tasks inside a project
/// - `document`: uploaded files attached to a task
///
/// # Example
///
/// ```no_run
/// use folio_shared::models::project::{Project, CreateProject};
/// use folio_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let project = Project::create(&pool, CreateProject {
///     name: "Thesis".to_string(),
///     description: String::new(),
///     owner_id,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod document;
pub mod project;
pub mod task;
pub mod user;
