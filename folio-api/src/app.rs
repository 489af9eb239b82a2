/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use folio_api::{app::{build_router, AppState}, config::Config};
/// use folio_shared::db::pool::{create_pool, DatabaseConfig};
/// use folio_shared::files::backend::FilesystemStore;
/// use folio_shared::store::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let files = Arc::new(FilesystemStore::new(config.media.root.clone()));
/// let state = AppState::new(Arc::new(PgStore::new(pool)), files, config);
///
/// let app = build_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use folio_shared::{
    auth::middleware::authenticate,
    files::backend::FileStore,
    services::Services,
    store::Store,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{config::Config, error::ApiError, routes};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Persistence, used directly by auth and health
    pub store: Arc<dyn Store>,

    /// Project, task and document operations
    pub services: Services,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, files: Arc<dyn FileStore>, config: Config) -> Self {
        Self {
            services: Services::new(store.clone(), files),
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health
/// └── /api/
///     ├── /auth/                          (public)
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── POST /refresh
///     └── /projects/                      (bearer token)
///         ├── GET, POST /
///         ├── GET, PUT, PATCH, DELETE /:project_pk
///         └── /:project_pk/tasks/
///             ├── GET, POST /
///             ├── GET, PUT, PATCH, DELETE /:task_pk
///             └── /:task_pk/documents/
///                 ├── GET, POST /
///                 ├── GET, PUT, PATCH, DELETE /:document_pk
///                 └── GET /:document_pk/download
/// ```
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let resource_routes = Router::new()
        .route(
            "/projects",
            get(routes::projects::list).post(routes::projects::create),
        )
        .route(
            "/projects/:project_pk",
            get(routes::projects::retrieve)
                .put(routes::projects::update)
                .patch(routes::projects::update)
                .delete(routes::projects::delete),
        )
        .route(
            "/projects/:project_pk/tasks",
            get(routes::tasks::list).post(routes::tasks::create),
        )
        .route(
            "/projects/:project_pk/tasks/:task_pk",
            get(routes::tasks::retrieve)
                .put(routes::tasks::update)
                .patch(routes::tasks::update)
                .delete(routes::tasks::delete),
        )
        .route(
            "/projects/:project_pk/tasks/:task_pk/documents",
            get(routes::documents::list).post(routes::documents::create),
        )
        .route(
            "/projects/:project_pk/tasks/:task_pk/documents/:document_pk",
            get(routes::documents::retrieve)
                .put(routes::documents::update)
                .patch(routes::documents::update)
                .delete(routes::documents::delete),
        )
        .route(
            "/projects/:project_pk/tasks/:task_pk/documents/:document_pk/download",
            get(routes::documents::download),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(resource_routes);

    let cors = if state.config.cors_permissive() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(state.config.media.max_upload_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer access token and injects `AuthContext` into the
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret())?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
