//! Brokerage CRM: REST backend for clients, contacts, contracts and partners,
//! forwarding to a managed database platform.

pub mod backend;
pub mod case;
pub mod config;
pub mod error;
pub mod functions;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;

pub use backend::{Backend, MemoryBackend, PgBackend, RestBackend};
pub use config::{BackendArgs, BackendSettings, EmailUniqueness, ServeArgs};
pub use error::{AppError, BackendError, ConfigError, FunctionError};
pub use functions::FunctionsClient;
pub use routes::{api_routes, common_routes};
pub use state::AppState;

use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Full HTTP application: operational routes at the root, collections under `/api`.
pub fn app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", api_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
}

/// Pick the backend implementation the settings ask for.
pub async fn connect_backend(
    args: &ServeArgs,
    settings: &BackendSettings,
) -> Result<Arc<dyn Backend>, ConfigError> {
    match args.database_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => {
            tracing::info!(schema = %args.database_schema, "using direct Postgres backend");
            let backend =
                PgBackend::connect(url, &args.database_schema, args.database_max_connections).await?;
            Ok(Arc::new(backend))
        }
        None => {
            tracing::info!(url = %settings.url, "using REST backend");
            Ok(Arc::new(RestBackend::new(&settings.url, &settings.key)?))
        }
    }
}
