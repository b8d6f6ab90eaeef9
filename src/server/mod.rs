//! Participant-facing HTTP service
//!
//! Routes:
//! - `/` landing page
//! - `/health` service status
//! - `/join/:profile` allocate or resolve a set, then redirect to the viewer
//! - `/viewer/:profile/:participant_id` map of an existing assignment
//! - `/static/*` set files and assets

pub mod catalog;
pub mod routes;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::AssignmentStore;

pub use catalog::SetCatalog;

/// State shared across handlers
pub struct AppState {
    pub store: AssignmentStore,
    pub catalog: SetCatalog,
    pub mapbox_api_key: Option<String>,
    /// Place name shown on the landing page and in `/health`
    pub location: String,
}

pub type SharedState = Arc<AppState>;

/// Create the service router
pub fn create_router(state: SharedState) -> Router {
    let static_dir = state.catalog.static_dir().to_path_buf();
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/join/:profile", get(routes::join))
        .route("/viewer/:profile/:participant_id", get(routes::viewer))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::ProfileUnknown(_) | Error::NoSetsAvailable(_) => StatusCode::NOT_FOUND,
            Error::SetsExhausted(_) => StatusCode::GONE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "Request failed");
            return (status, "Internal server error").into_response();
        }
        warn!(status = status.as_u16(), error = %self, "Request rejected");
        (status, self.to_string()).into_response()
    }
}

/// Build state from `config`, opening the assignment database.
pub fn build_state(config: &Config, mapbox_api_key: Option<String>) -> Result<SharedState> {
    let store = AssignmentStore::open(&config.store.db_path)?;
    let catalog = SetCatalog::new(&config.server.static_dir, &config.sets.output_dir);
    if !config.server.static_dir.is_dir() {
        warn!(
            static_dir = %config.server.static_dir.display(),
            "Static directory does not exist; every join will report no sets"
        );
    }
    Ok(Arc::new(AppState {
        store,
        catalog,
        mapbox_api_key,
        location: config.server.location.clone(),
    }))
}

/// Serve until the process is stopped.
pub async fn run(config: &Config, mapbox_api_key: String) -> Result<()> {
    let state = build_state(config, Some(mapbox_api_key))?;
    let app = create_router(state);

    let addr = config.server.listen;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
