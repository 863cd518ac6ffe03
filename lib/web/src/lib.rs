use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

mod config;
mod error;
mod routes;
mod state;

use crate::routes::create_query_routes;
pub use config::{AdminContact, ServerConfig};
pub use state::AppState;

pub fn create_router(app_state: AppState) -> Router {
    create_query_routes()
        .with_state(app_state)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let app_state = AppState::from_config(&config);
    match app_state.gpsbabel.version().await {
        Ok(version) => info!(version, "Using GPSBabel"),
        Err(error) => warn!(%error, path = %config.gpsbabel.display(), "GPSBabel is unavailable"),
    }

    let app = create_router(app_state);
    let app = if config.cors {
        app.layer(tower_http::cors::CorsLayer::permissive())
    } else {
        app
    };

    let listener = tokio::net::TcpListener::bind(config.bind.as_str()).await?;
    info!(addr = %listener.local_addr()?, entities = config.dataset.len()?, "Listening");
    Ok(axum::serve(listener, app).await?)
}
