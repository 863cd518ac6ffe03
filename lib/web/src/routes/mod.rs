use crate::routes::data::handle_data_post;
use crate::routes::query::{handle_query_get, handle_root_get};
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;

mod content_negotiation;
mod data;
mod query;

pub fn create_query_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handle_root_get))
        .route("/data", post(handle_data_post).put(handle_data_post))
        .route("/{*path}", get(handle_query_get))
}
