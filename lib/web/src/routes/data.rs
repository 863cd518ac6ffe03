use crate::error::OxPointsServerError;
use crate::routes::content_negotiation::ContentFormat;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::info;

/// Adds the uploaded RDF to the dataset and points at the newest entity.
pub async fn handle_data_post(
    State(state): State<AppState>,
    format: Result<ContentFormat, OxPointsServerError>,
    body: Bytes,
) -> Result<Response, OxPointsServerError> {
    if state.read_only {
        return Err(OxPointsServerError::ReadOnly);
    }
    let ContentFormat(format) = format?;

    state.dataset.load_from_reader(format, body.as_ref())?;
    let highest_id = state
        .dataset
        .snapshot(None)
        .highest_id()
        .map_err(|e| OxPointsServerError::Internal(e.into()))?;
    info!(
        format = format.name(),
        bytes = body.len(),
        highest_id,
        "Loaded uploaded data"
    );

    let location = format!("{}/id/{highest_id}", state.base_url.trim_end_matches('/'));
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
}
