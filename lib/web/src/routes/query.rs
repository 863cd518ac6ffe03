use crate::error::{ErrorContext, OxPointsServerError};
use crate::routes::content_negotiation::ResultsFormatPreference;
use crate::AppState;
use axum::extract::{Path, Query as QueryParams, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use oxpoints::output::{render, OutputOptions};
use oxpoints::query::Query;
use tracing::debug;

pub async fn handle_query_get(
    State(state): State<AppState>,
    Path(path): Path<String>,
    QueryParams(params): QueryParams<Vec<(String, String)>>,
    ResultsFormatPreference(results_format): ResultsFormatPreference,
    uri: Uri,
) -> Result<Response, OxPointsServerError> {
    let path_info = format!("/{path}");
    answer(&state, Some(&path_info), &params, results_format, &uri).await
}

/// The service root names no query.
pub async fn handle_root_get(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Response, OxPointsServerError> {
    answer(&state, None, &[], None, &uri).await
}

async fn answer(
    state: &AppState,
    path_info: Option<&str>,
    params: &[(String, String)],
    results_format: Option<oxpoints::results::QueryResultsFormat>,
    uri: &Uri,
) -> Result<Response, OxPointsServerError> {
    let fail = |error| OxPointsServerError::from_query_error(error, error_context(state, uri));

    let query = Query::from_request(path_info, params, &state.dataset.ontology()).map_err(fail)?;
    debug!(path = path_info, "Answering query");
    let snapshot = state.dataset.snapshot(query.time_instant());
    let options = OutputOptions {
        gpsbabel: &state.gpsbabel,
        results_format,
    };
    let output = render(&query, &snapshot, options).await.map_err(fail)?;

    let status = StatusCode::from_u16(output.status).unwrap_or(StatusCode::OK);
    Ok((
        status,
        [(header::CONTENT_TYPE, output.content_type)],
        output.body,
    )
        .into_response())
}

fn error_context(state: &AppState, uri: &Uri) -> ErrorContext {
    ErrorContext {
        url: format!("{}{}", state.base_url.trim_end_matches('/'), uri.path()),
        query: uri.query().map(str::to_owned),
        admin: state.admin.as_ref().clone(),
    }
}
