use crate::error::OxPointsServerError;
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use headers::HeaderMapExt;
use headers_accept::Accept;
use mediatype::names::{APPLICATION, CSV, JSON, TEXT, XML};
use mediatype::{MediaType, Name};
use oxpoints::io::RdfFormat;
use oxpoints::results::QueryResultsFormat;
use std::convert::Infallible;

/// The SPARQL results format the `Accept` header asks for, if any is acceptable.
///
/// Only consulted by SPARQL queries without an explicit extension, so a header
/// matching none of the results formats is not an error.
pub struct ResultsFormatPreference(pub Option<QueryResultsFormat>);

impl FromRequestParts<AppState> for ResultsFormatPreference {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        static MEDIA_TYPES: [MediaType<'_>; 8] = [
            MediaType::new(APPLICATION, Name::new_unchecked("sparql-results+xml")),
            MediaType::new(APPLICATION, XML),
            MediaType::new(TEXT, XML),
            MediaType::new(APPLICATION, Name::new_unchecked("sparql-results+json")),
            MediaType::new(APPLICATION, JSON),
            MediaType::new(TEXT, CSV),
            MediaType::new(TEXT, Name::new_unchecked("tab-separated-values")),
            MediaType::new(TEXT, Name::new_unchecked("tsv")),
        ];

        let Some(accept) = parts.headers.typed_get::<Accept>() else {
            return Ok(Self(None));
        };
        Ok(Self(accept.negotiate(&MEDIA_TYPES).and_then(|media_type| {
            QueryResultsFormat::from_media_type(media_type.to_string().as_str())
        })))
    }
}

/// The RDF format of an uploaded body, from its `Content-Type`.
pub struct ContentFormat(pub RdfFormat);

impl FromRequestParts<AppState> for ContentFormat {
    type Rejection = OxPointsServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                OxPointsServerError::UnsupportedMediaType(
                    "A Content-Type header naming an RDF format is required".to_owned(),
                )
            })?;
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        RdfFormat::from_media_type(essence)
            .map(Self)
            .ok_or_else(|| OxPointsServerError::UnsupportedMediaType(essence.to_owned()))
    }
}
