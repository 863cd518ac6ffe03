//! Answers a parsed [`Query`] against a [`Snapshot`].

use crate::dataset::Snapshot;
use crate::error::{OxPointsError, Result};
use crate::gpsbabel::GpsBabel;
use crate::pool::EntityPool;
use crate::query::{Query, ReturnType};
use crate::sparql::{endpoint_page, evaluate, results_format_for};
use crate::transform::{
    rdf_format_for, to_autosuggest, to_geojson, to_json, to_kml, to_name_list, to_rdf, to_text,
    MapOptions, KML_CONTENT_TYPE,
};
use oxigraph::sparql::results::QueryResultsFormat;
use tracing::debug;

const TEXT_PLAIN: &str = "text/plain";
const TEXT_JAVASCRIPT: &str = "text/javascript";
const APPLICATION_JSON: &str = "application/json";

/// A rendered response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl Output {
    pub fn ok(content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

/// Request-scoped rendering settings.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions<'a> {
    pub gpsbabel: &'a GpsBabel,
    /// Results format negotiated from the `Accept` header, used by SPARQL queries without extension.
    pub results_format: Option<QueryResultsFormat>,
}

impl<'a> OutputOptions<'a> {
    pub fn new(gpsbabel: &'a GpsBabel) -> Self {
        Self {
            gpsbabel,
            results_format: None,
        }
    }
}

pub async fn render(query: &Query, snapshot: &Snapshot, options: OutputOptions<'_>) -> Result<Output> {
    debug!(
        return_type = ?query.return_type(),
        format = query.format(),
        instant = %snapshot.instant(),
        "Rendering query"
    );
    match query.return_type() {
        ReturnType::MetaTimestamp => {
            let millis = snapshot.start_time().unix_timestamp_nanos() / 1_000_000;
            Ok(Output::ok(TEXT_PLAIN, millis.to_string()))
        }
        ReturnType::MetaNextId => Ok(Output::ok(TEXT_PLAIN, snapshot.next_id()?.to_string())),
        ReturnType::MetaTypes => {
            let (content_type, body) =
                to_name_list(&snapshot.ontology().class_names(), query.format())?;
            Ok(Output::ok(content_type, body))
        }
        ReturnType::SparqlQuery => render_sparql(query, snapshot, options),
        _ => {
            let pool = select_pool(query, snapshot)?;
            render_pool(&pool, query, snapshot, options).await
        }
    }
}

/// Builds the pool a pool-returning query selects.
pub fn select_pool(query: &Query, snapshot: &Snapshot) -> Result<EntityPool> {
    match query.return_type() {
        ReturnType::All => EntityPool::all(snapshot),
        ReturnType::Individual(participants) => EntityPool::individuals(snapshot, participants),
        ReturnType::TypeCollection { types } => EntityPool::of_types(snapshot, types),
        ReturnType::NotFilteredTypeCollection { types, not } => EntityPool::of_types(
            snapshot, types,
        )?
        .without_property(
            snapshot,
            *not,
            query.search_passive(),
            query.search_indirect(),
        ),
        ReturnType::PropertyAny { property, value } => {
            EntityPool::with_property(snapshot, *property, value.as_deref())
        }
        ReturnType::PropertySubject {
            property,
            object,
            value,
        } => {
            if property.is_resource_valued() {
                EntityPool::active_participants(snapshot, object, *property)
            } else {
                EntityPool::with_property(snapshot, *property, value.as_deref())
            }
        }
        ReturnType::PropertyObject { subject, property } => {
            EntityPool::passive_participants(snapshot, subject, *property)
        }
        ReturnType::MetaTimestamp
        | ReturnType::MetaTypes
        | ReturnType::MetaNextId
        | ReturnType::SparqlQuery => Err(OxPointsError::bad_request(format!(
            "{:?} does not select entities",
            query.return_type()
        ))),
    }
}

async fn render_pool(
    pool: &EntityPool,
    query: &Query,
    snapshot: &Snapshot,
    options: OutputOptions<'_>,
) -> Result<Output> {
    let format = query.format();
    let callback = query.js_callback();
    let script_or_json = if callback.is_some() {
        TEXT_JAVASCRIPT
    } else {
        APPLICATION_JSON
    };
    match format {
        "kml" => Ok(Output::ok(
            KML_CONTENT_TYPE,
            to_kml(pool, snapshot, &MapOptions::from_query(query))?,
        )),
        "json" | "js" => Ok(Output::ok(
            script_or_json,
            to_json(pool, snapshot, query.json_depth(), callback)?,
        )),
        "gjson" => Ok(Output::ok(
            TEXT_JAVASCRIPT,
            to_geojson(pool, snapshot, &MapOptions::from_query(query), callback)?,
        )),
        "autosuggest" => Ok(Output::ok(
            script_or_json,
            to_autosuggest(pool, snapshot, callback)?,
        )),
        "txt" => Ok(Output::ok(TEXT_PLAIN, to_text(pool))),
        _ => {
            if let Some((rdf_format, content_type)) = rdf_format_for(format) {
                return Ok(Output::ok(content_type, to_rdf(pool, rdf_format)?));
            }
            let kml = to_kml(pool, snapshot, &MapOptions::from_query(query))?;
            let body = options.gpsbabel.convert(&kml, "kml", format).await?;
            Ok(Output::ok(converted_content_type(format), body))
        }
    }
}

fn render_sparql(query: &Query, snapshot: &Snapshot, options: OutputOptions<'_>) -> Result<Output> {
    let Some(sparql) = query.sparql_query().filter(|_| query.format() != "html") else {
        return endpoint_page(snapshot, query.sparql_query());
    };
    let format = if query.has_explicit_format() {
        results_format_for(query.format()).ok_or_else(|| {
            OxPointsError::bad_request(format!("Unexpected format {}", query.format()))
        })?
    } else {
        options.results_format.unwrap_or(QueryResultsFormat::Xml)
    };
    match evaluate(snapshot, sparql, format) {
        Err(OxPointsError::SparqlSyntax(error)) => Ok(Output {
            status: 400,
            content_type: TEXT_PLAIN.to_owned(),
            body: error.to_string(),
        }),
        other => other,
    }
}

fn converted_content_type(format: &str) -> &'static str {
    match format {
        "gpx" => "application/gpx+xml",
        "csv" | "unicsv" => "text/csv",
        _ => "application/octet-stream",
    }
}
