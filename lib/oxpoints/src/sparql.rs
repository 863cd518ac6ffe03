//! The SPARQL endpoint: an XHTML query form and the standard result serializations.

use crate::dataset::Snapshot;
use crate::error::{OxPointsError, Result};
use crate::output::Output;
use oxigraph::io::RdfFormat;
use oxigraph::sparql::results::QueryResultsFormat;
use oxigraph::sparql::{Query, QueryResults};
use quick_xml::escape::escape;

pub const XHTML_CONTENT_TYPE: &str = "application/xhtml+xml";

const SAMPLE_QUERY: &str = "PREFIX oxp: <http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#>
PREFIX foaf: <http://xmlns.com/foaf/0.1/>
PREFIX dc: <http://purl.org/dc/elements/1.1/>

SELECT ?title ?homepage WHERE {
    ?college a oxp:College ;
             dc:title ?title ;
             foaf:homepage ?homepage
} LIMIT 10
";

/// The results serialization selected by a request extension.
pub fn results_format_for(extension: &str) -> Option<QueryResultsFormat> {
    match extension {
        "xml" => Some(QueryResultsFormat::Xml),
        "json" => Some(QueryResultsFormat::Json),
        "csv" => Some(QueryResultsFormat::Csv),
        "tsv" => Some(QueryResultsFormat::Tsv),
        _ => None,
    }
}

/// Evaluates the query. Graph results are written as RDF/XML whatever the requested format.
pub fn evaluate(snapshot: &Snapshot, query: &str, format: QueryResultsFormat) -> Result<Output> {
    let query = Query::parse(query, None)?;
    let results = snapshot.store().query(query)?;
    if let QueryResults::Graph(_) = results {
        let body = results.write_graph(Vec::new(), RdfFormat::RdfXml)?;
        return Ok(Output::ok(
            RdfFormat::RdfXml.media_type(),
            String::from_utf8_lossy(&body).into_owned(),
        ));
    }
    let body = results.write(Vec::new(), format)?;
    Ok(Output::ok(
        format.media_type(),
        String::from_utf8_lossy(&body).into_owned(),
    ))
}

/// The endpoint page, with the query form and the results of `query` when one is given.
pub fn endpoint_page(snapshot: &Snapshot, query: Option<&str>) -> Result<Output> {
    let mut status = 200;
    let mut page = String::from(concat!(
        "<?xml version=\"1.0\"?>\n",
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" ",
        "\"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">\n",
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" xml:lang=\"en\">\n",
        "  <head>\n    <title>OxPoints SPARQL Endpoint</title>\n  </head>\n",
        "  <body>\n    <h1>OxPoints SPARQL Endpoint</h1>\n",
    ));

    if let Some(query) = query {
        let results = match evaluate(snapshot, query, QueryResultsFormat::Xml) {
            Ok(output) => output.body,
            Err(OxPointsError::SparqlSyntax(error)) => {
                status = 400;
                format!("ERROR: {error}")
            }
            Err(error) => return Err(error),
        };
        page.push_str("    <h2>Results</h2>\n");
        page.push_str(concat!(
            "    <div class=\"results\" style=\"border:1px solid #888; padding:5px; ",
            "font-size:10pt; max-height:400px; overflow:auto;\"><pre style=\"margin:0;\">",
        ));
        page.push_str(&escape(results.as_str()));
        page.push_str("</pre></div>\n");
    }

    page.push_str("    <h2>Query</h2>\n");
    page.push_str("    <form method=\"GET\" action=\"sparql.html\">\n");
    page.push_str("      <textarea name=\"query\" rows=\"10\" cols=\"80\">");
    page.push_str(&escape(query.unwrap_or(SAMPLE_QUERY)));
    page.push_str("</textarea>\n");
    page.push_str("      <p><input type=\"submit\"/></p>\n");
    page.push_str("    </form>\n  </body>\n</html>\n");

    Ok(Output {
        status,
        content_type: XHTML_CONTENT_TYPE.to_owned(),
        body: page,
    })
}
