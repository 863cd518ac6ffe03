#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use oxpoints::dataset::{Dataset, Snapshot};
use oxpoints::gpsbabel::GpsBabel;
use oxpoints::io::RdfFormat;
use oxpoints::output::{render, Output, OutputOptions};
use oxpoints::query::Query;
use oxpoints::results::QueryResultsFormat;
use serde_json::Value;
use std::error::Error;

const DATA: &str = include_str!("data/oxpoints.ttl");

fn snapshot() -> Result<Snapshot, Box<dyn Error>> {
    let dataset = Dataset::new()?;
    dataset.load_from_reader(RdfFormat::Turtle, DATA.as_bytes())?;
    Ok(dataset.snapshot(None))
}

async fn get(path: &str, params: &[(&str, &str)]) -> Result<Output, Box<dyn Error>> {
    get_with(path, params, None).await
}

async fn get_with(
    path: &str,
    params: &[(&str, &str)],
    results_format: Option<QueryResultsFormat>,
) -> Result<Output, Box<dyn Error>> {
    let snapshot = snapshot()?;
    let params = params
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect::<Vec<_>>();
    let query = Query::from_request(Some(path), &params, snapshot.ontology())?;
    let gpsbabel = GpsBabel::new("/nonexistent/gpsbabel");
    let options = OutputOptions {
        gpsbabel: &gpsbabel,
        results_format,
    };
    Ok(render(&query, &snapshot, options).await?)
}

#[tokio::test]
async fn kml_placemarks() -> Result<(), Box<dyn Error>> {
    let output = get("/type/College.kml", &[]).await?;
    assert_eq!(output.content_type, "application/vnd.google-earth.kml+xml");
    assert!(output.body.contains("<kml xmlns=\"http://www.opengis.net/kml/2.2\">"));
    assert!(output.body.contains("<Placemark id=\"23232373\">"));
    assert!(output.body.contains("<name>Balliol College</name>"));
    assert!(output.body.contains("<coordinates>-1.2579,51.7548</coordinates>"));
    Ok(())
}

#[tokio::test]
async fn kml_parent_names() -> Result<(), Box<dyn Error>> {
    let output = get("/23233537.kml", &[]).await?;
    assert!(output
        .body
        .contains("<name>Balliol Library, Balliol College</name>"));

    let output = get("/23233537.kml", &[("parentName", "false")]).await?;
    assert!(output.body.contains("<name>Balliol Library</name>"));
    Ok(())
}

#[tokio::test]
async fn kml_folders() -> Result<(), Box<dyn Error>> {
    let output = get(
        "/type/College|Library.kml",
        &[("arc", "isPartOf"), ("parentName", "false")],
    )
    .await?;
    let folder = output.body.find("<Folder id=\"23232373\">").unwrap();
    let library = output.body.find("<Placemark id=\"23233537\">").unwrap();
    let folder_end = output.body.find("</Folder>").unwrap();
    assert!(folder < library && library < folder_end);
    assert_eq!(output.body.matches("<Placemark id=\"23233537\">").count(), 1);
    Ok(())
}

#[tokio::test]
async fn geojson_features() -> Result<(), Box<dyn Error>> {
    let output = get("/type/Building.gjson", &[]).await?;
    assert_eq!(output.content_type, "text/javascript");
    let collection: Value = serde_json::from_str(&output.body)?;
    assert_eq!(collection["type"], "FeatureCollection");
    let features = collection["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["properties"]["name"], "Balliol College");
    assert_eq!(
        features[0]["geometry"]["coordinates"],
        serde_json::json!([-1.2579, 51.7548])
    );
    Ok(())
}

#[tokio::test]
async fn geojson_with_callback() -> Result<(), Box<dyn Error>> {
    let output = get("/type/Building.gjson", &[("jsCallback", "show")]).await?;
    assert!(output.body.starts_with("show({"));
    assert!(output.body.ends_with(");"));
    Ok(())
}

#[tokio::test]
async fn geojson_order_by() -> Result<(), Box<dyn Error>> {
    let feature_ids = |body: &str| -> Result<Vec<String>, Box<dyn Error>> {
        let collection: Value = serde_json::from_str(body)?;
        Ok(collection["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["properties"]["id"].as_str().unwrap().to_owned())
            .collect())
    };

    let output = get("/type/Building.gjson", &[("orderBy", "title")]).await?;
    assert_eq!(feature_ids(&output.body)?, ["23233600", "23233536"]);

    let output = get(
        "/type/College|Building.gjson",
        &[("orderBy", "hasOUCSCode"), ("parentName", "false")],
    )
    .await?;
    let ids = feature_ids(&output.body)?;
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], "23232373");
    Ok(())
}

#[tokio::test]
async fn json_nesting() -> Result<(), Box<dyn Error>> {
    let output = get("/23232373.json", &[]).await?;
    assert_eq!(output.content_type, "application/json");
    let entities: Value = serde_json::from_str(&output.body)?;
    assert_eq!(entities[0]["type"], "College");
    assert_eq!(entities[0]["title"], "Balliol College");
    assert_eq!(
        entities[0]["occupies"],
        "http://oxpoints.oucs.ox.ac.uk/id/23233536"
    );

    let output = get("/23232373.json", &[("jsonNesting", "2")]).await?;
    let entities: Value = serde_json::from_str(&output.body)?;
    assert_eq!(entities[0]["occupies"]["title"], "Balliol College");
    assert_eq!(entities[0]["occupies"]["type"], "Building");
    Ok(())
}

#[tokio::test]
async fn js_uses_the_default_callback() -> Result<(), Box<dyn Error>> {
    let output = get("/23232373.js", &[]).await?;
    assert_eq!(output.content_type, "text/javascript");
    assert!(output.body.starts_with("oxpoints([{"));
    Ok(())
}

#[tokio::test]
async fn autosuggest_prefers_places_over_their_occupants() -> Result<(), Box<dyn Error>> {
    let output = get("/type/College|Building.autosuggest", &[]).await?;
    let suggestions: Value = serde_json::from_str(&output.body)?;
    let items = suggestions["items"].as_array().unwrap();
    let ids = items
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(ids, ["23233536", "23233600"]);
    assert_eq!(items[1]["altNames"], "OUCS Building\tBanbury Road 13");
    Ok(())
}

#[tokio::test]
async fn autosuggest_with_callback() -> Result<(), Box<dyn Error>> {
    let output = get("/type/Building.autosuggest", &[("jsCallback", "cb")]).await?;
    assert_eq!(output.content_type, "text/javascript");
    assert!(output.body.starts_with("cb({\"items\":"));
    assert!(output.body.trim_end().ends_with(");"));
    Ok(())
}

#[tokio::test]
async fn rdf_serializations() -> Result<(), Box<dyn Error>> {
    let output = get("/23232373.ttl", &[]).await?;
    assert_eq!(output.content_type, "text/turtle");
    assert!(output.body.contains("\"Balliol College\""));

    let output = get("/23232373", &[]).await?;
    assert_eq!(output.content_type, "application/rdf+xml");

    let output = get("/23232373.nt", &[]).await?;
    assert_eq!(output.content_type, "text/plain");
    assert!(output.body.contains(
        "<http://oxpoints.oucs.ox.ac.uk/id/23232373> <http://purl.org/dc/elements/1.1/title> \"Balliol College\" ."
    ));
    Ok(())
}

#[tokio::test]
async fn text_listing() -> Result<(), Box<dyn Error>> {
    let output = get("/23233700.txt", &[]).await?;
    assert!(output
        .body
        .starts_with("http://oxpoints.oucs.ox.ac.uk/id/23233700\n"));
    assert!(output
        .body
        .contains("  http://purl.org/dc/elements/1.1/title : Room 101\n"));
    Ok(())
}

#[tokio::test]
async fn meta_queries() -> Result<(), Box<dyn Error>> {
    assert_eq!(get("/next", &[]).await?.body, "23233702");

    let types = get("/types.txt", &[]).await?.body;
    assert!(types.ends_with('\n'));
    assert!(types.split('|').any(|t| t == "Observatory"));
    assert!(types.split('|').any(|t| t == "College"));

    let timestamp = get("/timestamp", &[]).await?.body;
    assert!(timestamp.parse::<i128>()? > 0);
    Ok(())
}

#[tokio::test]
async fn code_paths() -> Result<(), Box<dyn Error>> {
    let output = get("/oucs:oucs/primaryPlace.txt", &[]).await?;
    assert!(output
        .body
        .starts_with("http://oxpoints.oucs.ox.ac.uk/id/23233600\n"));

    let output = get("/primaryPlace/23233600.txt", &[]).await?;
    assert!(output
        .body
        .starts_with("http://oxpoints.oucs.ox.ac.uk/id/23232400\n"));

    let output = get("/olis-aleph:BAL%20LIB.txt", &[]).await?;
    assert!(output
        .body
        .starts_with("http://oxpoints.oucs.ox.ac.uk/id/23232373\n"));
    Ok(())
}

#[tokio::test]
async fn not_filter() -> Result<(), Box<dyn Error>> {
    let output = get(
        "/type/Department|Unit.txt",
        &[("not", "primaryPlace"), ("indirect", "true")],
    )
    .await?;
    assert!(output.body.is_empty());

    let output = get("/type/Department|Unit.txt", &[("not", "primaryPlace")]).await?;
    assert!(output
        .body
        .starts_with("http://oxpoints.oucs.ox.ac.uk/id/23232401\n"));
    Ok(())
}

#[tokio::test]
async fn sparql_results() -> Result<(), Box<dyn Error>> {
    let query = "SELECT ?s WHERE { ?s a <http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#Room> }";
    let output = get("/sparql.json", &[("query", query)]).await?;
    assert_eq!(output.content_type, "application/sparql-results+json");
    let results: Value = serde_json::from_str(&output.body)?;
    assert_eq!(results["results"]["bindings"].as_array().unwrap().len(), 2);

    let output = get("/sparql", &[("query", query)]).await?;
    assert_eq!(output.content_type, "application/sparql-results+xml");

    let output = get_with("/sparql", &[("query", query)], Some(QueryResultsFormat::Csv)).await?;
    assert_eq!(output.content_type, "text/csv");
    assert!(output.body.starts_with("s\r\n"));
    Ok(())
}

#[tokio::test]
async fn sparql_graph_results_are_rdf_xml() -> Result<(), Box<dyn Error>> {
    let query = "CONSTRUCT { ?s ?p ?o } WHERE { ?s a <http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#Room> ; ?p ?o }";
    let output = get("/sparql.json", &[("query", query)]).await?;
    assert_eq!(output.status, 200);
    assert_eq!(output.content_type, "application/rdf+xml");
    assert!(output.body.contains("rdf:RDF"));
    assert!(output.body.contains("Room 101"));

    let query = "DESCRIBE <http://oxpoints.oucs.ox.ac.uk/id/23233536>";
    let output = get("/sparql", &[("query", query)]).await?;
    assert_eq!(output.content_type, "application/rdf+xml");
    assert!(output.body.contains("Balliol College"));
    Ok(())
}

#[tokio::test]
async fn sparql_syntax_error() -> Result<(), Box<dyn Error>> {
    let output = get("/sparql.json", &[("query", "SELEKT")]).await?;
    assert_eq!(output.status, 400);
    assert_eq!(output.content_type, "text/plain");

    let output = get("/sparql.html", &[("query", "SELEKT")]).await?;
    assert_eq!(output.status, 400);
    assert!(output.body.contains("ERROR: "));
    Ok(())
}

#[tokio::test]
async fn sparql_endpoint_page() -> Result<(), Box<dyn Error>> {
    let output = get("/sparql", &[]).await?;
    assert_eq!(output.status, 200);
    assert_eq!(output.content_type, "application/xhtml+xml");
    assert!(output.body.contains("<title>OxPoints SPARQL Endpoint</title>"));
    assert!(output
        .body
        .contains("PREFIX oxp: &lt;http://ns.ox.ac.uk/namespace/oxpoints/2009/02/owl#&gt;"));

    let output = get(
        "/sparql.html",
        &[("query", "SELECT ?t WHERE { ?s <http://purl.org/dc/elements/1.1/title> ?t }")],
    )
    .await?;
    assert!(output.body.contains("<h2>Results</h2>"));
    assert!(output.body.contains("Balliol Library"));
    Ok(())
}

#[tokio::test]
async fn other_formats_need_gpsbabel() -> Result<(), Box<dyn Error>> {
    let error = get("/type/College.gpx", &[]).await.unwrap_err();
    let error = error
        .downcast_ref::<oxpoints::error::OxPointsError>()
        .unwrap();
    assert_eq!(error.status(), 501);
    Ok(())
}
