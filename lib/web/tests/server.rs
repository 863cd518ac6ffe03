#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use oxpoints::dataset::Dataset;
use oxpoints::io::RdfFormat;
use oxpoints_web::{create_router, AppState, ServerConfig};
use std::error::Error;
use std::sync::Arc;

const DATA: &str = include_str!("../../oxpoints/tests/data/oxpoints.ttl");

fn server_with(configure: impl FnOnce(&mut ServerConfig)) -> Result<TestServer, Box<dyn Error>> {
    let dataset = Dataset::new()?;
    dataset.load_from_reader(RdfFormat::Turtle, DATA.as_bytes())?;
    let mut config = ServerConfig::new(Arc::new(dataset));
    config.gpsbabel = "/nonexistent/gpsbabel".into();
    config.base_url = "http://oxpoints.test/".to_owned();
    configure(&mut config);
    let app = create_router(AppState::from_config(&config));
    Ok(TestServer::new(app)?)
}

fn server() -> Result<TestServer, Box<dyn Error>> {
    server_with(|_| {})
}

#[tokio::test]
async fn root_explains_the_missing_path() -> Result<(), Box<dyn Error>> {
    let response = server()?.get("/").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let page = response.text();
    assert!(page.contains("<h3>Expected path info</h3>"));
    assert!(page.contains("<h3>Invoked with http://oxpoints.test/</h3>"));
    Ok(())
}

#[tokio::test]
async fn type_collection_as_kml() -> Result<(), Box<dyn Error>> {
    let response = server()?.get("/type/College.kml").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header(header::CONTENT_TYPE),
        "application/vnd.google-earth.kml+xml"
    );
    assert!(response.text().contains("<Placemark id=\"23232373\">"));
    Ok(())
}

#[tokio::test]
async fn query_parameters_are_passed_on() -> Result<(), Box<dyn Error>> {
    let response = server()?
        .get("/type/Building.gjson")
        .add_query_param("jsCallback", "show")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().starts_with("show({"));
    Ok(())
}

#[tokio::test]
async fn unknown_parameter_is_anticipated() -> Result<(), Box<dyn Error>> {
    let response = server()?
        .get("/type/College.kml")
        .add_query_param("colour", "red")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let page = response.text();
    assert!(page.contains("Unrecognised parameter colour:red"));
    assert!(page.contains("<h3>query colour=red</h3>"));
    Ok(())
}

#[tokio::test]
async fn missing_entity_is_not_found() -> Result<(), Box<dyn Error>> {
    let response = server()?.get("/99999999.kml").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn encoded_paths_are_decoded() -> Result<(), Box<dyn Error>> {
    let response = server()?.get("/olis-aleph:BAL%20LIB.txt").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response
        .text()
        .starts_with("http://oxpoints.oucs.ox.ac.uk/id/23232373\n"));

    let response = server()?.get("/title/Room%20102.txt").await;
    assert!(response
        .text()
        .starts_with("http://oxpoints.oucs.ox.ac.uk/id/23233701\n"));
    Ok(())
}

#[tokio::test]
async fn sparql_results_follow_the_accept_header() -> Result<(), Box<dyn Error>> {
    let response = server()?
        .get("/sparql")
        .add_query_param("query", "SELECT ?s WHERE { ?s ?p ?o } LIMIT 1")
        .add_header(header::ACCEPT, HeaderValue::from_static("application/sparql-results+json"))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header(header::CONTENT_TYPE),
        "application/sparql-results+json"
    );
    Ok(())
}

#[tokio::test]
async fn upload_adds_entities() -> Result<(), Box<dyn Error>> {
    let server = server()?;
    let response = server
        .post("/data")
        .content_type("text/turtle")
        .bytes(Bytes::from_static(
            b"<http://oxpoints.oucs.ox.ac.uk/id/23239999> \
              <http://purl.org/dc/elements/1.1/title> \"Wolfson College\" .",
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(
        response.header(header::LOCATION),
        "http://oxpoints.test/id/23239999"
    );

    let response = server.get("/next").await;
    assert_eq!(response.text(), "23240000");
    Ok(())
}

#[tokio::test]
async fn upload_with_unknown_content_type() -> Result<(), Box<dyn Error>> {
    let response = server()?
        .post("/data")
        .content_type("application/x-unknown")
        .bytes(Bytes::from_static(b"data"))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    Ok(())
}

#[tokio::test]
async fn upload_with_invalid_data() -> Result<(), Box<dyn Error>> {
    let response = server()?
        .post("/data")
        .content_type("text/turtle")
        .bytes(Bytes::from_static(b"<not turtle"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn read_only_server_refuses_uploads() -> Result<(), Box<dyn Error>> {
    let server = server_with(|config| config.read_only = true)?;
    let response = server
        .put("/data")
        .content_type("application/x-unknown")
        .bytes(Bytes::from_static(b"data"))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    Ok(())
}
