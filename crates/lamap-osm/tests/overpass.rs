//! Integration tests for `OverpassClient` using wiremock HTTP mocks.

use lamap_core::{builtin_zones, Category, Coordinate};
use lamap_osm::{OsmError, OverpassClient};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> OverpassClient {
    OverpassClient::with_base_url(30, "lamap-tests/0.1", base_url)
        .expect("client construction should not fail")
        .with_retry(0, 0)
}

fn downtown() -> lamap_core::Zone {
    builtin_zones()
        .into_iter()
        .find(|z| z.name == "Downtown LA")
        .expect("builtin zones include Downtown LA")
}

fn sample_elements() -> serde_json::Value {
    serde_json::json!({
        "version": 0.6,
        "elements": [
            {
                "type": "node",
                "id": 1,
                "lat": 34.0450,
                "lon": -118.2500,
                "tags": { "amenity": "restaurant", "name": "Grand Central Diner" }
            },
            {
                "type": "way",
                "id": 2,
                "center": { "lat": 34.0545, "lon": -118.2507 },
                "tags": { "tourism": "museum", "name": "The Broad" }
            },
            {
                "type": "node",
                "id": 3,
                "lat": 34.0510,
                "lon": -118.2450,
                "tags": { "amenity": "toilets" }
            },
            {
                "type": "node",
                "id": 4,
                "tags": { "amenity": "bar", "name": "No Coordinates" }
            }
        ]
    })
}

#[tokio::test]
async fn pois_in_zone_parses_and_groups_by_category() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("amenity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_elements()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let groups = client
        .pois_in_zone(&downtown(), &[], None)
        .await
        .expect("should parse POIs");

    assert_eq!(groups[&Category::Restaurants].len(), 1);
    assert_eq!(groups[&Category::Restaurants][0].name, "Grand Central Diner");
    assert_eq!(groups[&Category::Attractions].len(), 1);
    assert_eq!(groups[&Category::Attractions][0].name, "The Broad");
    assert_eq!(groups[&Category::Utilities].len(), 1);
    assert_eq!(groups[&Category::Utilities][0].name, "Unnamed (toilets)");
    // The coordinate-less bar is dropped, leaving the bars group empty.
    assert!(groups[&Category::Bars].is_empty());
}

#[tokio::test]
async fn pois_in_zone_annotates_distances_when_user_given() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_elements()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let user = Coordinate::new(34.0522, -118.2437);
    let groups = client
        .pois_in_zone(&downtown(), &[Category::Restaurants], Some(user))
        .await
        .expect("should parse POIs");

    let poi = &groups[&Category::Restaurants][0];
    let d = poi.distance_km.expect("distance should be annotated");
    assert!(d > 0.0 && d < 5.0, "implausible distance: {d}");
}

#[tokio::test]
async fn second_fetch_is_served_from_cache() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_elements()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let zone = downtown();
    let first = client.pois_in_zone(&zone, &[], None).await.expect("first fetch");
    let second = client.pois_in_zone(&zone, &[], None).await.expect("second fetch");
    assert_eq!(
        first[&Category::Restaurants].len(),
        second[&Category::Restaurants].len()
    );
    // The mock's expect(1) verifies on drop that only one request was made.
}

#[tokio::test]
async fn empty_results_are_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "elements": [] })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let zone = downtown();
    let groups = client.pois_in_zone(&zone, &[], None).await.expect("first fetch");
    assert!(groups.values().all(Vec::is_empty));
    // A second call must hit the server again.
    client.pois_in_zone(&zone, &[], None).await.expect("second fetch");
}

#[tokio::test]
async fn html_error_page_is_unexpected_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>rate limited</html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.pois_in_zone(&downtown(), &[], None).await;
    assert!(
        matches!(result, Err(OsmError::UnexpectedPayload { service: "Overpass", .. })),
        "expected UnexpectedPayload, got: {result:?}"
    );
}

#[tokio::test]
async fn server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_elements()))
        .mount(&server)
        .await;

    let client = OverpassClient::with_base_url(30, "lamap-tests/0.1", &server.uri())
        .expect("client construction should not fail")
        .with_retry(2, 0);

    let groups = client
        .pois_in_zone(&downtown(), &[], None)
        .await
        .expect("should succeed after retry");
    assert_eq!(groups[&Category::Restaurants].len(), 1);
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = OverpassClient::with_base_url(30, "lamap-tests/0.1", &server.uri())
        .expect("client construction should not fail")
        .with_retry(3, 0);

    let result = client.pois_in_zone(&downtown(), &[], None).await;
    assert!(matches!(result, Err(OsmError::Http(_))));
}
