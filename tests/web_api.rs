//! HTTP surface tests, driven in-process through the router.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use smoke_watch::web;

use smoke_watch::AirQualityOrchestrator;

use common::{FixedPollution, TableGeocoder, london_orchestrator, london_pollutants, paris, tokyo};

async fn call(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn search_request(city: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "city": city }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_search_returns_report() {
    let (orchestrator, _, _) = london_orchestrator();
    let app = web::router(Arc::new(orchestrator), None);

    let (status, body) = call(app, search_request("London")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["category_label"], "Moderate");
    assert_eq!(body["report"]["color"], "moderate");
    assert_eq!(body["report"]["cigarettes"], 0.8);
    assert_eq!(body["report"]["location"]["country"], "GB");
    assert_eq!(body["flags"]["not_found"], false);
    assert!(body["notice"].is_null());
}

#[tokio::test]
async fn test_state_reflects_last_search() {
    let (orchestrator, _, _) = london_orchestrator();
    let orchestrator = Arc::new(orchestrator);

    let (_, _) = call(
        web::router(orchestrator.clone(), None),
        search_request("Nowhere"),
    )
    .await;

    let request = Request::builder()
        .uri("/api/state")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(web::router(orchestrator, None), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "Nowhere");
    assert_eq!(body["flags"]["not_found"], true);
    assert_eq!(body["notice"], "City \"Nowhere\" not found");
    assert!(body["report"].is_null());
}

#[tokio::test]
async fn test_blank_search_changes_nothing() {
    let (orchestrator, geocoder, _) = london_orchestrator();
    let app = web::router(Arc::new(orchestrator), None);

    let (status, body) = call(app, search_request("   ")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["query"].is_null());
    assert_eq!(body["loading"], false);
    assert_eq!(geocoder.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_searches_each_get_their_own_answer() {
    let geocoder = Arc::new(
        TableGeocoder::default()
            .with("Paris", paris())
            .with("Tokyo", tokyo())
            .slow("Paris", Duration::from_millis(50)),
    );
    let pollution = Arc::new(FixedPollution::new(2, london_pollutants()));
    let orchestrator = Arc::new(AirQualityOrchestrator::new(geocoder, pollution));

    let ((_, paris_body), (_, tokyo_body)) = tokio::join!(
        call(web::router(orchestrator.clone(), None), search_request("Paris")),
        async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            call(web::router(orchestrator.clone(), None), search_request("Tokyo")).await
        }
    );

    assert_eq!(paris_body["query"], "Paris");
    assert_eq!(paris_body["superseded"], true);
    assert!(paris_body["report"].is_null());

    assert_eq!(tokyo_body["query"], "Tokyo");
    assert_eq!(tokyo_body["superseded"], false);
    assert_eq!(tokyo_body["report"]["location"]["name"], "Tokyo");
    assert_eq!(tokyo_body["report"]["display_name"], "Tokyo, JP");
}
