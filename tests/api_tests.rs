//! HTTP API integration tests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use homekey::aggregator::Aggregator;
use homekey::api::{build_router, AppState};
use homekey::sources::SourceSet;
use homekey::store::{SnapshotStore, SqliteStore};
use homekey::summary::{SummaryGenerator, FALLBACK_MARKER};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const MAIN_ST: &str = "123%20Main%20St%2C%20Springfield%2C%20IL%2062701";

/// Router over instant simulated sources, optionally with an in-memory store.
async fn test_app(with_store: bool) -> Router {
    let store = if with_store {
        let store: Arc<dyn SnapshotStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
        Some(store)
    } else {
        None
    };

    let aggregator = Aggregator::new(SourceSet::simulated(false), store);
    let state = AppState::new(aggregator, SummaryGenerator::fallback_only(), true);
    build_router(state)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

#[tokio::test]
async fn test_property_lookup_returns_aggregated_record() {
    let app = test_app(false).await;

    let uri = format!("/api/property?address={}&summary=false", MAIN_ST);
    let (status, json) = get_json(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["property"]["address"], "123 Main St");
    assert_eq!(json["property"]["city"], "Springfield");
    assert_eq!(json["property"]["state"], "IL");
    assert_eq!(json["property"]["zipCode"], "62701");
    assert_eq!(json["basicInfo"]["bedrooms"], 3);
    assert_eq!(json["basicInfo"]["propertyType"], "Condo");
    assert_eq!(json["crime"]["crimeLevel"], "Low");
    assert_eq!(json["amenities"]["walkScore"], 40);
    assert!(json["dataQuality"]["missingDataSources"]
        .as_array()
        .unwrap()
        .is_empty());

    let overall = json["dataQuality"]["overallConfidence"].as_f64().unwrap();
    assert!((overall - (0.802 + 0.702 + 0.636 + 0.769) / 4.0).abs() < 1e-9);

    assert!(json.get("aiSummary").is_none());
    assert!(json["lastUpdated"].is_string());
}

#[tokio::test]
async fn test_property_lookup_includes_summary_by_default() {
    let app = test_app(false).await;

    let (status, json) = get_json(app, &format!("/api/property?address={}", MAIN_ST)).await;

    assert_eq!(status, StatusCode::OK);
    let summary = json["aiSummary"].as_str().unwrap();
    assert!(summary.starts_with(FALLBACK_MARKER));
    assert!(summary.contains("73%"));
}

#[tokio::test]
async fn test_property_with_every_source_missing() {
    let app = test_app(false).await;

    // "8 Elm St" samples 0.05, below every absence threshold
    let (status, json) = get_json(app, "/api/property?address=8%20Elm%20St&summary=false").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["property"]["city"], "Unknown City");
    assert_eq!(json["dataQuality"]["overallConfidence"], 0.0);
    assert_eq!(
        json["dataQuality"]["missingDataSources"],
        serde_json::json!([
            "Property Records",
            "School Ratings",
            "Crime Statistics",
            "Amenities Data"
        ])
    );
    assert!(json["basicInfo"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_address_is_bad_request() {
    for uri in ["/api/property", "/api/property?address=", "/api/property?address=%20%20"] {
        let app = test_app(false).await;
        let (status, json) = get_json(app, uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(json["error"], "Address parameter is required");
    }
}

#[tokio::test]
async fn test_history_unavailable_without_store() {
    let app = test_app(false).await;

    let (status, json) = get_json(app, "/api/property/history?address=123%20Main%20St").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "Snapshot history is unavailable");
}

#[tokio::test]
async fn test_history_lists_recorded_snapshots() {
    let app = test_app(true).await;

    for _ in 0..2 {
        let (status, _) = get_json(
            app.clone(),
            &format!("/api/property?address={}&summary=false", MAIN_ST),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) =
        get_json(app.clone(), "/api/property/history?address=123%20Main%20St").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["address"], "123 Main St");

    let snapshots = json["snapshots"].as_array().unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0]["bedrooms"], 3);
    assert_eq!(snapshots[0]["crimeLevel"], "Low");

    let (_, json) = get_json(app, "/api/property/history?address=123%20Main%20St&limit=1").await;
    assert_eq!(json["snapshots"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_requires_address() {
    let app = test_app(true).await;

    let (status, json) = get_json(app, "/api/property/history").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Address parameter is required");
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app(false).await;

    let (status, json) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "homekey");
    assert!(json["uptimeSeconds"].is_u64());
}

#[tokio::test]
async fn test_lookup_keys_sources_on_the_raw_address() {
    let raw = "123 Main St, Springfield, IL 62701 ";
    let direct = Aggregator::new(SourceSet::simulated(false), None)
        .aggregate(raw)
        .await;

    let app = test_app(false).await;
    let uri = format!("/api/property?address={}%20&summary=false", MAIN_ST);
    let (status, json) = get_json(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    // The trailing space moves the sample from 0.34 to 0.66
    assert_eq!(direct.basic_info.bedrooms, Some(5));
    assert_eq!(json["basicInfo"], serde_json::to_value(&direct.basic_info).unwrap());
    assert_eq!(json["schools"], serde_json::to_value(&direct.schools).unwrap());
    assert_eq!(json["crime"], serde_json::to_value(&direct.crime).unwrap());
    assert_eq!(json["amenities"], serde_json::to_value(&direct.amenities).unwrap());
    assert_eq!(
        json["dataQuality"],
        serde_json::to_value(&direct.data_quality).unwrap()
    );
}

#[tokio::test]
async fn test_malformed_query_parameters_return_json_errors() {
    let cases = [
        "/api/property?address=1%20Elm&summary=yes",
        "/api/property/history?address=1%20Elm&limit=lots",
    ];

    for uri in cases {
        let app = test_app(true).await;
        let (status, json) = get_json(app, uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()), "{}", uri);
    }
}

#[tokio::test]
async fn test_history_trims_the_street_address() {
    let app = test_app(true).await;

    let uri = format!("/api/property?address={}&summary=false", MAIN_ST);
    let (status, _) = get_json(app.clone(), &uri).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) =
        get_json(app, "/api/property/history?address=%20123%20Main%20St%20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["address"], "123 Main St");
    assert_eq!(json["snapshots"].as_array().unwrap().len(), 1);
}
