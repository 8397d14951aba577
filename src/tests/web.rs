use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower::ServiceExt;

use super::support::{engine, hit, FakeStore};
use crate::config::Config;
use crate::search::SubIndex;
use crate::web::router;

fn app(store: Arc<FakeStore>) -> Router {
    let mut config = Config::default();
    config.search.sample_count = 4;
    router(Arc::new(RwLock::new(engine(store))), Arc::new(config))
}

fn seeded_store() -> Arc<FakeStore> {
    Arc::new(FakeStore::with_hits(
        SubIndex::Profiles,
        vec![
            hit("dev_001", 0.2, json!({"location": "서울", "seniority": "senior"})),
            hit("dev_002", 0.1, json!({"location": "부산", "seniority": "junior"})),
        ],
    ))
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_search() {
    let (status, body) = send_json(
        app(seeded_store()),
        form(
            "/api/search",
            "query=서울+시니어&search_type=profile_only&filter_mode=strict&limit=5",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["filter_mode"], "strict");
    assert_eq!(body["query"], "서울 시니어");
    assert_eq!(
        body["extracted_filters"],
        json!({"seniority": "senior", "location": "서울"})
    );
    assert_eq!(body["filter_info"], "경력 레벨: senior, 지역: 서울");

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["developer_id"], "dev_001");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_search_defaults_to_comprehensive() {
    let store = seeded_store();
    let (status, body) = send_json(app(store.clone()), form("/api/search", "query=개발자")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filter_mode"], "default");
    assert!(store.calls().contains(&"query skills 60".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_search_rejects_unknown_type() {
    let (status, body) = send_json(
        app(seeded_store()),
        form("/api/search", "query=서울&search_type=fuzzy"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("fuzzy"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_search_reports_store_failure() {
    let store = seeded_store();
    let app = app(store.clone());
    store.fail.store(true, Ordering::SeqCst);

    let (status, body) = send_json(app, form("/api/search", "query=서울")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("store unavailable"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_filter_ignores_blank_fields() {
    let (status, body) = send_json(
        app(seeded_store()),
        form("/api/filter", "seniority=&location=서울&limit=3"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filters"], json!({"location": "서울"}));
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["developer_id"], "dev_001");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_init_data_then_profile_page() {
    let store = Arc::new(FakeStore::default());
    let app = app(store);

    let (status, body) = send_json(app.clone(), form("/api/init-data", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["stats"]["profiles"], 4);
    assert!(body["message"].as_str().unwrap().starts_with("4명"));

    let (status, page) = send(app.clone(), get("/profile/dev_003")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("dev_003"));

    let (status, page) = send(app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("<td>4</td>"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_profile_is_not_found() {
    let (status, page) = send(app(seeded_store()), get("/profile/dev_404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(page.contains("개발자를 찾을 수 없습니다."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_static_pages() {
    let app = app(seeded_store());
    for uri in ["/", "/search", "/filter"] {
        let (status, page) = send(app.clone(), get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(page.starts_with("<!doctype html>"), "{uri}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_registered_pattern_is_used_by_search() {
    let store = Arc::new(FakeStore::with_hits(
        SubIndex::Profiles,
        vec![
            hit("dev_001", 0.1, json!({"location": "서울"})),
            hit("dev_002", 0.2, json!({"location": "제주"})),
        ],
    ));
    let app = app(store);

    let (status, body) = send_json(
        app.clone(),
        json_request(
            "/api/patterns",
            json!({"category": "location", "pattern": "제주", "value": "제주"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["triggers"], 10);

    let (_, body) = send_json(
        app,
        form("/api/search", "query=제주+개발자&search_type=profile_only&filter_mode=strict"),
    )
    .await;
    assert_eq!(body["extracted_filters"], json!({"location": "제주"}));
    assert_eq!(body["results"][0]["developer_id"], "dev_002");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_pattern_is_rejected() {
    let (status, body) = send_json(
        app(seeded_store()),
        json_request(
            "/api/patterns",
            json!({"category": "experience_years", "pattern": "(\\d+", "value": "min_years"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_forms_are_reported_as_json() {
    let app = app(seeded_store());

    for (uri, body) in [
        ("/api/search", "query=서울&limit=abc"),
        ("/api/search", "search_type=comprehensive"),
        ("/api/filter", "location=서울&limit=-1"),
    ] {
        let (status, body) = send_json(app.clone(), form(uri, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_query_names_the_field() {
    let (_, body) = send_json(app(seeded_store()), form("/api/search", "limit=3")).await;
    assert!(body["error"].as_str().unwrap().contains("query"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_pattern_category_is_rejected() {
    let app = app(seeded_store());

    let (status, body) = send_json(
        app.clone(),
        json_request(
            "/api/patterns",
            json!({"category": "hobbies", "pattern": "등산", "value": "등산"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("hobbies"));

    // not json at all
    let (status, body) = send_json(app, form("/api/patterns", "category=location")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_zero_limit_returns_one_result() {
    let store = seeded_store();
    let (status, body) = send_json(
        app(store.clone()),
        form("/api/search", "query=개발자&search_type=profile_only&limit=0"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert!(store.calls().contains(&"query profiles 3".to_string()));
}
