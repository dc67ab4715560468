use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use book_catalog::{app, AppConfig, AppState, Models};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> Router {
    app(AppState::new(Models::in_memory(), AppConfig::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn dune() -> Value {
    json!({
        "title": "Dune",
        "author": "Frank Herbert",
        "year": 1965,
        "genres": ["sci-fi", "classic"],
        "released_at": 1965
    })
}

#[tokio::test]
async fn healthcheck_reports_available() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/v1/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "available");
    assert_eq!(body["environment"], "development");
}

#[tokio::test]
async fn create_then_show() {
    let app = test_app();
    let (status, body) = send(&app, Method::POST, "/v1/books", Some(dune())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["version"], 1);

    let (status, body) = send(&app, Method::GET, "/v1/books/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Dune");
    assert!(body["data"].get("created_at").is_none());
    assert!(body.get("meta").is_none());
}

#[tokio::test]
async fn invalid_book_is_unprocessable() {
    let app = test_app();
    let (status, body) = send(&app, Method::POST, "/v1/books", Some(json!({ "title": "Dune" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"]["author"], "must be provided");
    assert_eq!(body["error"]["details"]["genres"], "must be provided");
}

#[tokio::test]
async fn malformed_json_body_uses_error_envelope() {
    let app = test_app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/v1/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    send(&app, Method::POST, "/v1/books", Some(dune())).await;
    let (status, body) = send(&app, Method::PATCH, "/v1/books/1", Some(json!({ "year": "soon" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn unknown_or_malformed_ids_are_not_found() {
    let app = test_app();
    for uri in ["/v1/books/42", "/v1/books/0", "/v1/books/abc"] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"]["code"], "not_found");
    }
}

#[tokio::test]
async fn patch_with_stale_version_conflicts() {
    let app = test_app();
    send(&app, Method::POST, "/v1/books", Some(dune())).await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/v1/books/1",
        Some(json!({ "title": "Dune Messiah", "year": 1969, "version": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Dune Messiah");
    assert_eq!(body["data"]["version"], 2);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/v1/books/1",
        Some(json!({ "title": "Children of Dune", "version": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "edit_conflict");
}

#[tokio::test]
async fn delete_then_delete_again() {
    let app = test_app();
    send(&app, Method::POST, "/v1/books", Some(dune())).await;

    let (status, body) = send(&app, Method::DELETE, "/v1/books/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "book successfully deleted");

    let (status, _) = send(&app, Method::DELETE, "/v1/books/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_and_reports_metadata() {
    let app = test_app();
    send(&app, Method::POST, "/v1/books", Some(dune())).await;
    send(
        &app,
        Method::POST,
        "/v1/books",
        Some(json!({
            "title": "Emma",
            "author": "Jane Austen",
            "year": 1815,
            "genres": ["romance", "classic"],
            "released_at": 1815
        })),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/v1/books?genres=classic&sort=-year&page_size=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["title"], "Dune");
    assert_eq!(body["meta"]["total_records"], 2);
    assert_eq!(body["meta"]["last_page"], 2);

    let (status, body) = send(&app, Method::GET, "/v1/books?title=%20%20", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total_records"], 2);
}

#[tokio::test]
async fn list_rejects_bad_query_parameters() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/v1/books?sort=price", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"]["sort"], "invalid sort value");

    let (status, body) = send(&app, Method::GET, "/v1/books?page=two", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"]["page"], "must be an integer value");
}
