use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with, Db, Record};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

/// A store pre-filled with posts `Id` 1..=4.
async fn seeded() -> Db {
    let db = Db::default();
    {
        let mut store = db.write().await;
        for (title, author) in [("d", "ann"), ("b", "bob"), ("a", "ann"), ("c", "cy")] {
            store.insert("posts", record(json!({"Title": title, "Author": author})));
        }
    }
    db
}

async fn list_values(db: &Db, uri: &str) -> Vec<Value> {
    let resp = app_with(db.clone()).oneshot(get(uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    body["value"].as_array().unwrap().clone()
}

// --- list ---

#[tokio::test]
async fn list_unknown_resource_is_an_empty_envelope() {
    let resp = app().oneshot(get("/posts")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body, json!({"value": []}));
}

#[tokio::test]
async fn list_sorts_and_windows() {
    let db = seeded().await;
    let titles: Vec<Value> = list_values(&db, "/posts?_sort=Title&_order=ASC&_start=1&_end=3")
        .await
        .into_iter()
        .map(|r| r["Title"].clone())
        .collect();
    assert_eq!(titles, vec![json!("b"), json!("c")]);
}

#[tokio::test]
async fn list_sorts_descending() {
    let db = seeded().await;
    let records = list_values(&db, "/posts?_sort=Id&_order=DESC&_start=0&_end=2").await;
    assert_eq!(records[0]["Id"], 4);
    assert_eq!(records[1]["Id"], 3);
}

#[tokio::test]
async fn list_applies_flat_equality_filters() {
    let db = seeded().await;
    let records = list_values(&db, "/posts?Author=ann&_sort=Title&_order=ASC").await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["Title"], "a");
}

#[tokio::test]
async fn list_applies_odata_filter() {
    let db = seeded().await;
    let records = list_values(&db, "/posts?$filter=Id%20in%20(4,%202)").await;
    let ids: Vec<Value> = records.iter().map(|r| r["Id"].clone()).collect();
    assert_eq!(ids, vec![json!(2), json!(4)]);
}

#[tokio::test]
async fn list_odata_clauses_are_or_joined() {
    let db = seeded().await;
    let records = list_values(&db, "/posts?$filter=Id%20in%20(1)%20or%20Author%20in%20(%27cy%27)").await;
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn list_malformed_filter_returns_400() {
    let resp = app().oneshot(get("/posts?$filter=Id%20eq%201")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- create ---

#[tokio::test]
async fn create_assigns_backend_id() {
    let resp = app()
        .oneshot(json_request("POST", "/posts", r#"{"Title":"Hello"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = body_json(resp).await;
    assert_eq!(created, json!({"Title": "Hello", "Id": 1}));
}

#[tokio::test]
async fn create_malformed_json_returns_4xx() {
    let resp = app()
        .oneshot(json_request("POST", "/posts", r#"[1, 2]"#))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
}

// --- get ---

#[tokio::test]
async fn get_returns_bare_record() {
    let db = seeded().await;
    let resp = app_with(db).oneshot(get("/posts/2")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let post: Value = body_json(resp).await;
    assert_eq!(post, json!({"Title": "b", "Author": "bob", "Id": 2}));
}

#[tokio::test]
async fn get_not_found() {
    let resp = app().oneshot(get("/posts/9")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_non_numeric_id_returns_400() {
    let resp = app().oneshot(get("/posts/not-a-number")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- update ---

#[tokio::test]
async fn update_merges_and_returns_no_body() {
    let db = seeded().await;
    let resp = app_with(db.clone())
        .oneshot(json_request("PUT", "/posts/1", r#"{"Title":"edited","Id":99}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = app_with(db).oneshot(get("/posts/1")).await.unwrap();
    let post: Value = body_json(resp).await;
    assert_eq!(post["Title"], "edited");
    assert_eq!(post["Id"], 1);
}

#[tokio::test]
async fn update_rejects_primary_key_in_body() {
    let db = seeded().await;
    let resp = app_with(db)
        .oneshot(json_request("PUT", "/posts/1", r#"{"id":1,"Title":"x"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_not_found() {
    let resp = app()
        .oneshot(json_request("PUT", "/posts/1", r#"{"Title":"Nope"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- delete ---

#[tokio::test]
async fn delete_removes_record() {
    let db = seeded().await;
    let resp = app_with(db.clone())
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/posts/3")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(list_values(&db, "/posts").await.len(), 3);
}

#[tokio::test]
async fn delete_not_found() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/posts/1")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
