use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use hosted_apps::{
    app_router, schema, AddressMatcher, AppState, ChangeNotifier, HostedAppsProvider,
    SqliteStorage,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const BASE_PATH: &str = "hosted_apps";

async fn router() -> Router {
    let storage = SqliteStorage::in_memory().await.unwrap();
    schema::open(&storage).await.unwrap();
    let provider = HostedAppsProvider::new(
        Arc::new(storage),
        AddressMatcher::new("com.jamdeo.tv.provider.hostedapps", BASE_PATH),
        ChangeNotifier::new(16),
    );
    app_router(AppState::new(provider), BASE_PATH)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn seed(app: &Router) -> Vec<i64> {
    let mut ids = Vec::new();
    for i in 0..5 {
        let (status, body) = send(
            app,
            Method::POST,
            "/hosted_apps",
            Some(json!({
                "name": format!("App{i}"),
                "package": format!("com.hisense.app.{i}"),
                "vendor": "hisense",
                "description": format!("This is app {i}"),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["data"]["id"].as_i64().unwrap());
    }
    ids
}

#[tokio::test]
async fn health_and_ready_report_ok() {
    let app = router().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn create_returns_item_address_and_read_returns_the_row() {
    let app = router().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/hosted_apps",
        Some(json!({"name": "App0", "package": "com.hisense.app.0", "vendor": "hisense", "description": "d"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(
        body["data"]["address"],
        format!("content://com.jamdeo.tv.provider.hostedapps/hosted_apps/{id}")
    );

    let (status, body) = send(&app, Method::GET, &format!("/hosted_apps/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "App0");
    assert_eq!(body["data"]["id"], id);
}

#[tokio::test]
async fn list_applies_fields_sort_and_filters() {
    let app = router().await;
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/hosted_apps", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], 5);
    assert_eq!(body["meta"]["content_type"], "vnd.hosted-apps.dir/hosted_apps");

    let (status, body) = send(&app, Method::GET, "/hosted_apps?fields=name&sort=name%20DESC", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0], json!({"name": "App4"}));

    let (status, body) = send(&app, Method::GET, "/hosted_apps?package=com.hisense.app.2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], 1);
    assert_eq!(body["data"][0]["name"], "App2");
}

#[tokio::test]
async fn bad_requests_map_to_client_errors() {
    let app = router().await;
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/hosted_apps?fields=name,bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "unknown_column");

    let (status, _) = send(&app, Method::GET, "/hosted_apps?color=red", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/hosted_apps?sort=name;drop", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_sort_order");

    let (status, body) = send(&app, Method::GET, "/hosted_apps/abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "unknown_address");
    assert_eq!(
        body["error"]["details"]["address"],
        "content://com.jamdeo.tv.provider.hostedapps/hosted_apps/abc"
    );

    let (status, body) = send(&app, Method::GET, "/hosted_apps/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, body) = send(&app, Method::PATCH, "/hosted_apps/1", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");

    let (status, body) = send(&app, Method::GET, "/hosted_apps?fields=name,name", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");

    let (status, body) = send(&app, Method::POST, "/hosted_apps", Some(json!({"name": "only"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn update_and_delete_report_affected_counts() {
    let app = router().await;
    let ids = seed(&app).await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/hosted_apps/{}", ids[0]),
        Some(json!({"vendor": "jamdeo"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated"], 1);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/hosted_apps?vendor=hisense",
        Some(json!({"description": "bulk"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated"], 4);

    let (status, body) = send(&app, Method::DELETE, "/hosted_apps?vendor=jamdeo", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);

    let (status, body) = send(&app, Method::DELETE, &format!("/hosted_apps/{}", ids[0]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 0);

    let (_, body) = send(&app, Method::GET, "/hosted_apps", None).await;
    assert_eq!(body["meta"]["count"], 4);
}
