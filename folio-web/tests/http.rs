use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderValue, Request};
use bytes::Bytes;
use folio_blob::{BlobConfig, BlobError, BlobResult, BlobStore, MemoryBlobStore, PutResult};
use folio_core::{to_row, FolioConfig, MemoryDataStore, PROJECT_IMAGES};
use folio_web::{FolioApp, FolioState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "folio-test-boundary";

fn app_with(state: FolioState) -> FolioApp {
    FolioApp::new(state, FolioConfig::with_defaults().snapshot())
}

fn app() -> FolioApp {
    app_with(FolioState::in_memory())
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &FolioApp, req: Request<Body>) -> axum::response::Response {
    app.router.clone().oneshot(req).await.unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

/// `parts`: (field name, file name, content)
fn multipart(uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(f) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: image/png\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(data.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn create(app: &FolioApp, slug: &str, category: &str) -> Value {
    let res = send(
        app,
        json_request(
            "POST",
            "/projects",
            json!({"title": "Site", "description": "About", "slug": slug, "category": category}),
        ),
    )
    .await;
    assert_eq!(res.status().as_u16(), 200);
    json_body(res).await
}

async fn seed_images(state: &FolioState, project_id: i64, images: &[(i64, i64)]) {
    let rows = images
        .iter()
        .map(|(id, order)| {
            to_row(&json!({
                "id": id, "project_id": project_id, "image_url": "u", "caption": null, "order": order
            }))
            .unwrap()
        })
        .collect();
    state.store.insert(PROJECT_IMAGES, rows).await.unwrap();
}

fn ids(images: &Value) -> Vec<i64> {
    images
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_ok() {
    let app = app();
    let res = send(&app, get("/health")).await;

    assert_eq!(res.status().as_u16(), 200);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "ok");
}

#[tokio::test]
async fn create_project_defaults_category_and_sets_request_id() {
    let app = app();
    let res = send(
        &app,
        json_request(
            "POST",
            "/projects",
            json!({"title": "Hello", "description": "x", "slug": "hello", "image_url": ""}),
        ),
    )
    .await;

    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());

    let body = json_body(res).await;
    assert_eq!(body["slug"], "hello");
    assert_eq!(body["category"], "portfolio");
    assert!(body["image_url"].is_null());
    assert!(body["id"].as_i64().is_some());
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let app = app();
    let provided = HeaderValue::from_static("req-test-123");
    let req = Request::builder()
        .method("GET")
        .uri("/projects")
        .header("x-request-id", provided.clone())
        .body(Body::empty())
        .unwrap();

    let res = send(&app, req).await;
    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn create_missing_fields_is_422_with_field_errors() {
    let app = app();
    let res = send(
        &app,
        json_request(
            "POST",
            "/projects",
            json!({"title": " ", "description": "x", "slug": "s", "image_url": "not a url"}),
        ),
    )
    .await;

    assert_eq!(res.status().as_u16(), 422);
    let body = json_body(res).await;
    assert_eq!(body["name"], "Unprocessable");
    assert_eq!(body["className"], "unprocessable");
    assert!(body["errors"]["title"].is_array());
    assert!(body["errors"]["image_url"].is_array());
    assert!(body["errors"].get("slug").is_none());
}

#[tokio::test]
async fn malformed_json_is_400_bad_request() {
    let app = app();
    let req = Request::builder()
        .method("POST")
        .uri("/projects")
        .header("content-type", "application/json")
        .body(Body::from("{\"title\":\"x\""))
        .unwrap();

    let res = send(&app, req).await;
    assert_eq!(res.status().as_u16(), 400);
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
    assert_eq!(body["code"], 400);
    assert!(body["errors"]["_schema"].is_array());
}

#[tokio::test]
async fn duplicate_slug_is_409() {
    let app = app();
    create(&app, "site", "portfolio").await;

    let res = send(
        &app,
        json_request(
            "POST",
            "/projects",
            json!({"title": "Other", "description": "x", "slug": "site"}),
        ),
    )
    .await;
    assert_eq!(res.status().as_u16(), 409);
    assert_eq!(json_body(res).await["className"], "conflict");
}

#[tokio::test]
async fn listing_filters_by_category() {
    let app = app();
    create(&app, "a", "portfolio").await;
    create(&app, "b", "archive").await;
    create(&app, "c", "portfolio").await;

    let all = json_body(send(&app, get("/projects")).await).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let portfolio = json_body(send(&app, get("/projects?category=portfolio")).await).await;
    let slugs: Vec<&str> = portfolio
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["c", "a"]);

    let res = send(&app, get("/projects?category=blog")).await;
    assert_eq!(res.status().as_u16(), 400);

    let slugs = json_body(send(&app, get("/slugs")).await).await;
    assert_eq!(slugs, json!(["a", "b", "c"]));
}

#[tokio::test]
async fn missing_project_is_404_and_bad_id_is_400() {
    let app = app();

    let res = send(&app, get("/projects/41")).await;
    assert_eq!(res.status().as_u16(), 404);
    let body = json_body(res).await;
    assert_eq!(body["name"], "NotFound");
    assert_eq!(body["className"], "not-found");

    let res = send(&app, get("/projects/abc")).await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["name"], "BadRequest");

    let res = send(&app, get("/pages/nope")).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn patch_category_and_delete_project() {
    let app = app();
    let id = create(&app, "site", "portfolio").await["id"].as_i64().unwrap();

    let res = send(
        &app,
        json_request("PATCH", &format!("/projects/{id}"), json!({"title": "Renamed"})),
    )
    .await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await["title"], "Renamed");

    let res = send(
        &app,
        json_request("PUT", &format!("/projects/{id}/category"), json!({"category": "useful"})),
    )
    .await;
    assert_eq!(json_body(res).await["category"], "useful");

    let res = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/projects/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 200);

    let res = send(&app, get(&format!("/projects/{id}"))).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn upload_appends_images_with_captions() {
    let app = app();
    let id = create(&app, "site", "portfolio").await["id"].as_i64().unwrap();
    let uri = format!("/projects/{id}/images");

    let res = send(
        &app,
        multipart(
            &uri,
            &[
                ("file", Some("one.png"), "1"),
                ("file", Some("two.png"), "2"),
                ("caption", None, "first"),
            ],
        ),
    )
    .await;
    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["saved"], 2);
    assert_eq!(body["images"][0]["order"], 0);
    assert_eq!(body["images"][0]["caption"], "first");
    assert_eq!(body["images"][1]["order"], 1);
    assert!(body["images"][1]["caption"].is_null());

    let res = send(&app, multipart(&uri, &[("file", Some("three.jpg"), "3")])).await;
    let body = json_body(res).await;
    let orders: Vec<i64> = body["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["order"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert!(body["images"][2]["image_url"]
        .as_str()
        .unwrap()
        .ends_with(".jpg"));

    let page = json_body(send(&app, get("/pages/site")).await).await;
    assert_eq!(page["project"]["id"], id);
    assert_eq!(page["images"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn upload_rejects_missing_project_extra_captions_and_empty_forms() {
    let app = app();
    let res = send(&app, multipart("/projects/9/images", &[("file", Some("a.png"), "a")])).await;
    assert_eq!(res.status().as_u16(), 404);

    let id = create(&app, "site", "portfolio").await["id"].as_i64().unwrap();
    let uri = format!("/projects/{id}/images");

    let res = send(
        &app,
        multipart(
            &uri,
            &[
                ("file", Some("a.png"), "a"),
                ("caption", None, "one"),
                ("caption", None, "two"),
            ],
        ),
    )
    .await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["data"]["index"], 1);

    let res = send(&app, multipart(&uri, &[("caption", None, "lonely")])).await;
    assert_eq!(res.status().as_u16(), 400);

    let images = json_body(send(&app, get(&uri)).await).await;
    assert!(images.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reorder_and_remove_return_the_reloaded_gallery() {
    let state = FolioState::in_memory();
    let app = app_with(state.clone());
    let id = create(&app, "site", "portfolio").await["id"].as_i64().unwrap();
    seed_images(&state, id, &[(10, 0), (11, 1), (12, 2)]).await;

    let res = send(
        &app,
        json_request("PATCH", &format!("/projects/{id}/images/12"), json!({"order": 0})),
    )
    .await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(ids(&json_body(res).await), vec![10, 12, 11]);

    let res = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/projects/{id}/images/10"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let body = json_body(res).await;
    assert_eq!(ids(&body), vec![12, 11]);
    assert_eq!(body[1]["order"], 1);

    let res = send(
        &app,
        json_request("PATCH", &format!("/projects/{id}/images/99"), json!({"order": 3})),
    )
    .await;
    assert_eq!(res.status().as_u16(), 404);
}

struct FailingSecondPut {
    inner: MemoryBlobStore,
    puts: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl BlobStore for FailingSecondPut {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> BlobResult<PutResult> {
        let n = self.puts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if n == 1 {
            return Err(BlobError::rejected(key, 500, "disk full"));
        }
        self.inner.put(bucket, key, content_type, bytes).await
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.inner.public_url(bucket, key)
    }
}

#[tokio::test]
async fn partial_upload_failure_reports_progress() {
    let state = FolioState::new(
        Arc::new(MemoryDataStore::portfolio()),
        Arc::new(FailingSecondPut {
            inner: MemoryBlobStore::default(),
            puts: Default::default(),
        }),
        BlobConfig::default(),
    );
    let app = app_with(state);
    let id = create(&app, "site", "portfolio").await["id"].as_i64().unwrap();
    let uri = format!("/projects/{id}/images");

    let res = send(
        &app,
        multipart(
            &uri,
            &[
                ("file", Some("a.png"), "a"),
                ("file", Some("b.png"), "b"),
                ("file", Some("c.png"), "c"),
            ],
        ),
    )
    .await;
    assert_eq!(res.status().as_u16(), 502);
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadGateway");
    assert_eq!(body["data"], json!({"persisted": 1, "failedAt": 1}));

    let images = json_body(send(&app, get(&uri)).await).await;
    assert_eq!(images.as_array().unwrap().len(), 1);
}

fn capped_app(file_mb: u64, total_mb: u64) -> FolioApp {
    app_with(FolioState::new(
        Arc::new(MemoryDataStore::portfolio()),
        Arc::new(MemoryBlobStore::default()),
        BlobConfig::new()
            .with_max_file_mb(file_mb)
            .with_max_total_mb(total_mb),
    ))
}

#[tokio::test]
async fn file_cap_applies_to_each_file_not_the_batch() {
    let app = capped_app(1, 8);
    let id = create(&app, "site", "portfolio").await["id"].as_i64().unwrap();
    let uri = format!("/projects/{id}/images");
    let under_cap = "x".repeat(600 * 1024);

    let res = send(
        &app,
        multipart(
            &uri,
            &[
                ("file", Some("a.png"), under_cap.as_str()),
                ("file", Some("b.png"), under_cap.as_str()),
            ],
        ),
    )
    .await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await["saved"], 2);

    let over_cap = "x".repeat(1024 * 1024 + 1);
    let res = send(&app, multipart(&uri, &[("file", Some("big.png"), over_cap.as_str())])).await;
    assert_eq!(res.status().as_u16(), 413);
    let body = json_body(res).await;
    assert_eq!(body["name"], "PayloadTooLarge");
    assert_eq!(body["data"]["file"], "big.png");

    let images = json_body(send(&app, get(&uri)).await).await;
    assert_eq!(images.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn request_over_the_total_cap_is_413() {
    let app = capped_app(1, 1);
    let id = create(&app, "site", "portfolio").await["id"].as_i64().unwrap();
    let uri = format!("/projects/{id}/images");
    let under_cap = "x".repeat(600 * 1024);

    let res = send(
        &app,
        multipart(
            &uri,
            &[
                ("file", Some("a.png"), under_cap.as_str()),
                ("file", Some("b.png"), under_cap.as_str()),
            ],
        ),
    )
    .await;
    assert_eq!(res.status().as_u16(), 413);
    assert_eq!(json_body(res).await["code"], 413);

    let images = json_body(send(&app, get(&uri)).await).await;
    assert!(images.as_array().unwrap().is_empty());
}
