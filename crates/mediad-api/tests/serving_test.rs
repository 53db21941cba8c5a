//! Serving integration tests: full streams, byte ranges, cache policy.

mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use helpers::{fixtures, setup_test_app, test_principal, TestApp, PRINCIPAL_HEADER};

async fn upload_one(app: &TestApp, path: &str, data: Vec<u8>, name: &str, mime: &str) -> serde_json::Value {
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes::Bytes::from(data))
            .file_name(name.to_string())
            .mime_type(mime.to_string()),
    );

    let response = app
        .server
        .post(path)
        .add_header(PRINCIPAL_HEADER, test_principal().to_string())
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn test_image_round_trip_returns_final_processed_bytes() {
    let app = setup_test_app().await;

    let asset = upload_one(
        &app,
        "/media/upload/single",
        fixtures::create_test_png(32, 32),
        "pic.png",
        "image/png",
    )
    .await;

    let name = asset["file_name"].as_str().unwrap();
    let response = app.server.get(&format!("/media/images/{}", name)).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("cache-control").to_str().unwrap(),
        "public, max-age=31536000, immutable"
    );

    let on_disk = std::fs::read(app.storage_root().join("images").join(name)).unwrap();
    assert_eq!(response.as_bytes().as_ref(), on_disk.as_slice());
}

#[tokio::test]
async fn test_thumbnail_is_served_publicly() {
    let app = setup_test_app().await;

    let asset = upload_one(
        &app,
        "/media/upload/single",
        fixtures::create_test_png(32, 32),
        "pic.png",
        "image/png",
    )
    .await;

    let thumb = asset["thumbnail"].as_str().unwrap();
    let response = app.server.get(&format!("/media/thumbnails/{}", thumb)).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("content-type").to_str().unwrap(),
        "image/jpeg"
    );
}

#[tokio::test]
async fn test_video_range_request_round_trip() {
    let app = setup_test_app().await;

    let video = fixtures::create_test_video();
    let total = video.len() as u64;
    let asset = upload_one(&app, "/media/upload/single", video.clone(), "clip.mp4", "video/mp4").await;
    let name = asset["file_name"].as_str().unwrap();

    let response = app
        .server
        .get(&format!("/media/videos/{}", name))
        .add_header("range", "bytes=0-99")
        .await;

    assert_eq!(response.status_code(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.as_bytes().len(), 100);
    assert_eq!(
        response.header("content-range").to_str().unwrap(),
        format!("bytes 0-99/{}", total)
    );
    assert_eq!(response.header("accept-ranges").to_str().unwrap(), "bytes");
    assert_eq!(response.as_bytes().as_ref(), &video[0..100]);
}

#[tokio::test]
async fn test_video_without_range_streams_full_file() {
    let app = setup_test_app().await;

    let video = fixtures::create_test_video();
    let asset = upload_one(&app, "/media/upload/single", video.clone(), "clip.mp4", "video/mp4").await;
    let name = asset["file_name"].as_str().unwrap();

    let response = app.server.get(&format!("/media/videos/{}", name)).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("accept-ranges").to_str().unwrap(), "bytes");
    assert_eq!(response.as_bytes().len(), video.len());
}

#[tokio::test]
async fn test_multi_range_is_ignored_and_served_in_full() {
    let app = setup_test_app().await;

    let video = fixtures::create_test_video();
    let asset = upload_one(&app, "/media/upload/single", video.clone(), "clip.mp4", "video/mp4").await;
    let name = asset["file_name"].as_str().unwrap();

    let response = app
        .server
        .get(&format!("/media/videos/{}", name))
        .add_header("range", "bytes=0-1,5-6")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("accept-ranges").to_str().unwrap(), "bytes");
    assert_eq!(response.as_bytes().len(), video.len());
}

#[tokio::test]
async fn test_unsatisfiable_range_is_416() {
    let app = setup_test_app().await;

    let video = fixtures::create_test_video();
    let total = video.len() as u64;
    let asset = upload_one(&app, "/media/upload/single", video, "clip.mp4", "video/mp4").await;
    let name = asset["file_name"].as_str().unwrap();

    let response = app
        .server
        .get(&format!("/media/videos/{}", name))
        .add_header("range", "bytes=9999999-")
        .await;

    assert_eq!(response.status_code(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(
        response.header("content-range").to_str().unwrap(),
        format!("bytes */{}", total)
    );
}

#[tokio::test]
async fn test_document_serving_requires_principal() {
    let app = setup_test_app().await;

    let asset = upload_one(
        &app,
        "/media/upload/single",
        fixtures::create_test_pdf(),
        "doc.pdf",
        "application/pdf",
    )
    .await;
    let name = asset["file_name"].as_str().unwrap();

    let anonymous = app.server.get(&format!("/media/documents/{}", name)).await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    let authed = app
        .server
        .get(&format!("/media/documents/{}", name))
        .add_header(PRINCIPAL_HEADER, test_principal().to_string())
        .await;
    assert_eq!(authed.status_code(), StatusCode::OK);
    assert_eq!(
        authed.header("content-type").to_str().unwrap(),
        "application/pdf"
    );
    assert_eq!(
        authed.header("cache-control").to_str().unwrap(),
        "private, max-age=0"
    );
}

#[tokio::test]
async fn test_unknown_name_is_not_found() {
    let app = setup_test_app().await;

    let response = app.server.get("/media/images/nope.png").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "not_found");
}
