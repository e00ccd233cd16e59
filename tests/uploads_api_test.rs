mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};

use common::{into_test_response, multipart_body, TestApp, TestResponse};

const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

async fn upload(
    app: &TestApp,
    cookie: Option<&str>,
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> TestResponse {
    let (multipart_type, body) = multipart_body(field, filename, content_type, data);
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/admin/upload")
        .header(header::CONTENT_TYPE, multipart_type);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder.body(Body::from(body)).expect("build upload request");
    into_test_response(app.raw_request(request).await).await
}

#[tokio::test]
async fn admin_uploads_png_and_it_is_served() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;

    let mut data = PNG_HEADER.to_vec();
    data.extend_from_slice(&[0u8; 1024]);
    let res = upload(&app, Some(&admin), "image", "vestido.png", "image/png", &data).await;

    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let filename = res.body["filename"].as_str().unwrap().to_string();
    assert!(filename.starts_with("product-image-"));
    assert!(filename.ends_with(".png"));
    assert_eq!(res.body["originalname"], "vestido.png");
    assert_eq!(
        res.body["imageUrl"],
        format!("http://localhost:5000/uploads/{}", filename)
    );
    assert_eq!(app.uploaded_files(), vec![filename.clone()]);

    let served = app
        .raw_request(
            Request::builder()
                .uri(format!("/uploads/{}", filename))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(served.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(served.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.len(), data.len());
}

#[tokio::test]
async fn oversized_upload_is_rejected_without_writing() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;

    let data = vec![0u8; 6 * 1024 * 1024];
    let res = upload(&app, Some(&admin), "image", "grande.jpg", "image/jpeg", &data).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["message"].as_str().unwrap().contains("5 MB"), "{}", res.body);
    assert!(app.uploaded_files().is_empty());
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;

    let res = upload(
        &app,
        Some(&admin),
        "image",
        "notas.pdf",
        "application/pdf",
        b"%PDF-1.4",
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid file type"));
    assert!(app.uploaded_files().is_empty());
}

#[tokio::test]
async fn upload_without_image_field() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;

    let res = upload(&app, Some(&admin), "arquivo", "a.png", "image/png", PNG_HEADER).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "No file uploaded");
}

#[tokio::test]
async fn customers_cannot_upload() {
    let app = TestApp::new().await;
    let customer = app.register("maria").await;

    let res = upload(&app, Some(&customer), "image", "a.png", "image/png", PNG_HEADER).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["code"], "not_authorized");

    let res = upload(&app, None, "image", "a.png", "image/png", PNG_HEADER).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["code"], "not_authenticated");
    assert!(app.uploaded_files().is_empty());
}

#[tokio::test]
async fn upload_limit_follows_configuration() {
    let app = TestApp::with_config(|cfg| cfg.upload_max_bytes = 1024 * 1024).await;
    let admin = app.admin_cookie().await;

    let data = vec![0u8; 2 * 1024 * 1024];
    let res = upload(&app, Some(&admin), "image", "a.gif", "image/gif", &data).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["message"].as_str().unwrap().contains("1 MB"));
    assert!(app.uploaded_files().is_empty());
}
