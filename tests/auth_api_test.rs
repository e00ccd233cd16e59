mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn register_sets_session_and_hides_password() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/api/register",
            json!({
                "username": "maria",
                "password": "secret123",
                "firstName": "Maria",
                "lastName": "Silva",
                "email": "maria@exemplo.com",
                "phone": "(11) 98765-4321",
            }),
            None,
        )
        .await;

    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.body["username"], "maria");
    assert_eq!(res.body["isAdmin"], false);
    assert!(res.body.get("password").is_none());

    let cookie = res.set_cookie.expect("session cookie");
    assert!(cookie.starts_with(&format!("{}=", app.cookie_name())));

    let me = app.get("/api/user", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], "maria@exemplo.com");
}

#[tokio::test]
async fn register_reports_invalid_fields() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/api/register",
            json!({
                "username": "ab",
                "password": "123",
                "firstName": "Maria",
                "lastName": "Silva",
                "email": "not-an-email",
            }),
            None,
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = res.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"email"));
    assert!(res.set_cookie.is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let app = TestApp::new().await;
    app.register("maria").await;

    let res = app
        .post(
            "/api/register",
            json!({
                "username": "maria",
                "password": "secret123",
                "firstName": "Outra",
                "lastName": "Maria",
                "email": "outra@exemplo.com",
            }),
            None,
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["errors"][0]["field"], "username");
}

#[tokio::test]
async fn login_and_logout() {
    let app = TestApp::new().await;
    app.register("joana").await;

    let wrong = app.login("joana", "wrong-password").await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert!(wrong.set_cookie.is_none());

    let unknown = app.login("ninguem", "secret123").await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body["message"], wrong.body["message"]);

    let ok = app.login("joana", "secret123").await;
    assert_eq!(ok.status, StatusCode::OK);
    let cookie = ok.set_cookie.expect("session cookie");

    let out = app
        .request(axum::http::Method::POST, "/api/logout", None, Some(&cookie))
        .await;
    assert_eq!(out.status, StatusCode::OK);
    assert_eq!(out.body["message"], "Logged out");

    let me = app.get("/api/user", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.body["code"], "not_authenticated");
}

#[tokio::test]
async fn current_user_requires_session() {
    let app = TestApp::new().await;

    let anonymous = app.get("/api/user", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let forged = format!("{}=not-a-session", app.cookie_name());
    let res = app.get("/api/user", Some(&forged)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_lists_customers_and_users() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;
    let customer = app.register("maria").await;
    app.register("joana").await;

    let customers = app.get("/api/admin/customers", Some(&admin)).await;
    assert_eq!(customers.status, StatusCode::OK);
    let list = customers.body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|u| u["isAdmin"] == false));

    let users = app.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(users.body.as_array().unwrap().len(), 3);

    let denied = app.get("/api/admin/customers", Some(&customer)).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
    assert_eq!(denied.body["code"], "not_authorized");
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let app = TestApp::new().await;

    let health = app.get("/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "up");
    assert_eq!(health.body["database"]["status"], "up");

    let doc = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(doc.status, StatusCode::OK);
    assert!(doc.body["paths"]["/api/login"].is_object());
}
