#![allow(dead_code)]

use std::sync::Arc;

use atelier_api::{
    auth::InMemorySessionStore,
    config::AppConfig,
    db::{self, DbConfig},
    dto::NewUser,
    AppState,
};
use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Parsed response: status, body as JSON (or `Null`) and the session cookie if one was set.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub set_cookie: Option<String>,
}

/// In-process application over an in-memory SQLite database and a throwaway
/// upload directory.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let upload_dir = tempfile::tempdir().expect("create upload dir");

        let mut cfg = AppConfig::new("sqlite::memory:", "test");
        cfg.upload_dir = upload_dir.path().to_string_lossy().into_owned();
        cfg.public_base_url = Some("http://localhost:5000".to_string());
        customize(&mut cfg);

        let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .expect("connect to in-memory sqlite");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg, Arc::new(InMemorySessionStore::new()));
        let router = atelier_api::app(state.clone());

        Self {
            router,
            state,
            upload_dir,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.state.config.session_cookie_name
    }

    pub async fn raw_request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        into_test_response(self.raw_request(request).await).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, None, cookie).await
    }

    pub async fn post(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, Some(body), cookie).await
    }

    pub async fn put(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::PUT, uri, Some(body), cookie).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, None, cookie).await
    }

    /// Registers a customer and returns the `name=value` cookie for its session.
    pub async fn register(&self, username: &str) -> String {
        let res = self
            .post(
                "/api/register",
                json!({
                    "username": username,
                    "password": "secret123",
                    "firstName": "Maria",
                    "lastName": "Silva",
                    "email": format!("{}@exemplo.com", username),
                }),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "register failed: {}", res.body);
        res.set_cookie.expect("register sets a session cookie")
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post(
            "/api/login",
            json!({ "username": username, "password": password }),
            None,
        )
        .await
    }

    /// Creates the admin account on first use and logs it in.
    pub async fn admin_cookie(&self) -> String {
        let users = &self.state.services.users;
        if users
            .get_user_by_username(ADMIN_USERNAME)
            .await
            .expect("lookup admin")
            .is_none()
        {
            self.state
                .services
                .auth
                .create_admin(NewUser {
                    username: ADMIN_USERNAME.into(),
                    password: ADMIN_PASSWORD.into(),
                    first_name: "Admin".into(),
                    last_name: "User".into(),
                    email: "admin@ateliedarosa.com".into(),
                    phone: None,
                })
                .await
                .expect("create admin");
        }
        let res = self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
        assert_eq!(res.status, StatusCode::OK, "admin login failed: {}", res.body);
        res.set_cookie.expect("login sets a session cookie")
    }

    /// Admin-creates a category and returns its id.
    pub async fn create_category(&self, admin: &str, name: &str) -> i64 {
        let res = self
            .post(
                "/api/admin/categories",
                json!({ "name": name, "description": "Feito à mão" }),
                Some(admin),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "category: {}", res.body);
        res.body["id"].as_i64().expect("category id")
    }

    /// Admin-creates a product and returns its id.
    pub async fn create_product(&self, admin: &str, category_id: i64, name: &str, price: Value) -> i64 {
        let res = self
            .post(
                "/api/admin/products",
                json!({
                    "name": name,
                    "description": "Peça exclusiva feita à mão",
                    "price": price,
                    "imageUrl": "http://localhost:5000/uploads/x.jpg",
                    "categoryId": category_id,
                    "inStock": true,
                }),
                Some(admin),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "product: {}", res.body);
        res.body["id"].as_i64().expect("product id")
    }

    pub fn uploaded_files(&self) -> Vec<String> {
        std::fs::read_dir(self.upload_dir.path())
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub async fn into_test_response(response: Response) -> TestResponse {
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse {
        status,
        body,
        set_cookie,
    }
}

/// `multipart/form-data` body holding one file part.
pub fn multipart_body(
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> (String, Vec<u8>) {
    let boundary = "----atelier-test-boundary";
    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}
