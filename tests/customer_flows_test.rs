mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn service_request_lifecycle() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;
    let maria = app.register("maria").await;
    let joana = app.register("joana").await;

    let anonymous = app
        .post(
            "/api/service-requests",
            json!({ "serviceType": "Ajuste", "description": "Ajustar a barra do vestido" }),
            None,
        )
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let created = app
        .post(
            "/api/service-requests",
            json!({ "serviceType": "Ajuste de vestido", "description": "Ajustar a barra do vestido de festa" }),
            Some(&maria),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["status"], "pending");
    let id = created.body["id"].as_i64().unwrap();

    let too_short = app
        .post(
            "/api/service-requests",
            json!({ "serviceType": "Aj", "description": "curta" }),
            Some(&maria),
        )
        .await;
    assert_eq!(too_short.status, StatusCode::BAD_REQUEST);

    let own = app.get("/api/service-requests", Some(&maria)).await;
    assert_eq!(own.body.as_array().unwrap().len(), 1);
    let other = app.get("/api/service-requests", Some(&joana)).await;
    assert_eq!(other.body.as_array().unwrap().len(), 0);

    let admin_view = app.get("/api/service-requests", Some(&admin)).await;
    let all = admin_view.body.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["user"]["username"], "maria");

    let bad_status = app
        .put(
            &format!("/api/admin/service-requests/{}/status", id),
            json!({ "status": "shipped" }),
            Some(&admin),
        )
        .await;
    assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_status.body["errors"][0]["field"], "status");

    let updated = app
        .put(
            &format!("/api/admin/service-requests/{}/status", id),
            json!({ "status": "in_progress" }),
            Some(&admin),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.body["status"], "in_progress");

    let by_customer = app
        .put(
            &format!("/api/admin/service-requests/{}/status", id),
            json!({ "status": "completed" }),
            Some(&maria),
        )
        .await;
    assert_eq!(by_customer.status, StatusCode::UNAUTHORIZED);

    let missing = app
        .put(
            "/api/admin/service-requests/999/status",
            json!({ "status": "completed" }),
            Some(&admin),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_message_is_stored_unread() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/api/messages",
            json!({
                "name": "Ana",
                "email": "ana@x.com",
                "subject": "Orçamento",
                "message": "Gostaria de saber o preço",
            }),
            None,
        )
        .await;

    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.body["read"], false);
    assert_eq!(res.body["name"], "Ana");
    let id = res.body["id"].as_i64().unwrap();

    let admin = app.admin_cookie().await;
    let unread = app.get("/api/admin/messages?unread=true", Some(&admin)).await;
    assert_eq!(unread.body.as_array().unwrap().len(), 1);

    let marked = app
        .request(
            axum::http::Method::PUT,
            &format!("/api/admin/messages/{}/read", id),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(marked.status, StatusCode::OK);
    assert_eq!(marked.body["read"], true);

    let unread = app.get("/api/admin/messages?unread=true", Some(&admin)).await;
    assert_eq!(unread.body.as_array().unwrap().len(), 0);
    let all = app.get("/api/admin/messages", Some(&admin)).await;
    assert_eq!(all.body.as_array().unwrap().len(), 1);

    let one = app
        .get(&format!("/api/admin/messages/{}", id), Some(&admin))
        .await;
    assert_eq!(one.body["subject"], "Orçamento");
}

#[tokio::test]
async fn invalid_contact_message_is_rejected() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/api/messages",
            json!({ "name": "A", "email": "ana", "subject": "Oi", "message": "curta" }),
            None,
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["errors"].as_array().unwrap().len(), 4);

    let admin = app.admin_cookie().await;
    let all = app.get("/api/admin/messages", Some(&admin)).await;
    assert!(all.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn testimonials_need_approval_before_listing() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;
    let maria = app.register("maria").await;

    let anonymous = app
        .post(
            "/api/testimonials",
            json!({ "text": "Trabalho lindo e caprichado", "rating": 5 }),
            None,
        )
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let bad_rating = app
        .post(
            "/api/testimonials",
            json!({ "text": "Trabalho lindo e caprichado", "rating": 6 }),
            Some(&maria),
        )
        .await;
    assert_eq!(bad_rating.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_rating.body["errors"][0]["field"], "rating");

    let created = app
        .post(
            "/api/testimonials",
            json!({ "text": "Trabalho lindo e caprichado", "rating": 5 }),
            Some(&maria),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["approved"], false);
    let id = created.body["id"].as_i64().unwrap();

    let public = app.get("/api/testimonials", None).await;
    assert!(public.body.as_array().unwrap().is_empty());

    let pending = app.get("/api/admin/testimonials", Some(&admin)).await;
    assert_eq!(pending.body.as_array().unwrap().len(), 1);

    let approved = app
        .request(
            axum::http::Method::PUT,
            &format!("/api/admin/testimonials/{}/approve", id),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(approved.status, StatusCode::OK);
    assert_eq!(approved.body["approved"], true);

    let public = app.get("/api/testimonials", None).await;
    let list = public.body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["user"]["firstName"], "Maria");
    assert!(list[0]["user"].get("password").is_none());
}

#[tokio::test]
async fn order_total_is_computed_from_catalog_prices() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;
    let category = app.create_category(&admin, "Acessórios").await;
    let bolsa = app
        .create_product(&admin, category, "Bolsa Bordada", json!("159,90"))
        .await;
    let necessaire = app
        .create_product(&admin, category, "Nécessaire Floral", json!("79,90"))
        .await;
    let maria = app.register("maria").await;

    let placed = app
        .post(
            "/api/orders",
            json!({ "items": [
                { "productId": bolsa, "quantity": 2 },
                { "productId": necessaire, "quantity": 1 },
            ]}),
            Some(&maria),
        )
        .await;

    assert_eq!(placed.status, StatusCode::CREATED, "{}", placed.body);
    assert_eq!(placed.body["total"], "399.70");
    assert_eq!(placed.body["status"], "pending");
    assert_eq!(placed.body["items"].as_array().unwrap().len(), 2);
    assert_eq!(placed.body["items"][0]["price"], "159.90");
    let order_id = placed.body["id"].as_i64().unwrap();

    let own = app.get("/api/orders", Some(&maria)).await;
    assert_eq!(own.body.as_array().unwrap().len(), 1);

    let all = app.get("/api/admin/orders", Some(&admin)).await;
    assert_eq!(all.body[0]["user"]["username"], "maria");

    let shipped = app
        .put(
            &format!("/api/admin/orders/{}/status", order_id),
            json!({ "status": "shipped" }),
            Some(&admin),
        )
        .await;
    assert_eq!(shipped.status, StatusCode::OK);
    assert_eq!(shipped.body["status"], "shipped");

    let detail = app
        .get(&format!("/api/admin/orders/{}", order_id), Some(&admin))
        .await;
    assert_eq!(detail.body["status"], "shipped");
    assert_eq!(detail.body["items"][1]["product"]["name"], "Nécessaire Floral");

    let in_use = app
        .delete(&format!("/api/admin/products/{}", bolsa), Some(&admin))
        .await;
    assert_eq!(in_use.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn order_lines_are_checked() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;
    let category = app.create_category(&admin, "Roupas").await;
    let product = app
        .create_product(&admin, category, "Saia Midi", json!("199,90"))
        .await;
    app.put(
        &format!("/api/admin/products/{}", product),
        json!({ "inStock": false }),
        Some(&admin),
    )
    .await;
    let maria = app.register("maria").await;

    let empty = app.post("/api/orders", json!({ "items": [] }), Some(&maria)).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.body["errors"][0]["field"], "items");

    let res = app
        .post(
            "/api/orders",
            json!({ "items": [
                { "productId": product, "quantity": 1 },
                { "productId": 999, "quantity": 1 },
            ]}),
            Some(&maria),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = res.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["items[0].productId", "items[1].productId"]);

    let own = app.get("/api/orders", Some(&maria)).await;
    assert!(own.body.as_array().unwrap().is_empty());
}

fn updated_at(body: &serde_json::Value) -> chrono::DateTime<chrono::FixedOffset> {
    chrono::DateTime::parse_from_rfc3339(body["updatedAt"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn status_changes_move_updated_at_forward() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;
    let category = app.create_category(&admin, "Acessórios").await;
    let bolsa = app
        .create_product(&admin, category, "Bolsa Bordada", json!("159,90"))
        .await;
    let maria = app.register("maria").await;

    let request = app
        .post(
            "/api/service-requests",
            json!({ "serviceType": "Ajuste de vestido", "description": "Ajustar a barra do vestido de festa" }),
            Some(&maria),
        )
        .await;
    let order = app
        .post(
            "/api/orders",
            json!({ "items": [{ "productId": bolsa, "quantity": 1 }] }),
            Some(&maria),
        )
        .await;
    assert_eq!(order.status, StatusCode::CREATED, "{}", order.body);

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let changed = app
        .put(
            &format!("/api/admin/service-requests/{}/status", request.body["id"]),
            json!({ "status": "completed" }),
            Some(&admin),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);
    assert!(updated_at(&changed.body) > updated_at(&request.body));

    let shipped = app
        .put(
            &format!("/api/admin/orders/{}/status", order.body["id"]),
            json!({ "status": "shipped" }),
            Some(&admin),
        )
        .await;
    assert_eq!(shipped.status, StatusCode::OK);
    assert!(updated_at(&shipped.body) > updated_at(&order.body));
}

#[tokio::test]
async fn missing_status_is_a_field_error() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;

    let res = app
        .put("/api/admin/service-requests/1/status", json!({}), Some(&admin))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["errors"][0]["field"], "status");
    assert_eq!(res.body["errors"][0]["message"], "Status is required");

    let res = app
        .put("/api/admin/orders/1/status", json!({}), Some(&admin))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["errors"][0]["field"], "status");
    assert_eq!(res.body["errors"][0]["message"], "Status is required");
}

#[tokio::test]
async fn admin_updates_of_missing_records_are_not_found() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;

    let read = app
        .request(
            axum::http::Method::PUT,
            "/api/admin/messages/999/read",
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(read.status, StatusCode::NOT_FOUND);

    let approve = app
        .request(
            axum::http::Method::PUT,
            "/api/admin/testimonials/999/approve",
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(approve.status, StatusCode::NOT_FOUND);

    let order = app
        .put(
            "/api/admin/orders/999/status",
            json!({ "status": "shipped" }),
            Some(&admin),
        )
        .await;
    assert_eq!(order.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn approving_one_testimonial_leaves_the_others_pending() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;
    let maria = app.register("maria").await;
    let joana = app.register("joana").await;

    let mut ids = Vec::new();
    for (cookie, text) in [
        (&maria, "Trabalho lindo e caprichado"),
        (&joana, "Entrega rápida, peça perfeita"),
        (&maria, "Voltarei a encomendar com certeza"),
    ] {
        let created = app
            .post("/api/testimonials", json!({ "text": text, "rating": 5 }), Some(cookie))
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
        ids.push(created.body["id"].as_i64().unwrap());
    }

    let approved = app
        .request(
            axum::http::Method::PUT,
            &format!("/api/admin/testimonials/{}/approve", ids[1]),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(approved.status, StatusCode::OK);

    let all = app.get("/api/admin/testimonials", Some(&admin)).await;
    let approved_ids: Vec<i64> = all
        .body
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["approved"] == true)
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(approved_ids, vec![ids[1]]);

    let public = app.get("/api/testimonials", None).await;
    let list = public.body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["user"]["username"], "joana");
}

#[tokio::test]
async fn order_total_above_the_money_limit_is_rejected() {
    let app = TestApp::new().await;
    let admin = app.admin_cookie().await;
    let category = app.create_category(&admin, "Noivas").await;
    let vestido = app
        .create_product(&admin, category, "Vestido de Noiva", json!("99999999,99"))
        .await;
    let maria = app.register("maria").await;

    let res = app
        .post(
            "/api/orders",
            json!({ "items": [{ "productId": vestido, "quantity": 2 }] }),
            Some(&maria),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["errors"][0]["field"], "items");

    let own = app.get("/api/orders", Some(&maria)).await;
    assert!(own.body.as_array().unwrap().is_empty());
}
