// Integration Tests for the HTTP surface

mod common;

#[cfg(test)]
mod tests {
    use super::common::{cart_request, TestStore};
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use checkout_engine::handlers::{self, IDEMPOTENCY_KEY_HEADER};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use std::str::FromStr;
    use std::sync::Arc;

    macro_rules! app {
        ($store:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(Arc::new($store.checkout_service())))
                    .app_data(web::Data::new(Arc::new($store.wallet_service())))
                    .app_data(web::Data::new(Arc::new($store.account_service())))
                    .configure(handlers::configure_routes),
            )
            .await
        };
    }

    fn money(value: &Value) -> Decimal {
        Decimal::from_str(value.as_str().expect("decimal rendered as string")).unwrap()
    }

    #[actix_web::test]
    async fn test_register_login_and_balance() {
        let store = TestStore::new().await;
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/users/register")
            .set_json(json!({
                "email": "Valentina@Vostok.space",
                "password": "seagull6",
                "name": "Valentina",
                "address": "Star City"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["email"], "Valentina@Vostok.space");
        assert_eq!(money(&body["user"]["balance"]), dec!(5000));
        assert!(body["user"].get("passwordHash").is_none());
        let user_id = body["user"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/users/register")
            .set_json(json!({
                "email": "Valentina@Vostok.space",
                "password": "another1",
                "name": "Impostor"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["type"], "email_taken");

        let req = test::TestRequest::post()
            .uri("/api/users/login")
            .set_json(json!({"email": "Valentina@Vostok.space", "password": "wrong-pass"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/users/login")
            .set_json(json!({"email": "valentina@vostok.space", "password": "seagull6"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/users/login")
            .set_json(json!({"email": "Valentina@Vostok.space", "password": "seagull6"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/users/{}/balance", user_id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["id"], user_id.as_str());
        assert_eq!(body["name"], "Valentina");
        assert_eq!(money(&body["balance"]), dec!(5000));
    }

    #[actix_web::test]
    async fn test_register_rejects_short_password() {
        let store = TestStore::new().await;
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/users/register")
            .set_json(json!({"email": "x@vostok.space", "password": "123", "name": "X"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.count("users").await, 0);
    }

    #[actix_web::test]
    async fn test_checkout_insufficient_funds_body() {
        let store = TestStore::new().await;
        let user = store.create_user("poor@cosmic.test", dec!(5000)).await;
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(cart_request(Some(user.id), &[(1, 1), (5, 1)], dec!(7100)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["type"], "insufficient_funds");
        assert_eq!(money(&body["deficit"]), dec!(2100));
        assert_eq!(money(&body["currentBalance"]), dec!(5000));
    }

    #[actix_web::test]
    async fn test_checkout_with_idempotency_header() {
        let store = TestStore::new().await;
        let user = store.create_user("header@cosmic.test", dec!(5000)).await;
        let app = app!(store);

        let send = || {
            test::TestRequest::post()
                .uri("/api/orders")
                .insert_header((IDEMPOTENCY_KEY_HEADER, "a1b2c3"))
                .set_json(cart_request(Some(user.id), &[(1, 1)], dec!(3000)))
                .to_request()
        };

        let resp = test::call_service(&app, send()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let first: Value = test::read_body_json(resp).await;
        assert_eq!(first["success"], true);
        assert_eq!(money(&first["newBalance"]), dec!(2000));
        assert!(first["orderNumber"].as_str().unwrap().starts_with("COSMIC-"));

        let resp = test::call_service(&app, send()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let second: Value = test::read_body_json(resp).await;
        assert_eq!(second["replayed"], true);
        assert_eq!(second["orderId"], first["orderId"]);

        let req = test::TestRequest::get()
            .uri(&format!("/api/orders/{}", first["orderNumber"].as_str().unwrap()))
            .to_request();
        let details: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(details["items"].as_array().unwrap().len(), 1);
        assert_eq!(details["paymentStatus"], "paid");

        let req = test::TestRequest::get()
            .uri(&format!("/api/users/{}/transactions", user.id))
            .to_request();
        let history: Value = test::call_and_read_body_json(&app, req).await;
        let history = history.as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["type"], "purchase");
        assert_eq!(history[0]["orderNumber"], first["orderNumber"]);
        assert_eq!(money(&history[0]["balanceChange"]["from"]), dec!(5000));
        assert_eq!(money(&history[0]["balanceChange"]["to"]), dec!(2000));

        let req = test::TestRequest::get()
            .uri(&format!("/api/users/{}/reconciliation", user.id))
            .to_request();
        let report: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report["consistent"], true);
        assert_eq!(report["entries"], 1);
    }

    #[actix_web::test]
    async fn test_validation_errors_are_distinct() {
        let store = TestStore::new().await;
        let app = app!(store);

        let cases = [
            (json!({"items": [], "total": 500}), "invalid_customer"),
            (
                json!({
                    "customer": {"name": "A", "email": "a@b.space", "address": "Moon"},
                    "items": [],
                    "total": 500
                }),
                "empty_cart",
            ),
            (
                json!({
                    "customer": {"name": "A", "email": "a@b.space", "address": "Moon"},
                    "items": [{"id": 1, "name": "Antigravitacin", "price": 2500, "quantity": -1}],
                    "total": 500
                }),
                "invalid_line_item",
            ),
            (
                json!({
                    "customer": {"name": "A", "email": "a@b.space", "address": "Moon"},
                    "items": [{"id": 1, "name": "Antigravitacin", "price": 2500, "quantity": 1}],
                    "total": 0
                }),
                "invalid_total",
            ),
        ];

        for (payload, expected) in cases {
            let req = test::TestRequest::post()
                .uri("/api/orders")
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["type"], expected);
        }

        assert_eq!(store.count("orders").await, 0);
    }

    #[actix_web::test]
    async fn test_malformed_json_uses_error_shape() {
        let store = TestStore::new().await;
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/balance/topup")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"userId\": 42")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["type"], "validation_error");
    }

    #[actix_web::test]
    async fn test_top_up_endpoint() {
        let store = TestStore::new().await;
        let user = store.create_user("topup@cosmic.test", dec!(5000)).await;
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/balance/topup")
            .set_json(json!({"userId": user.id, "amount": 2500}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(money(&body["balance"]["old"]), dec!(5000));
        assert_eq!(money(&body["balance"]["added"]), dec!(2500));
        assert_eq!(money(&body["balance"]["new"]), dec!(7500));

        let req = test::TestRequest::post()
            .uri("/api/balance/topup")
            .set_json(json!({"userId": user.id, "amount": 50}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["type"], "invalid_amount");
    }

    #[actix_web::test]
    async fn test_unknown_user_and_order_are_not_found() {
        let store = TestStore::new().await;
        let app = app!(store);

        let req = test::TestRequest::get()
            .uri(&format!("/api/users/{}/balance", uuid::Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/orders/COSMIC-20260101-MISSING2")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["type"], "order_not_found");
    }

    #[actix_web::test]
    async fn test_catalog_health_and_metrics() {
        let store = TestStore::new().await;
        let app = app!(store);

        let req = test::TestRequest::get().uri("/api/products").to_request();
        let products: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(products.as_array().unwrap().len(), 8);

        let req = test::TestRequest::get().uri("/health").to_request();
        let health: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health["status"], "healthy");

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .set_json(cart_request(None, &[(2, 1)], dec!(3700)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/api/orders?limit=5").to_request();
        let orders: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(orders.as_array().unwrap().len(), 1);

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("checkouts_total"));
    }
}
