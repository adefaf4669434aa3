use crate::errors::CheckoutEngineError;
use crate::metrics;
use crate::models::{CheckoutRequest, LoginRequest, RegisterRequest, TopUpRequest};
use crate::services::{AccountService, CheckoutService, WalletService};
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "checkout-engine",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Place an order. The `Idempotency-Key` header takes precedence over an
/// `idempotencyKey` field in the body.
pub async fn create_order(
    service: web::Data<Arc<CheckoutService>>,
    http_request: HttpRequest,
    request: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, CheckoutEngineError> {
    let mut request = request.into_inner();

    if let Some(header) = http_request.headers().get(IDEMPOTENCY_KEY_HEADER) {
        let key = header.to_str().map_err(|_| {
            CheckoutEngineError::Validation("Idempotency-Key header is not valid ASCII".to_string())
        })?;
        request.idempotency_key = Some(key.to_string());
    }

    let confirmation = service.checkout(request).await?;

    if confirmation.replayed {
        Ok(HttpResponse::Ok().json(confirmation))
    } else {
        Ok(HttpResponse::Created().json(confirmation))
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct LimitQuery {
    limit: Option<u32>,
}

pub async fn list_orders(
    service: web::Data<Arc<CheckoutService>>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, CheckoutEngineError> {
    let orders = service.list_orders(query.limit).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn get_order(
    service: web::Data<Arc<CheckoutService>>,
    order_number: web::Path<String>,
) -> Result<HttpResponse, CheckoutEngineError> {
    let details = service.get_order(&order_number).await?;
    Ok(HttpResponse::Ok().json(details))
}

pub async fn list_user_orders(
    service: web::Data<Arc<CheckoutService>>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, CheckoutEngineError> {
    let orders = service.orders_for_user(*user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn list_products(
    service: web::Data<Arc<CheckoutService>>,
) -> Result<HttpResponse, CheckoutEngineError> {
    let products = service.list_products().await?;
    Ok(HttpResponse::Ok().json(products))
}

pub async fn register(
    service: web::Data<Arc<AccountService>>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, CheckoutEngineError> {
    let profile = service.register(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "user": profile
    })))
}

pub async fn login(
    service: web::Data<Arc<AccountService>>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, CheckoutEngineError> {
    let profile = service.login(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": profile
    })))
}

pub async fn get_balance(
    service: web::Data<Arc<WalletService>>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, CheckoutEngineError> {
    let balance = service.balance(*user_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

pub async fn get_transactions(
    service: web::Data<Arc<WalletService>>,
    user_id: web::Path<Uuid>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse, CheckoutEngineError> {
    let history = service.history(*user_id, query.limit).await?;
    Ok(HttpResponse::Ok().json(history))
}

pub async fn get_reconciliation(
    service: web::Data<Arc<WalletService>>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, CheckoutEngineError> {
    let report = service.reconcile(*user_id).await?;
    Ok(HttpResponse::Ok().json(report))
}

pub async fn top_up(
    service: web::Data<Arc<WalletService>>,
    request: web::Json<TopUpRequest>,
) -> Result<HttpResponse, CheckoutEngineError> {
    let receipt = service.top_up(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

/// Prometheus metrics endpoint
pub async fn metrics_endpoint() -> HttpResponse {
    match metrics::metrics_handler() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Failed to gather metrics",
            "details": e.to_string()
        })),
    }
}

/// Malformed JSON bodies get the same error shape as every other failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        CheckoutEngineError::Validation(err.to_string()).into()
    })
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::scope("/api")
                .route("/orders", web::post().to(create_order))
                .route("/orders", web::get().to(list_orders))
                .route("/orders/{order_number}", web::get().to(get_order))
                .route("/products", web::get().to(list_products))
                .route("/users/register", web::post().to(register))
                .route("/users/login", web::post().to(login))
                .route("/users/{id}/balance", web::get().to(get_balance))
                .route("/users/{id}/orders", web::get().to(list_user_orders))
                .route("/users/{id}/transactions", web::get().to(get_transactions))
                .route("/users/{id}/reconciliation", web::get().to(get_reconciliation))
                .route("/balance/topup", web::post().to(top_up)),
        )
        .route("/metrics", web::get().to(metrics_endpoint))
        .route("/health", web::get().to(health_check));
}
