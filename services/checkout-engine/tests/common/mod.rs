// Shared fixtures for the integration tests: a migrated, seeded SQLite file
// in a temp directory plus helpers to create users and carts.

#![allow(dead_code)]

use checkout_engine::catalog::default_products;
use checkout_engine::config::{DatabaseConfig, StorefrontSettings};
use checkout_engine::database::users::{self, NewUser};
use checkout_engine::database::Database;
use checkout_engine::models::{CheckoutRequest, CustomerInfo, UserAccount, UserRole};
use checkout_engine::services::{AccountService, CheckoutService, WalletService};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub struct TestStore {
    pub db: Arc<Database>,
    pub settings: StorefrontSettings,
    // Keeps the database file alive for the duration of the test.
    _dir: TempDir,
}

impl TestStore {
    pub async fn new() -> Self {
        Self::with(StorefrontSettings::default(), |_| {}).await
    }

    pub async fn with(
        settings: StorefrontSettings,
        tweak: impl FnOnce(&mut DatabaseConfig),
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DatabaseConfig::for_path(&dir.path().join("store.sqlite"));
        tweak(&mut config);

        let db = Database::new(&config).await.unwrap();
        db.migrate().await.unwrap();
        db.seed_catalog(&default_products()).await.unwrap();

        TestStore {
            db: Arc::new(db),
            settings,
            _dir: dir,
        }
    }

    pub fn checkout_service(&self) -> CheckoutService {
        CheckoutService::new(self.db.clone(), None, self.settings.clone())
    }

    pub fn wallet_service(&self) -> WalletService {
        WalletService::new(self.db.clone(), self.settings.clone())
    }

    pub fn account_service(&self) -> AccountService {
        AccountService::new(self.db.clone(), None, self.settings.clone())
    }

    pub async fn create_user(&self, email: &str, balance: Decimal) -> UserAccount {
        users::insert(
            self.db.pool(),
            &NewUser {
                email,
                password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaA",
                name: "Test Cosmonaut",
                address: Some("Olympus Mons 1"),
                role: UserRole::User,
                opening_balance: balance,
            },
        )
        .await
        .unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }

    pub async fn stored_balance(&self, user_id: Uuid) -> Decimal {
        users::find_by_id(self.db.pool(), user_id)
            .await
            .unwrap()
            .unwrap()
            .balance
    }
}

/// Cart of `(product id, quantity)` pairs priced from the default catalog.
pub fn cart_request(user_id: Option<Uuid>, lines: &[(i64, i64)], total: Decimal) -> CheckoutRequest {
    let catalog = default_products();
    let items: Vec<serde_json::Value> = lines
        .iter()
        .map(|(id, quantity)| {
            let product = catalog
                .iter()
                .find(|p| p.id == *id)
                .expect("product in default catalog");
            json!({
                "id": id,
                "name": product.name,
                "price": product.price,
                "quantity": quantity,
            })
        })
        .collect();

    CheckoutRequest {
        customer: Some(CustomerInfo {
            name: Some("Yuri".to_string()),
            email: Some("yuri@vostok.space".to_string()),
            address: Some("Baikonur, pad 1".to_string()),
            comments: Some("ring twice".to_string()),
        }),
        items: Some(serde_json::Value::Array(items)),
        total: Some(total),
        user_id,
        idempotency_key: None,
    }
}
