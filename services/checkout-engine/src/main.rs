use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use checkout_engine::{
    catalog,
    config::Config,
    database::Database,
    handlers,
    notifications::NotificationPublisher,
    services::{AccountService, CheckoutService, WalletService},
};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().map_err(anyhow::Error::msg)?;

    init_tracing(&config);

    info!("Starting Checkout Engine on port {}", config.server.port);

    let settings = config
        .storefront
        .settings()
        .map_err(anyhow::Error::msg)?;

    let db = Arc::new(
        Database::new(&config.database)
            .await
            .context("Failed to connect to database")?,
    );
    db.migrate().await.context("Failed to run migrations")?;

    if config.storefront.seed_catalog {
        db.seed_catalog(&catalog::default_products())
            .await
            .context("Failed to seed catalog")?;
    }

    let notifier = if config.nats.enabled {
        match NotificationPublisher::connect(&config.nats.url, &config.nats.topic_prefix).await {
            Ok(publisher) => Some(Arc::new(publisher)),
            Err(e) => {
                warn!("Notifications disabled, NATS unavailable: {}", e);
                None
            }
        }
    } else {
        info!("Notifications disabled by configuration");
        None
    };

    let checkout_service = Arc::new(CheckoutService::new(
        db.clone(),
        notifier.clone(),
        settings.clone(),
    ));
    let wallet_service = Arc::new(WalletService::new(db.clone(), settings.clone()));
    let account_service = Arc::new(AccountService::new(db.clone(), notifier, settings));

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .app_data(web::Data::new(checkout_service.clone()))
            .app_data(web::Data::new(wallet_service.clone()))
            .app_data(web::Data::new(account_service.clone()))
            .configure(handlers::configure_routes)
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    db.close().await;
    info!("Checkout Engine stopped");

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
