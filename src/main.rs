//! Storefront - catalog, cart and address book service

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::{config::Config, http, publisher::EventPublisher, store::PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await
        .context("connecting to the database")?;
    sqlx::migrate!("./migrations").run(&db).await.context("running migrations")?;

    let events = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => EventPublisher::nats(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, domain events disabled");
                EventPublisher::disabled()
            }
        },
        None => EventPublisher::disabled(),
    };

    let app = http::router(http::AppState::new(Arc::new(PgStore::new(db)), events));

    let addr = config.listen_addr();
    tracing::info!("storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
