use std::{sync::Arc, time::Duration};

use migration::{Migrator, MigratorTrait};
use quotes::YahooCsvProvider;
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "paperfolio={level},server={level},engine={level},quotes={level}",
            level = settings.app.level
        ))
        .init();

    let server = settings.server;
    let db = parse_database(&server.database).await?;
    tracing::info!("quote feed at {}", server.quotes.base_url);

    let provider: Arc<dyn engine::QuoteProvider> = Arc::new(YahooCsvProvider::new(
        &server.quotes.base_url,
        Duration::from_secs(server.quotes.timeout_secs),
    )?);

    let engine = engine::Engine::builder()
        .database(db)
        .quotes(provider.clone())
        .build()?;

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(engine, provider, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
