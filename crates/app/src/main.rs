use chrono::TimeDelta;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "partage={level},server={level},engine={level},tower_http={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = engine::Engine::builder()
        .database(db)
        .login_code_ttl(TimeDelta::minutes(settings.auth.login_code_ttl_minutes))
        .session_ttl(TimeDelta::hours(settings.auth.session_ttl_hours))
        .build()
        .await?;

    if settings.auth.expose_login_code {
        tracing::warn!("login codes are returned in API responses, do not use in production");
    }

    let config = settings.server_config();
    let listener = tokio::net::TcpListener::bind((config.bind.as_str(), config.port)).await?;
    server::run_with_listener(engine, config, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
    };

    tracing::info!("opening database {url}");
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
