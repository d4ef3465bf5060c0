use sea_orm::ConnectOptions;
use sea_orm::{Database, DatabaseConnection};
use std::env;
use std::time::Duration;
use tracing::{info, instrument};

#[instrument]
pub async fn init_db() -> anyhow::Result<DatabaseConnection> {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    info!("настройка подключения к базе данных...");

    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(10)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(options).await?;
    info!("подключение к базе данных установлено");

    Ok(db)
}
