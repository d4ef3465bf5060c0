use actix_cors::Cors;
use actix_multipart::form::MultipartFormConfig;
use actix_web::http::header;
use actix_web::web::{Data, scope};
use actix_web::{App, HttpServer};
use bcrypt::{DEFAULT_COST, hash};
use chrono::Utc;
use dotenv::dotenv;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing_log::log::info;

use defect_tracker::api;
use defect_tracker::auth::AuthMiddleware;
use defect_tracker::configuration::get_configuration;
use defect_tracker::db::init_db;
use defect_tracker::entity::user::{self, Entity as UserEntity, Role};
use defect_tracker::migration::{Migrator, MigratorTrait};
use defect_tracker::storage::LocalPhotoStorage;
use defect_tracker::telemetry::{get_subscriber, init_subscriber};

const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber(
        "defect_tracker".into(),
        "info,sqlx=debug".into(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    info!("запуск приложения...");

    dotenv().ok();
    let settings = get_configuration()?;

    let db = init_db().await?;
    info!("выполнение миграций базы данных...");
    Migrator::up(&db, None).await?;
    info!("миграции выполнены");

    seed_admin(&db).await?;

    let storage = LocalPhotoStorage::new(&settings.upload_dir);
    storage.ensure_dir().await?;

    let db_data = Data::new(db);
    let storage_data = Data::new(storage);

    info!("сервер запускается: http://{}:{}", settings.host, settings.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(db_data.clone())
            .app_data(storage_data.clone())
            .app_data(MultipartFormConfig::default().total_limit(MAX_UPLOAD_BYTES))
            .service(api::health_check)
            .service(api::register)
            .service(api::login)
            .service(api::refresh_token)
            .service(api::logout)
            .service(
                scope("/api")
                    .wrap(AuthMiddleware)
                    .service(api::get_me)
                    .service(api::dashboard)
                    .service(api::reports)
                    // users route registered ahead of /defects/{id}
                    .service(api::users_for_assignment)
                    .service(api::list_defects)
                    .service(api::create_defect)
                    .service(api::get_defect)
                    .service(api::assign_defect)
                    .service(api::update_status)
                    .service(api::add_comment),
            )
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await?;

    Ok(())
}

/// Creates the default manager account on first start.
async fn seed_admin(db: &DatabaseConnection) -> anyhow::Result<()> {
    let existing = UserEntity::find()
        .filter(user::Column::Username.eq("admin"))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password =
        std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

    let admin = user::ActiveModel {
        username: Set("admin".to_string()),
        email: Set("admin@defecttracker.local".to_string()),
        password_hash: Set(hash(password, DEFAULT_COST)?),
        role: Set(Role::Manager),
        full_name: Set("Администратор системы".to_string()),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };
    admin.insert(db).await?;

    info!("создан администратор по умолчанию: admin");
    Ok(())
}
