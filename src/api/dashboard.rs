use actix_web::{HttpResponse, get, web};
use sea_orm::DatabaseConnection;

use crate::auth::CurrentUser;
use crate::model::global_error::AppError;
use crate::service::query;

/// Role-shaped dashboard: personal counters for engineers, site-wide
/// overview for managers, distributions for observers.
#[get("/dashboard")]
pub async fn dashboard(
    db: web::Data<DatabaseConnection>,
    current_user: web::ReqData<CurrentUser>,
) -> Result<HttpResponse, AppError> {
    let stats = query::dashboard(db.get_ref(), &current_user).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[utoipa::path(
    get,
    path = "/api/reports",
    summary = "Сводные отчёты по дефектам",
    responses(
        (status = 200, description = "Разбивки по статусу, важности, приоритету и пользователям", body = crate::model::dashboard::ReportsResponse),
        (status = 403, description = "Доступно только руководителям и наблюдателям"),
    ),
)]
#[get("/reports")]
pub async fn reports(
    db: web::Data<DatabaseConnection>,
    current_user: web::ReqData<CurrentUser>,
) -> Result<HttpResponse, AppError> {
    let report = query::reports(db.get_ref(), &current_user).await?;
    Ok(HttpResponse::Ok().json(report))
}
