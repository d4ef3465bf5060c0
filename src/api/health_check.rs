use actix_web::{HttpResponse, Responder, get};

#[utoipa::path(
    get,
    path = "/health-check",
    responses(
        (status = 200, description = "Сервис работает", body = String)
    )
)]
#[get("/health-check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("OK")
}
